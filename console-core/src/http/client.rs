use super::transport::{ApiRequest, Transport};
use crate::config::ApiSettings;
use crate::error::{AppError, extract_api_message};
use crate::observability::trace_headers;
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

/// reqwest-backed [`Transport`] with bearer auth, trace propagation and a
/// fixed per-request timeout. Failed calls are never retried.
pub struct ApiClient {
    client: Client,
    settings: ApiSettings,
    token: RwLock<Option<Secret<String>>>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, AppError> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        let token = RwLock::new(settings.access_token.clone());

        Ok(Self {
            client,
            settings,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    pub async fn set_token(&self, token: String) {
        *self.token.write().await = Some(Secret::new(token));
    }

    /// Forget the session token. Called automatically on any 401.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[tracing::instrument(
        name = "api_request",
        skip(self, request, request_id),
        fields(method = %request.method, path = %request.path, request_id = %request_id)
    )]
    async fn execute(&self, request: ApiRequest, request_id: String) -> Result<Value, AppError> {
        let url = self.url(&request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(trace_headers(&request_id));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.token.read().await.as_ref() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(|e| {
            record_metrics(&request, "error", start);
            tracing::error!(url = %url, error = %e, "Request failed");
            AppError::Network(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        record_metrics(&request, status.as_str(), start);

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if status == StatusCode::UNAUTHORIZED {
            self.clear_token().await;
            tracing::warn!(url = %url, "Session rejected, token cleared");
            return Err(AppError::Unauthorized(
                extract_api_message(&body).unwrap_or_default(),
            ));
        }

        if !status.is_success() {
            let message = extract_api_message(&body)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            tracing::warn!(url = %url, status = status.as_u16(), message = %message, "API error");
            return Err(if status == StatusCode::NOT_FOUND {
                AppError::NotFound(message)
            } else {
                AppError::Api {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        if success_flag(&body) == Some(false) {
            let message = extract_api_message(&body)
                .unwrap_or_else(|| "The server reported a failure".to_string());
            tracing::warn!(url = %url, message = %message, "API reported Success=false");
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(url = %url, status = status.as_u16(), "Request succeeded");
        Ok(body)
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, AppError> {
        let request_id = Uuid::new_v4().to_string();
        self.execute(request, request_id).await
    }
}

fn success_flag(body: &Value) -> Option<bool> {
    body.as_object()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("success"))
        .and_then(|(_, value)| value.as_bool())
}

fn record_metrics(request: &ApiRequest, status: &str, start: Instant) {
    let labels = [
        ("method", request.method.to_string()),
        ("path", request.path.clone()),
        ("status", status.to_string()),
    ];

    counter!("erp_api_requests_total", &labels).increment(1);
    histogram!("erp_api_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}
