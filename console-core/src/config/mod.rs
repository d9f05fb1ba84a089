use crate::error::AppError;
use secrecy::Secret;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// Base URL of the ERP REST API, e.g. `https://erp.example.com/api`.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Bearer token issued by the backend. Cleared on the first 401.
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            access_token: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// OTLP collector endpoint. Spans are only exported when this is set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load settings from `<dir>/base.yaml` (optional) overlaid with `APP_*` env vars.
///
/// Nested keys use `__`, so `APP_API__BASE_URL` sets `api.base_url`.
pub fn get_configuration(configuration_directory: &Path) -> Result<Settings, AppError> {
    dotenvy::dotenv().ok();

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}
