use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request already in flight: {0}")]
    DuplicateRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl AppError {
    /// The single human-readable message shown to an operator.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => format_validation_errors(errors),
            AppError::Unauthorized(msg) => {
                if msg.is_empty() {
                    "Your session has expired. Please sign in again.".to_string()
                } else {
                    msg.clone()
                }
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Api { message, .. } => message.clone(),
            AppError::Network(err) => err.to_string(),
            AppError::Decode(err) => format!("Unexpected response from server: {}", err),
            AppError::DuplicateRequest(_) => {
                "This request is already being processed".to_string()
            }
            AppError::ConfigError(err) => format!("Configuration error: {}", err),
            AppError::InternalError(err) => err.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }
}

/// Extract the server-provided message from an error or `Success:false` body.
///
/// `Message` wins over `validationErrors`. Keys are matched case-insensitively,
/// and the ASP.NET style `errors` map is treated like `validationErrors`.
pub fn extract_api_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    let lookup = |name: &str| {
        obj.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    };

    if let Some(Value::String(message)) = lookup("message")
        && !message.trim().is_empty()
    {
        return Some(message.trim().to_string());
    }

    for key in ["validationErrors", "errors"] {
        if let Some(errors) = lookup(key) {
            let mut messages = Vec::new();
            collect_messages(errors, &mut messages);
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
    }

    None
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_messages(item, out)),
        Value::Object(map) => {
            // { "$values": [...] } or { "Field": ["msg", ...] }
            for (_, nested) in map {
                collect_messages(nested, out);
            }
        }
        _ => {}
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut parts = Vec::new();
    collect_validation_errors("", errors, &mut parts);

    if parts.is_empty() {
        return errors.to_string();
    }

    parts.sort();
    parts.join("; ")
}

/// Flatten nested and list errors into `items[0].quantity: message` entries.
/// Struct-level (schema) errors carry no field prefix.
fn collect_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if *field == "__all__" {
            prefix.trim_end_matches('.').to_string()
        } else {
            format!("{}{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                let detail = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                if path.is_empty() {
                    out.push(detail);
                } else {
                    out.push(format!("{}: {}", path, detail));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(&format!("{}.", path), nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(&format!("{}[{}].", path, index), nested, out);
                }
            }
        }
    }
}
