//! Error types for Memapps

use thiserror::Error;

/// Core error type
///
/// Every variant renders as a single human-readable message; callers surface
/// that string (toast, CLI stderr) and never inspect codes beyond `Superseded`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Network-level failure (connect, timeout, TLS, body read)
    #[error("{0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("{}", server_message(*.status, .detail.as_deref()))]
    Server { status: u16, detail: Option<String> },

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Validation error
    #[error("{0}")]
    Validation(String),

    /// A newer request for the same target replaced this one
    #[error("Request superseded by a newer request")]
    Superseded,
}

/// Result type alias for Core operations
pub type Result<T> = std::result::Result<T, CoreError>;

fn server_message(status: u16, detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.trim().is_empty() => detail.to_string(),
        _ => format!("Request failed with status code {}", status),
    }
}

impl CoreError {
    /// Message for display, falling back when the error carries no text.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    /// True when the request was cancelled by a newer one for the same target.
    pub fn is_superseded(&self) -> bool {
        matches!(self, CoreError::Superseded)
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CoreError::Decode(e.to_string())
        } else {
            CoreError::Transport(e.to_string())
        }
    }
}
