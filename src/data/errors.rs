use thiserror::Error;

/// Error types for upstream data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout error: operation took longer than {timeout_seconds}s")]
    Timeout { timeout_seconds: u64 },

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Judge error: {message}")]
    Judge { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    /// HTTP status associated with the failure, when one is known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DataError::Api { status_code, .. } => Some(*status_code),
            DataError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Error tag carried in a classification's `model` field, e.g.
    /// `error_429` or `error_n/a` when no HTTP status is available.
    pub fn model_tag(&self) -> String {
        match self.status_code() {
            Some(status) => format!("error_{}", status),
            None => "error_n/a".to_string(),
        }
    }

    /// Create a parse error with context
    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        DataError::Parse {
            message: message.into(),
        }
    }

    /// Create an API error with status code
    pub fn api_error<S: Into<String>>(status_code: u16, message: S) -> Self {
        DataError::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Create a judge error for a malformed or out-of-schema verdict
    pub fn judge_error<S: Into<String>>(message: S) -> Self {
        DataError::Judge {
            message: message.into(),
        }
    }
}
