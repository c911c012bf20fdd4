use thiserror::Error;

/// Errors raised at the library boundary. Conversion itself never fails.
#[derive(Debug, Error)]
pub enum FlexError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<String> for FlexError {
    fn from(value: String) -> Self {
        FlexError::InvalidOptions(value)
    }
}

impl From<&str> for FlexError {
    fn from(value: &str) -> Self {
        FlexError::InvalidOptions(value.to_string())
    }
}
