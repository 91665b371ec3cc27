#[derive(Debug, thiserror::Error)]
pub enum ImmoError {
    #[error("Invalid investment request: {0}")]
    Validation(String),

    #[error("Empty prompt for stage '{0}', nothing sent")]
    EmptyPrompt(String),

    #[error("Invalid market data: {0}")]
    InvalidMarketData(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ImmoError>;
