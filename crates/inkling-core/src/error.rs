use thiserror::Error;

#[derive(Error, Debug)]
pub enum InklingError {
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InklingError {
    /// Build a stream error from a non-success HTTP status and its body.
    pub fn status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Stream(format!("completion endpoint returned {}: {}", status, body.into()))
    }
}

pub type Result<T> = std::result::Result<T, InklingError>;
