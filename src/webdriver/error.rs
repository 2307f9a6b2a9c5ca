use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("driver returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to parse driver response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to decode screenshot: {0}")]
    Screenshot(#[from] base64::DecodeError),
}
