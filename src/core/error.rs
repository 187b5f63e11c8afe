#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Malformed client request (missing or non-text prompt)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The upstream generation API failed or returned something unusable
    #[error("Upstream error: {0}")]
    Upstream(String),
    /// Authentication-specific errors
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),
    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    /// Request reached the relay but did not produce a readable stream
    #[error("Transport error: {0}")]
    Transport(String),
    /// Stream-related errors
    #[error("Stream error: {0}")]
    StreamError(String),
    /// Event payload parsing errors
    #[error("Failed to parse payload: {0}")]
    Parse(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IOError(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        // If the error has a status code, map it to a more specific error
        if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => Self::Authentication(format!("Authentication failed: {err}")),
                404 => Self::NotFound(format!("Resource not found: {err}")),
                500..=599 => Self::ServerError(format!("Server error: {err}")),
                _ => Self::Network(err),
            }
        } else {
            Self::Network(err)
        }
    }
}
