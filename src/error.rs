use thiserror::Error;

/// Failures surfaced by the API collaborator.
///
/// Every variant is recoverable: views keep their last good data and the caller may retry.
#[derive(Debug, Error)]
pub enum Error {
    /// The API was unreachable, answered with a non-2xx status, or sent a body we could not
    /// decode.
    #[error("network failure: {0}")]
    Network(String),
    /// The API rejected the submitted fields (HTTP 400).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl Error {
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Network(format!("unexpected response shape: {value}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Network(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
