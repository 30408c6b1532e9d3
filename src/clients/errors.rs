use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Failed to decode search response: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Coarse classification of an [`Error`], for callers that only need to tell
/// failures apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Decode,
    Configuration,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::NetworkError(_) => FailureKind::Network,
            Error::DecodeError(_) => FailureKind::Decode,
            Error::ConfigurationError(_) => FailureKind::Configuration,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
