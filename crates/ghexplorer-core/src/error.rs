use ghexplorer_api::GitHubError;
use ghexplorer_store::StoreError;
use thiserror::Error;

/// All the ways things can go wrong in the explorer
///
/// None of these are fatal. Views turn them into an inline message or an
/// empty state.
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Rate limit exceeded. Try again later")]
    RateLimitExceeded,

    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<GitHubError> for Error {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::RateLimitExceeded => Error::RateLimitExceeded,
            other => Error::ApiError(other.to_string()),
        }
    }
}
