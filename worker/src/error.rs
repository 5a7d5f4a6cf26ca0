use solitaire_protocol::ErrorResponse;
use thiserror::Error;

/// Failures of the storage collaborator while handling a submission.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage did not answer in time")]
    Timeout,
    #[error("gave up after {attempts} conflicting writes")]
    Conflict { attempts: u32 },
    #[error("stored leaderboard is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to encode leaderboard: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    /// Whether the same request may succeed later. Nothing was written in
    /// either case.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout | Self::Conflict { .. }
        )
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            retryable: self.is_retryable(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
