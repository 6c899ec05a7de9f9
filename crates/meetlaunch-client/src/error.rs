//! Client error types.

use meetlaunch_providers::ProviderError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider error (authorization, calendar access, lookup).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Action failed (launch, output).
    #[error("action failed: {0}")]
    Action(String),
}

impl ClientError {
    /// Returns true if the lookup found nothing to join.
    pub fn is_no_meeting(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_no_upcoming_meeting())
    }
}
