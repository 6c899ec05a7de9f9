//! Error types for the credential lifecycle and calendar lookup.
//!
//! Two layers exist:
//!
//! - [`StoreError`] describes what went wrong reading or writing the token
//!   cache. Read-side variants never reach the caller of
//!   [`TokenManager::obtain_token`](crate::google::TokenManager::obtain_token);
//!   they select the authorization fallback instead.
//! - [`ProviderError`] is what every public operation returns.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials were rejected by the provider.
    AuthenticationFailed,
    /// The authorization code could not be exchanged for a token.
    ExchangeFailed,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Rate limit exceeded - too many requests.
    RateLimited,
    /// Server returned an error (5xx status codes).
    ServerError,
    /// Invalid response from the server - parse error, unexpected format.
    InvalidResponse,
    /// The HTTP transport could not be constructed.
    TransportError,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
    /// The token cache could not be written.
    CacheWriteFailed,
    /// No event starts inside the search window.
    NoUpcomingMeeting,
    /// Internal error - unexpected state, bug.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::ExchangeFailed => "exchange_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::TransportError => "transport_error",
            Self::ConfigurationError => "configuration_error",
            Self::CacheWriteFailed => "cache_write_failed",
            Self::NoUpcomingMeeting => "no_upcoming_meeting",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error returned by a credential, client or lookup operation.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates a code-exchange error.
    pub fn exchange(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ExchangeFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a transport construction error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TransportError, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates the "nothing scheduled" error.
    pub fn no_upcoming_meeting(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NoUpcomingMeeting, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the lookup simply found nothing to join.
    pub fn is_no_upcoming_meeting(&self) -> bool {
        self.code == ProviderErrorCode::NoUpcomingMeeting
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures of the on-disk token cache.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists at the cache path.
    #[error("no cached token at {}", .0.display())]
    NotFound(PathBuf),

    /// A record exists but is empty or cannot be deserialized.
    #[error("cached token at {} is unusable: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The record exists but could not be read.
    #[error("failed to read cached token at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record could not be written.
    #[error("failed to write cached token to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<StoreError> for ProviderError {
    fn from(err: StoreError) -> Self {
        let code = match err {
            StoreError::Write { .. } => ProviderErrorCode::CacheWriteFailed,
            _ => ProviderErrorCode::ConfigurationError,
        };
        ProviderError::new(code, err.to_string()).with_source(err)
    }
}
