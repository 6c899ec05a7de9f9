//! Google provider configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::EventQuery;

/// OAuth 2.0 application registration for Google API access.
///
/// Users provide their own client ID and secret, downloaded from the Google
/// Cloud Console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// Where Google sends the operator after consent. The operator copies
    /// the code from there.
    pub redirect_uri: String,
    /// Consent page the operator is sent to.
    pub auth_uri: String,
    /// Endpoint trading codes and refresh tokens for access tokens.
    pub token_uri: String,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports the Cloud Console layout with an `installed` or `web` section and
/// a flat layout with `client_id` / `client_secret` at the root.
#[derive(Debug, Deserialize)]
struct GoogleCredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl OAuthCredentials {
    /// Redirect used when the registration file lists none.
    pub const DEFAULT_REDIRECT_URI: &'static str = "http://localhost";

    /// Google's consent page.
    pub const DEFAULT_AUTH_URI: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";

    /// Google's token endpoint.
    pub const DEFAULT_TOKEN_URI: &'static str = "https://oauth2.googleapis.com/token";

    /// Creates new OAuth credentials with Google's endpoints and the default
    /// redirect URI.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: Self::DEFAULT_REDIRECT_URI.to_string(),
            auth_uri: Self::DEFAULT_AUTH_URI.to_string(),
            token_uri: Self::DEFAULT_TOKEN_URI.to_string(),
        }
    }

    /// Builder method to set the redirect URI.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Builder method to set the token endpoint.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Loads credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read credentials file {}: {}",
                path.display(),
                e
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from a Google credentials JSON string.
    ///
    /// The first entry of `redirect_uris`, if any, becomes the redirect URI.
    /// `auth_uri` and `token_uri` replace Google's endpoints when present.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: GoogleCredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        let (client_id, client_secret, redirect_uris, auth_uri, token_uri) =
            match file.installed.or(file.web) {
                Some(nested) => (
                    nested.client_id,
                    nested.client_secret,
                    nested.redirect_uris,
                    nested.auth_uri,
                    nested.token_uri,
                ),
                None => match (file.client_id, file.client_secret) {
                    (Some(id), Some(secret)) => {
                        (id, secret, file.redirect_uris, file.auth_uri, file.token_uri)
                    }
                    _ => {
                        return Err(ProviderError::configuration(
                            "credentials file must contain an 'installed'/'web' section or 'client_id'/'client_secret' at root level",
                        ));
                    }
                },
            };

        let mut credentials = Self::new(client_id, client_secret);
        if let Some(uri) = redirect_uris.into_iter().find(|u| !u.is_empty()) {
            credentials.redirect_uri = uri;
        }
        if let Some(uri) = auth_uri.filter(|u| !u.is_empty()) {
            credentials.auth_uri = uri;
        }
        if let Some(uri) = token_uri.filter(|u| !u.is_empty()) {
            credentials.token_uri = uri;
        }
        Ok(credentials)
    }

    /// Validates that the credentials look like a Google registration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        if self.redirect_uri.is_empty() {
            return Err("redirect_uri is required");
        }
        if self.auth_uri.is_empty() || self.token_uri.is_empty() {
            return Err("auth_uri and token_uri are required");
        }
        Ok(())
    }
}

/// Configuration for the Google credential lifecycle and calendar client.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth application registration.
    pub credentials: OAuthCredentials,

    /// Path of the cached token record.
    ///
    /// Defaults to `<data dir>/meetlaunch/google-token.json`.
    pub token_path: PathBuf,

    /// Calendar to query. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// OAuth scopes to request.
    ///
    /// Defaults to `["https://www.googleapis.com/auth/calendar.readonly"]`.
    pub scopes: Vec<String>,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// OAuth scope for read-only calendar access.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    /// Creates a new Google configuration with the given credentials.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_path: Self::default_token_path(),
            calendar_id: EventQuery::PRIMARY_CALENDAR.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("meetlaunch/{}", env!("CARGO_PKG_VERSION")),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
        }
    }

    /// Returns the default token cache path.
    pub fn default_token_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetlaunch")
            .join("google-token.json")
    }

    /// Sets the token cache path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the calendar to query.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        self.credentials.validate().map_err(|e| {
            ProviderError::configuration(format!("invalid credentials: {}", e))
        })?;

        if self.scopes.is_empty() {
            return Err(ProviderError::configuration(
                "at least one OAuth scope is required",
            ));
        }

        if self.calendar_id.is_empty() {
            return Err(ProviderError::configuration("calendar id must not be empty"));
        }

        Ok(())
    }
}
