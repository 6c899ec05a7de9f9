//! OAuth 2.0 authorization-code flow for Google APIs, operator-assisted.
//!
//! # Flow Overview
//!
//! 1. Generate a PKCE code verifier, its SHA-256 challenge and a random state
//! 2. Build the consent URL with `access_type=offline` so a refresh token is
//!    issued
//! 3. The operator opens the URL, grants access and pastes back either the
//!    code or the whole redirect URL
//! 4. Exchange the code (with verifier) for access and refresh tokens
//!
//! Refreshing an expired access token goes through the same token endpoint
//! with `grant_type=refresh_token`.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;

use super::config::OAuthCredentials;
use super::tokens::TokenInfo;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Talks to the provider's authorization and token endpoints.
///
/// The token manager only depends on this trait, so tests can substitute an
/// exchange that never touches the network.
pub trait TokenExchange: Send + Sync {
    /// Prepares a new consent request.
    fn begin_authorization(&self) -> AuthorizationRequest;

    /// Trades an authorization code for a token set.
    fn exchange_code<'a>(
        &'a self,
        code: &'a str,
        request: &'a AuthorizationRequest,
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>>;

    /// Obtains a fresh access token using the refresh token of `token`.
    fn refresh<'a>(&'a self, token: &'a TokenInfo) -> BoxFuture<'a, ProviderResult<TokenInfo>>;
}

/// A consent request in flight.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// The URL the operator has to open.
    pub url: String,
    /// Random state echoed back in the redirect.
    pub state: String,
    /// PKCE verifier sent along with the code.
    pub verifier: String,
}

/// OAuth client for Google APIs.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(
        credentials: OAuthCredentials,
        scopes: Vec<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::transport(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            credentials,
            scopes,
            http_client,
        })
    }

    async fn post_token_form(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| e.describe())
                .unwrap_or(body);
            let message = format!("{} failed ({}): {}", what, status, detail);
            return Err(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                ProviderError::rate_limited(message)
            } else if status.is_server_error() {
                ProviderError::server(message)
            } else {
                ProviderError::authentication(message)
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
        })
    }
}

impl TokenExchange for OAuthClient {
    fn begin_authorization(&self) -> AuthorizationRequest {
        let pkce = PkceFlow::new();
        let url = pkce.build_auth_url(&self.credentials, &self.scopes);
        debug!("authorization URL: {}", url);
        AuthorizationRequest {
            url,
            state: pkce.state,
            verifier: pkce.verifier,
        }
    }

    fn exchange_code<'a>(
        &'a self,
        code: &'a str,
        request: &'a AuthorizationRequest,
    ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let params = [
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code),
                ("code_verifier", request.verifier.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ];

            let response = self
                .post_token_form(&params, "token exchange")
                .await
                .map_err(|e| ProviderError::exchange(e.message().to_string()).with_source(e))?;

            if response.refresh_token.is_none() {
                warn!("token endpoint issued no refresh token; renewal will need the operator");
            }

            info!("successfully obtained tokens");
            let scopes = response
                .scope
                .as_deref()
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_else(|| self.scopes.clone());

            Ok(TokenInfo::new(
                response.access_token,
                response.refresh_token,
                response.expires_in,
                scopes,
            ))
        })
    }

    fn refresh<'a>(&'a self, token: &'a TokenInfo) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
                ProviderError::authentication("no refresh token - re-authorization required")
            })?;

            let params = [
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ];

            let response = self.post_token_form(&params, "token refresh").await?;

            info!("successfully refreshed access token");
            Ok(token.refreshed(
                response.access_token,
                response.expires_in,
                response.refresh_token,
            ))
        })
    }
}

/// Extracts the authorization code from what the operator pasted.
///
/// Accepts the bare code or the full redirect URL. When a URL carries a
/// `state` it must match `expected_state`; an `error` parameter means the
/// operator denied access.
pub fn parse_operator_input(input: &str, expected_state: &str) -> ProviderResult<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ProviderError::exchange("no authorization code entered"));
    }

    let Ok(url) = Url::parse(input) else {
        return Ok(input.to_string());
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Ok(input.to_string());
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(ProviderError::exchange(format!(
                    "authorization denied: {}",
                    value
                )));
            }
            _ => {}
        }
    }

    if let Some(state) = state
        && state != expected_state
    {
        return Err(ProviderError::exchange(
            "OAuth state mismatch - the pasted URL belongs to another request",
        ));
    }

    code.filter(|c| !c.is_empty())
        .ok_or_else(|| ProviderError::exchange("missing authorization code in pasted URL"))
}

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = Self::generate_verifier();
        let challenge = Self::compute_challenge(&verifier);
        let state = Self::generate_state();

        Self {
            verifier,
            challenge,
            state,
        }
    }

    fn generate_verifier() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..CODE_VERIFIER_LENGTH).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    fn generate_state() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Builds the consent URL for `credentials`, requesting offline access.
    pub fn build_auth_url(&self, credentials: &OAuthCredentials, scopes: &[String]) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            credentials.auth_uri,
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(&credentials.redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Error body from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn describe(&self) -> String {
        match &self.error_description {
            Some(desc) => format!("{} ({})", self.error, desc),
            None => self.error.clone(),
        }
    }
}
