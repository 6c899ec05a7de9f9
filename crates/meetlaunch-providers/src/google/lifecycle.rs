//! Token lifecycle: reuse, refresh or re-authorize.
//!
//! ```text
//! Start ─▶ load ─┬─ hit, fresh ────────────────────────────────▶ Done
//!                ├─ hit, expired + refresh token ─▶ refresh ─┬─▶ Done
//!                │                                           ├─ rejected ─▶ authorize
//!                │                                           └─ other ─▶ Err
//!                └─ miss / corrupt / unreadable ─▶ authorize
//!
//! authorize: prompt ─▶ exchange ─┬─▶ save ─▶ Done
//!                                └─▶ ExchangeFailed (nothing written)
//! ```
//!
//! Cache read failures never reach the caller. A refresh the token endpoint
//! rejects sends the operator back through consent; network, rate-limit and
//! server failures are returned as-is since a new grant would not help. A
//! failed save after a successful exchange or refresh is logged and the token
//! is still returned.

use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult, StoreError};

use super::oauth::{TokenExchange, parse_operator_input};
use super::prompt::CodePrompt;
use super::tokens::{CredentialStore, TokenInfo};

/// Hands out a usable token, going through the store, the refresh grant
/// and the operator as needed.
pub struct TokenManager<S, E, P> {
    store: S,
    exchange: E,
    prompt: P,
}

impl<S, E, P> TokenManager<S, E, P>
where
    S: CredentialStore,
    E: TokenExchange,
    P: CodePrompt,
{
    /// Creates a manager from its collaborators.
    pub fn new(store: S, exchange: E, prompt: P) -> Self {
        Self {
            store,
            exchange,
            prompt,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a token the caller can use right away.
    ///
    /// # Errors
    ///
    /// Fails with `ExchangeFailed` when the operator flow cannot produce a
    /// token. Nothing is written to the store in that case. A refresh that
    /// fails for any reason other than `AuthenticationFailed` is returned
    /// without prompting.
    pub async fn obtain_token(&self) -> ProviderResult<TokenInfo> {
        match self.store.load() {
            Ok(token) if !token.is_expired() => {
                debug!(remaining = ?token.time_until_expiry(), "using cached token");
                return Ok(token);
            }
            Ok(token) if token.refresh_token.is_some() => {
                info!("cached token expired, refreshing");
                match self.exchange.refresh(&token).await {
                    Ok(fresh) => {
                        self.persist(&fresh);
                        return Ok(fresh);
                    }
                    Err(e) if e.code() == ProviderErrorCode::AuthenticationFailed => {
                        warn!("token refresh rejected, re-authorizing: {}", e);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(_) => info!("cached token expired and cannot be refreshed"),
            Err(StoreError::NotFound(path)) => debug!("no cached token at {:?}", path),
            Err(e) => warn!("ignoring unusable token cache: {}", e),
        }

        self.authorize().await
    }

    /// Runs the operator flow regardless of what is cached.
    pub async fn force_reauthorize(&self) -> ProviderResult<TokenInfo> {
        self.authorize().await
    }

    async fn authorize(&self) -> ProviderResult<TokenInfo> {
        info!("fetching new Google token");
        let request = self.exchange.begin_authorization();

        let input = self.prompt.prompt_for_code(&request.url)?;
        let code = parse_operator_input(&input, &request.state)?;

        let token = self
            .exchange
            .exchange_code(&code, &request)
            .await
            .map_err(|e| {
                if e.code() == ProviderErrorCode::ExchangeFailed {
                    e
                } else {
                    ProviderError::exchange(format!("unable to retrieve token: {}", e))
                        .with_source(e)
                }
            })?;

        self.persist(&token);
        Ok(token)
    }

    fn persist(&self, token: &TokenInfo) {
        if let Err(e) = self.store.save(token) {
            warn!("token obtained but not cached: {}", e);
        }
    }
}
