//! Google Calendar access with an operator-assisted OAuth flow.
//!
//! # Authentication Flow
//!
//! 1. The cached token is loaded from disk and reused while it is valid
//! 2. An expired token with a refresh token is renewed silently
//! 3. Otherwise the consent URL is printed and the operator pastes back the
//!    authorization code (or the full redirect URL)
//! 4. The code is exchanged for tokens, which are cached for the next run
//!
//! # Example
//!
//! ```ignore
//! use meetlaunch_providers::google::{ClientFactory, GoogleConfig, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("credentials.json")?;
//! let factory = ClientFactory::new(GoogleConfig::new(credentials));
//! let client = factory.connect().await?;
//! let meeting = next_meeting(&client, "primary", &window).await?;
//! ```

mod client;
mod config;
mod lifecycle;
mod oauth;
mod prompt;
mod tokens;

pub use client::{ClientFactory, GoogleCalendarClient, parse_event_list};
pub use config::{GoogleConfig, OAuthCredentials};
pub use lifecycle::TokenManager;
pub use oauth::{AuthorizationRequest, OAuthClient, PkceFlow, TokenExchange, parse_operator_input};
pub use prompt::{CodePrompt, StdinPrompt};
pub use tokens::{CredentialStore, FileTokenStore, MemoryTokenStore, TokenInfo};
