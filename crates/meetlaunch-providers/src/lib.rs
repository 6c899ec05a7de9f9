//! Credential lifecycle, calendar access and next-meeting lookup.
//!
//! - [`google`] - token cache, OAuth exchange and the Google Calendar client
//! - [`EventSource`] - the seam between the lookup and a calendar backend
//! - [`next_meeting`] - picks the next meeting inside a search window
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │ TokenStore   │──▶│ TokenManager  │◀──│ CodePrompt  │
//! └──────────────┘   └───────┬───────┘   └─────────────┘
//!                            │ TokenInfo
//!                            ▼
//!                    ┌───────────────┐
//!                    │ ClientFactory │
//!                    └───────┬───────┘
//!                            │ EventSource
//!                            ▼
//!                    ┌───────────────┐
//!                    │ next_meeting  │──▶ MeetingDescriptor
//!                    └───────────────┘
//! ```

pub mod error;
pub mod google;
pub mod lookup;
pub mod provider;
pub mod raw_event;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult, StoreError};
pub use lookup::{describe, extract_conference, next_meeting, select_next_event};
pub use provider::{BoxFuture, EventQuery, EventSource};
pub use raw_event::{RawEntryPoint, RawEvent, RawEventTime};
