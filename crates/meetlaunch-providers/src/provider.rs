//! The seam between the lookup logic and a calendar backend.
//!
//! [`EventSource`] is implemented by the Google Calendar client and by
//! in-memory fakes in tests. An [`EventQuery`] carries everything the
//! backend needs to issue a single bounded listing request.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Duration, Utc};
use meetlaunch_core::TimeWindow;

use crate::error::ProviderResult;
use crate::raw_event::RawEvent;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Parameters for one event listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Calendar to list ("primary" for the account's main calendar).
    pub calendar_id: String,
    /// Lower bound sent to the backend.
    pub time_min: DateTime<Utc>,
    /// Upper bound sent to the backend (exclusive on the provider side).
    pub time_max: Option<DateTime<Utc>>,
    /// Maximum number of events to return.
    pub max_results: usize,
    /// Whether recurring events are expanded into single instances.
    pub single_events: bool,
    /// Whether results are ordered by start time.
    pub order_by_start_time: bool,
}

impl EventQuery {
    /// Calendar used when none is configured.
    pub const PRIMARY_CALENDAR: &'static str = "primary";

    /// Builds the query for the earliest event overlapping `window`.
    ///
    /// Only one result is requested; widen it with
    /// [`with_max_results`](Self::with_max_results) when events that began
    /// earlier may come first.
    ///
    /// The provider treats its upper bound as exclusive while the window's
    /// is inclusive, so one second is added to `time_max`.
    pub fn next_in_window(calendar_id: impl Into<String>, window: &TimeWindow) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            time_min: window.start,
            time_max: window.end.map(|end| end + Duration::seconds(1)),
            max_results: 1,
            single_events: true,
            order_by_start_time: true,
        }
    }

    /// Builder method to change the result limit.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max.max(1);
        self
    }
}

/// A backend able to list calendar events.
pub trait EventSource: Send + Sync {
    /// Lists events matching the query, ordered as the query asks.
    fn list_events<'a>(&'a self, query: &'a EventQuery) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>>;
}
