//! Raw event data as returned by a calendar backend.
//!
//! Only the fields the next-meeting lookup needs are kept: title, status,
//! start time and conference entry points.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// When a raw event starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific instant, with the offset the provider reported.
    DateTime(DateTime<FixedOffset>),
    /// An all-day event date (no specific time).
    Date(NaiveDate),
}

impl RawEventTime {
    /// Returns true if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// The instant used for window comparisons.
    ///
    /// All-day events start at midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => dt.with_timezone(&Utc),
            Self::Date(date) => date.and_time(chrono::NaiveTime::default()).and_utc(),
        }
    }

    /// The start as an offset-carrying timestamp.
    pub fn to_fixed_offset(&self) -> DateTime<FixedOffset> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::Date(_) => self.to_utc().fixed_offset(),
        }
    }
}

/// An entry point for joining a conference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntryPoint {
    /// The type of entry point (e.g., "video", "phone", "sip", "more").
    pub entry_point_type: String,
    /// The URI for this entry point.
    pub uri: Option<String>,
    /// The meeting code/ID.
    pub meeting_code: Option<String>,
    /// The passcode for the meeting.
    pub passcode: Option<String>,
    /// Alternative password field some conference add-ons fill instead.
    pub password: Option<String>,
}

impl RawEntryPoint {
    /// Creates an entry point of the given type with no details.
    pub fn new(entry_point_type: impl Into<String>) -> Self {
        Self {
            entry_point_type: entry_point_type.into(),
            ..Default::default()
        }
    }

    /// Returns true if this entry point joins over video.
    pub fn is_video(&self) -> bool {
        self.entry_point_type.eq_ignore_ascii_case("video")
    }
}

/// A raw calendar event from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Provider event id.
    pub id: String,
    /// Event title.
    pub summary: Option<String>,
    /// Event status ("confirmed", "tentative", "cancelled").
    pub status: Option<String>,
    /// Start of the event.
    pub start: RawEventTime,
    /// Conference entry points, in provider order.
    pub entry_points: Vec<RawEntryPoint>,
}

impl RawEvent {
    /// Creates an event with the given id and start.
    pub fn new(id: impl Into<String>, start: RawEventTime) -> Self {
        Self {
            id: id.into(),
            summary: None,
            status: None,
            start,
            entry_points: Vec::new(),
        }
    }

    /// Builder method to set the title.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder method to append an entry point.
    pub fn with_entry_point(mut self, entry_point: RawEntryPoint) -> Self {
        self.entry_points.push(entry_point);
        self
    }

    /// Returns true if the event has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}
