//! The meeting picked by a lookup.

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};

/// Everything needed to join the next meeting.
///
/// Built fresh for every lookup and handed to the launch action; it is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDescriptor {
    /// Event title. Empty when the event has no summary.
    pub title: String,
    /// Start time with the offset the provider reported.
    pub start: DateTime<FixedOffset>,
    /// Video conference identifier (e.g. the Zoom meeting number).
    pub conference_id: Option<String>,
    /// Video conference passcode.
    pub passcode: Option<String>,
}

impl MeetingDescriptor {
    /// Creates a descriptor without conference details.
    pub fn new(title: impl Into<String>, start: DateTime<FixedOffset>) -> Self {
        Self {
            title: title.into(),
            start,
            conference_id: None,
            passcode: None,
        }
    }

    /// Builder method to attach conference details.
    pub fn with_conference(
        mut self,
        conference_id: Option<String>,
        passcode: Option<String>,
    ) -> Self {
        self.conference_id = conference_id;
        self.passcode = passcode;
        self
    }

    /// Returns true if the meeting carries a joinable conference id.
    pub fn has_conference(&self) -> bool {
        self.conference_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// One-line human summary, start time rendered in local time.
    pub fn summary_line(&self) -> String {
        let local = self.start.with_timezone(&Local);
        let title = if self.title.is_empty() {
            "(untitled)"
        } else {
            self.title.as_str()
        };
        format!("{} {}", local.format("%H:%M"), title)
    }
}
