//! Search window for the next-meeting query.
//!
//! A [`TimeWindow`] is lower-bounded at the instant the lookup runs and
//! optionally upper-bounded by a lookahead. Both bounds are inclusive.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The range of start times a meeting may have to be picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (inclusive). `None` means unbounded.
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Default lookahead, in minutes.
    pub const DEFAULT_LOOKAHEAD_MINUTES: i64 = 30;

    /// Creates a bounded window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self {
            start,
            end: Some(end),
        }
    }

    /// Creates a window with no upper bound.
    pub fn unbounded(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// Creates a window starting at `start`, extending `lookahead` into the
    /// future, or unbounded when `lookahead` is `None`.
    ///
    /// A negative lookahead is clamped to zero.
    pub fn lookahead(start: DateTime<Utc>, lookahead: Option<Duration>) -> Self {
        match lookahead {
            Some(d) => Self::new(start, start + d.max(Duration::zero())),
            None => Self::unbounded(start),
        }
    }

    /// The window used when nothing is configured: now .. now + 30 minutes.
    pub fn default_from(now: DateTime<Utc>) -> Self {
        Self::lookahead(
            now,
            Some(Duration::minutes(Self::DEFAULT_LOOKAHEAD_MINUTES)),
        )
    }

    /// Returns true if `t` lies within the window, bounds included.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && self.end.is_none_or(|end| t <= end)
    }

    /// Returns true if the window has no upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.end.is_none()
    }

    /// Length of the window, if bounded.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let window = TimeWindow::default_from(t0());
        assert!(window.contains(t0()));
        assert!(window.contains(t0() + Duration::minutes(30)));
        assert!(!window.contains(t0() + Duration::minutes(30) + Duration::seconds(1)));
        assert!(!window.contains(t0() - Duration::seconds(1)));
    }

    #[test]
    fn unbounded_window_has_no_upper_limit() {
        let window = TimeWindow::lookahead(t0(), None);
        assert!(window.is_unbounded());
        assert!(window.contains(t0() + Duration::days(365)));
        assert!(!window.contains(t0() - Duration::seconds(1)));
        assert_eq!(window.duration(), None);
    }

    #[test]
    fn negative_lookahead_is_clamped() {
        let window = TimeWindow::lookahead(t0(), Some(Duration::minutes(-5)));
        assert_eq!(window.end, Some(t0()));
        assert_eq!(window.duration(), Some(Duration::zero()));
    }

    #[test]
    #[should_panic(expected = "TimeWindow start must be <= end")]
    fn inverted_window_panics() {
        let _ = TimeWindow::new(t0(), t0() - Duration::minutes(1));
    }
}
