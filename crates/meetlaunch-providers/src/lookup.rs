//! Next-meeting lookup.
//!
//! One bounded query is issued against an [`EventSource`]; the first event
//! starting inside the window becomes a [`MeetingDescriptor`] with the join
//! details of its first video entry point.

use meetlaunch_core::{MeetingDescriptor, TimeWindow};
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{EventQuery, EventSource};
use crate::raw_event::{RawEntryPoint, RawEvent};

/// Events fetched per lookup.
///
/// The provider matches the lower bound against event ends, so all-day
/// entries and meetings in progress come back ahead of the next meeting.
pub const LOOKUP_PAGE_SIZE: usize = 25;

/// Finds the next meeting on `calendar_id` starting inside `window`.
///
/// # Errors
///
/// Returns [`ProviderErrorCode::NoUpcomingMeeting`](crate::ProviderErrorCode::NoUpcomingMeeting)
/// when no event starts inside the window; backend errors are passed through
/// unchanged.
pub async fn next_meeting(
    source: &dyn EventSource,
    calendar_id: &str,
    window: &TimeWindow,
) -> ProviderResult<MeetingDescriptor> {
    let query =
        EventQuery::next_in_window(calendar_id, window).with_max_results(LOOKUP_PAGE_SIZE);
    debug!(
        calendar = %query.calendar_id,
        time_min = %query.time_min,
        time_max = ?query.time_max,
        "querying next event"
    );

    let events = source.list_events(&query).await?;
    let event = select_next_event(&events, window).ok_or_else(|| {
        ProviderError::no_upcoming_meeting(match window.duration() {
            Some(d) => format!("no meeting starts in the next {} minutes", d.num_minutes()),
            None => "no upcoming meeting".to_string(),
        })
    })?;

    let meeting = describe(event);
    info!(
        title = %meeting.title,
        start = %meeting.start,
        has_conference = meeting.has_conference(),
        "found next meeting"
    );
    Ok(meeting)
}

/// Picks the first usable event whose start lies inside `window`.
///
/// Cancelled events are skipped. Events are assumed to be ordered by start
/// time already.
pub fn select_next_event<'a>(events: &'a [RawEvent], window: &TimeWindow) -> Option<&'a RawEvent> {
    events.iter().find(|event| {
        if event.is_cancelled() {
            debug!(id = %event.id, "skipping cancelled event");
            return false;
        }
        let inside = window.contains(event.start.to_utc());
        if !inside {
            debug!(id = %event.id, start = %event.start.to_utc(), "event outside window");
        }
        inside
    })
}

/// Builds the descriptor for a selected event.
pub fn describe(event: &RawEvent) -> MeetingDescriptor {
    let (conference_id, passcode) = extract_conference(&event.entry_points);
    MeetingDescriptor::new(event.summary.clone().unwrap_or_default(), event.start.to_fixed_offset())
        .with_conference(conference_id, passcode)
}

/// Extracts the join code and passcode of the first video entry point.
///
/// Returns `(None, None)` when there is no video entry point. When the entry
/// carries no explicit code, the numeric id and `pwd` parameter of a
/// `/j/<id>` join URI are used instead.
pub fn extract_conference(entry_points: &[RawEntryPoint]) -> (Option<String>, Option<String>) {
    let Some(video) = entry_points.iter().find(|ep| ep.is_video()) else {
        return (None, None);
    };

    let from_uri = video.uri.as_deref().and_then(parse_join_uri);

    let code = non_empty(video.meeting_code.clone())
        .or_else(|| from_uri.as_ref().and_then(|(id, _)| id.clone()));
    let passcode = non_empty(video.passcode.clone())
        .or_else(|| non_empty(video.password.clone()))
        .or_else(|| from_uri.and_then(|(_, pwd)| pwd));

    (code, passcode)
}

/// Splits a `https://host/j/<id>?pwd=<passcode>` join URI.
fn parse_join_uri(uri: &str) -> Option<(Option<String>, Option<String>)> {
    let url = Url::parse(uri).ok()?;

    let mut segments = url.path_segments()?;
    let id = loop {
        match segments.next() {
            Some("j") => break segments.next().filter(|s| !s.is_empty()).map(String::from),
            Some(_) => continue,
            None => break None,
        }
    };

    let pwd = url
        .query_pairs()
        .find(|(k, _)| k == "pwd")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty());

    Some((id, pwd))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderErrorCode;
    use crate::provider::BoxFuture;
    use crate::raw_event::RawEventTime;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Mutex;

    /// Returns canned events and records the queries it saw.
    struct FakeSource {
        events: Vec<RawEvent>,
        queries: Mutex<Vec<EventQuery>>,
    }

    impl FakeSource {
        fn new(events: Vec<RawEvent>) -> Self {
            Self {
                events,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl EventSource for FakeSource {
        fn list_events<'a>(
            &'a self,
            query: &'a EventQuery,
        ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
            self.queries.lock().unwrap().push(query.clone());
            let events = self.events.clone();
            Box::pin(async move { Ok(events) })
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(t0(), t0() + Duration::minutes(30))
    }

    fn event_at(id: &str, start: DateTime<Utc>) -> RawEvent {
        RawEvent::new(id, RawEventTime::DateTime(start.fixed_offset())).with_summary(id)
    }

    #[test]
    fn event_at_lower_bound_is_included() {
        let events = vec![event_at("at-start", t0())];
        assert_eq!(select_next_event(&events, &window()).unwrap().id, "at-start");
    }

    #[test]
    fn event_at_upper_bound_is_included() {
        let events = vec![event_at("at-end", t0() + Duration::minutes(30))];
        assert_eq!(select_next_event(&events, &window()).unwrap().id, "at-end");
    }

    #[test]
    fn event_after_upper_bound_is_excluded() {
        let events = vec![event_at(
            "too-late",
            t0() + Duration::minutes(30) + Duration::seconds(1),
        )];
        assert!(select_next_event(&events, &window()).is_none());
    }

    #[test]
    fn event_started_before_window_is_excluded() {
        let events = vec![
            event_at("ongoing", t0() - Duration::minutes(5)),
            event_at("next", t0() + Duration::minutes(10)),
        ];
        assert_eq!(select_next_event(&events, &window()).unwrap().id, "next");
    }

    #[test]
    fn cancelled_events_are_skipped() {
        let events = vec![
            event_at("cancelled", t0() + Duration::minutes(1)).with_status("cancelled"),
            event_at("confirmed", t0() + Duration::minutes(2)).with_status("confirmed"),
        ];
        assert_eq!(select_next_event(&events, &window()).unwrap().id, "confirmed");
    }

    #[test]
    fn video_entry_point_is_extracted() {
        let mut video = RawEntryPoint::new("video");
        video.meeting_code = Some("123-456".into());
        video.passcode = Some("abc".into());
        let mut phone = RawEntryPoint::new("phone");
        phone.meeting_code = Some("999".into());
        phone.passcode = Some("zzz".into());

        let (code, passcode) = extract_conference(&[phone, video]);
        assert_eq!(code.as_deref(), Some("123-456"));
        assert_eq!(passcode.as_deref(), Some("abc"));
    }

    #[test]
    fn no_video_entry_point_leaves_fields_empty() {
        let mut phone = RawEntryPoint::new("phone");
        phone.meeting_code = Some("999".into());
        assert_eq!(extract_conference(&[phone]), (None, None));
        assert_eq!(extract_conference(&[]), (None, None));
    }

    #[test]
    fn join_uri_fills_missing_fields() {
        let mut video = RawEntryPoint::new("video");
        video.uri = Some("https://us02web.zoom.us/j/86012345678?pwd=s3cr3t".into());
        let (code, passcode) = extract_conference(&[video]);
        assert_eq!(code.as_deref(), Some("86012345678"));
        assert_eq!(passcode.as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn password_field_is_a_passcode_fallback() {
        let mut video = RawEntryPoint::new("video");
        video.meeting_code = Some("123".into());
        video.password = Some("pw".into());
        let (_, passcode) = extract_conference(&[video]);
        assert_eq!(passcode.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn empty_result_is_no_upcoming_meeting() {
        let source = FakeSource::new(Vec::new());
        let err = next_meeting(&source, "primary", &window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NoUpcomingMeeting);
        assert!(err.message().contains("30 minutes"));
    }

    #[tokio::test]
    async fn next_meeting_builds_descriptor() {
        let mut video = RawEntryPoint::new("video");
        video.meeting_code = Some("123-456".into());
        video.passcode = Some("abc".into());
        let event = event_at("standup", t0() + Duration::minutes(5))
            .with_summary("Daily standup")
            .with_entry_point(RawEntryPoint::new("phone"))
            .with_entry_point(video);
        let source = FakeSource::new(vec![event]);

        let meeting = next_meeting(&source, "primary", &window()).await.unwrap();
        assert_eq!(meeting.title, "Daily standup");
        assert_eq!(meeting.start, (t0() + Duration::minutes(5)).fixed_offset());
        assert_eq!(meeting.conference_id.as_deref(), Some("123-456"));
        assert_eq!(meeting.passcode.as_deref(), Some("abc"));

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].max_results, LOOKUP_PAGE_SIZE);
        assert!(queries[0].single_events);
    }

    /// Behaves like `events.list`: returns events overlapping
    /// `[time_min, time_max)`, ordered by start, truncated to `max_results`.
    struct CalendarLike {
        events: Vec<(RawEvent, DateTime<Utc>)>,
    }

    impl EventSource for CalendarLike {
        fn list_events<'a>(
            &'a self,
            query: &'a EventQuery,
        ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
            let mut matching: Vec<&(RawEvent, DateTime<Utc>)> = self
                .events
                .iter()
                .filter(|(event, end)| {
                    *end > query.time_min
                        && query.time_max.is_none_or(|max| event.start.to_utc() < max)
                })
                .collect();
            matching.sort_by_key(|(event, _)| event.start.to_utc());
            let page = matching
                .into_iter()
                .take(query.max_results)
                .map(|(event, _)| event.clone())
                .collect();
            Box::pin(async move { Ok(page) })
        }
    }

    #[tokio::test]
    async fn all_day_event_does_not_hide_next_meeting() {
        let today = t0().date_naive();
        let all_day = RawEvent::new("ooo", RawEventTime::Date(today)).with_summary("Out of office");
        let all_day_end = RawEventTime::Date(today.succ_opt().unwrap()).to_utc();
        let source = CalendarLike {
            events: vec![
                (all_day, all_day_end),
                (
                    event_at("standup", t0() + Duration::minutes(5)),
                    t0() + Duration::minutes(20),
                ),
            ],
        };

        let meeting = next_meeting(&source, "primary", &window()).await.unwrap();
        assert_eq!(meeting.title, "standup");
    }

    #[tokio::test]
    async fn meeting_in_progress_does_not_hide_next_meeting() {
        let source = CalendarLike {
            events: vec![
                (
                    event_at("ongoing", t0() - Duration::minutes(30)),
                    t0() + Duration::minutes(30),
                ),
                (
                    event_at("next", t0() + Duration::minutes(10)),
                    t0() + Duration::minutes(40),
                ),
            ],
        };

        let meeting = next_meeting(&source, "primary", &window()).await.unwrap();
        assert_eq!(meeting.title, "next");
    }

    #[tokio::test]
    async fn only_overlapping_events_is_no_upcoming_meeting() {
        let source = CalendarLike {
            events: vec![(
                event_at("ongoing", t0() - Duration::minutes(30)),
                t0() + Duration::minutes(30),
            )],
        };

        let err = next_meeting(&source, "primary", &window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NoUpcomingMeeting);
    }
}
