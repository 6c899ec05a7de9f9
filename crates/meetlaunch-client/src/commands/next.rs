//! The default command: find the next meeting and join it.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use meetlaunch_core::MeetingDescriptor;
use meetlaunch_providers::google::ClientFactory;
use meetlaunch_providers::{EventSource, next_meeting};

use crate::actions;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// What to do with the meeting once found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Print a summary and open the launch URI.
    #[default]
    Launch,
    /// Print a summary and the launch URI.
    PrintOnly,
    /// Print the meeting as JSON.
    Json,
}

/// Outcome of a lookup, as rendered on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A meeting was found.
    Meeting {
        meeting: MeetingDescriptor,
        launch_uri: Option<String>,
    },
    /// The window holds no meeting.
    NoMeeting,
}

#[derive(Serialize)]
struct JsonMeeting<'a> {
    #[serde(flatten)]
    meeting: &'a MeetingDescriptor,
    launch_uri: Option<&'a str>,
}

/// Obtains a token, builds the calendar client and runs the lookup.
pub async fn run(config: &ClientConfig, mode: OutputMode) -> ClientResult<()> {
    let google = config.google.to_provider_config()?;
    let calendar_id = google.calendar_id.clone();
    let client = ClientFactory::new(google).connect().await?;

    let outcome = lookup(&client, &calendar_id, config).await?;
    render(&outcome, config, mode)
}

/// Runs the lookup against `source` and resolves the launch URI.
///
/// An empty window is not an error at this level.
pub async fn lookup(
    source: &dyn EventSource,
    calendar_id: &str,
    config: &ClientConfig,
) -> ClientResult<Outcome> {
    let window = config.lookup.window(Utc::now());
    debug!(?window, calendar_id, "looking up next meeting");

    match next_meeting(source, calendar_id, &window).await {
        Ok(meeting) => {
            let launch_uri = if meeting.has_conference() {
                Some(actions::launch_uri(&meeting, &config.launch)?)
            } else {
                None
            };
            Ok(Outcome::Meeting {
                meeting,
                launch_uri,
            })
        }
        Err(e) => {
            let err = ClientError::from(e);
            if err.is_no_meeting() {
                info!("{}", err);
                Ok(Outcome::NoMeeting)
            } else {
                Err(err)
            }
        }
    }
}

fn render(outcome: &Outcome, config: &ClientConfig, mode: OutputMode) -> ClientResult<()> {
    let (meeting, launch_uri) = match outcome {
        Outcome::NoMeeting => {
            if mode == OutputMode::Json {
                println!("null");
            } else {
                println!("{}", config.lookup.no_meeting_text());
            }
            return Ok(());
        }
        Outcome::Meeting {
            meeting,
            launch_uri,
        } => (meeting, launch_uri.as_deref()),
    };

    match mode {
        OutputMode::Json => {
            let json = serde_json::to_string(&JsonMeeting {
                meeting,
                launch_uri,
            })
            .map_err(|e| ClientError::Action(format!("failed to serialize meeting: {}", e)))?;
            println!("{}", json);
        }
        OutputMode::PrintOnly => {
            println!("{}", meeting.summary_line());
            if let Some(uri) = launch_uri {
                println!("{}", uri);
            }
        }
        OutputMode::Launch => {
            println!("{}", meeting.summary_line());
            actions::launch(meeting, &config.launch)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use meetlaunch_providers::{
        BoxFuture, EventQuery, ProviderError, ProviderResult, RawEntryPoint, RawEvent,
        RawEventTime,
    };

    struct StaticSource(ProviderResult<Vec<RawEvent>>);

    impl EventSource for StaticSource {
        fn list_events<'a>(
            &'a self,
            _query: &'a EventQuery,
        ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
            let result = match &self.0 {
                Ok(events) => Ok(events.clone()),
                Err(e) => Err(ProviderError::new(e.code(), e.message())),
            };
            Box::pin(async move { result })
        }
    }

    fn soon(id: &str) -> RawEvent {
        let start = (Utc::now() + Duration::minutes(5)).fixed_offset();
        RawEvent::new(id, RawEventTime::DateTime(start)).with_summary("Standup")
    }

    #[tokio::test]
    async fn meeting_with_conference_gets_launch_uri() {
        let mut video = RawEntryPoint::new("video");
        video.meeting_code = Some("123456789".into());
        video.passcode = Some("abc".into());
        let source = StaticSource(Ok(vec![soon("e1").with_entry_point(video)]));

        let outcome = lookup(&source, "primary", &ClientConfig::default()).await.unwrap();
        match outcome {
            Outcome::Meeting {
                meeting,
                launch_uri,
            } => {
                assert_eq!(meeting.title, "Standup");
                assert_eq!(
                    launch_uri.as_deref(),
                    Some("zoommtg://zoom.us/join?action=join&confno=123456789&pwd=abc")
                );
            }
            Outcome::NoMeeting => panic!("expected a meeting"),
        }
    }

    #[tokio::test]
    async fn meeting_without_conference_has_no_uri() {
        let source = StaticSource(Ok(vec![soon("e1")]));
        let outcome = lookup(&source, "primary", &ClientConfig::default()).await.unwrap();
        assert!(matches!(outcome, Outcome::Meeting { launch_uri: None, .. }));
    }

    #[tokio::test]
    async fn empty_calendar_is_no_meeting() {
        let source = StaticSource(Ok(vec![]));
        let outcome = lookup(&source, "primary", &ClientConfig::default()).await.unwrap();
        assert_eq!(outcome, Outcome::NoMeeting);
    }

    #[tokio::test]
    async fn provider_failures_propagate() {
        let source = StaticSource(Err(ProviderError::network("connection refused")));
        let err = lookup(&source, "primary", &ClientConfig::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Provider(_)));
        assert!(!err.is_no_meeting());
    }

    #[test]
    fn json_output_flattens_meeting() {
        let meeting = MeetingDescriptor::new(
            "Standup",
            chrono::DateTime::parse_from_rfc3339("2024-03-15T10:00:00+01:00").unwrap(),
        )
        .with_conference(Some("42".into()), None);

        let json = serde_json::to_value(JsonMeeting {
            meeting: &meeting,
            launch_uri: Some("zoommtg://zoom.us/join?action=join&confno=42"),
        })
        .unwrap();
        assert_eq!(json["title"], "Standup");
        assert_eq!(json["conference_id"], "42");
        assert_eq!(json["launch_uri"], "zoommtg://zoom.us/join?action=join&confno=42");
    }
}
