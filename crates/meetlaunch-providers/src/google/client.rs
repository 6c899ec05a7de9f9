//! Google Calendar API client.
//!
//! [`ClientFactory`] turns a usable token into a [`GoogleCalendarClient`],
//! which implements [`EventSource`] with a single `events.list` request.

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, EventQuery, EventSource};
use crate::raw_event::{RawEntryPoint, RawEvent, RawEventTime};

use super::config::GoogleConfig;
use super::lifecycle::TokenManager;
use super::oauth::OAuthClient;
use super::prompt::StdinPrompt;
use super::tokens::{FileTokenStore, TokenInfo};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client bound to one access token.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a client that authenticates every request with `access_token`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(
        access_token: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::transport(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Points the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns the access token this client sends.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    async fn fetch(&self, query: &EventQuery) -> ProviderResult<Vec<RawEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&query.calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&query_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {}", e))
                } else {
                    ProviderError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "access token expired or invalid; run `meetlaunch auth`",
            ));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authentication(format!(
                "access denied to calendar {}",
                query.calendar_id
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!("API error ({}): {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        let events = parse_event_list(&body)?;
        debug!("fetched {} events from calendar {}", events.len(), query.calendar_id);
        Ok(events)
    }
}

impl EventSource for GoogleCalendarClient {
    fn list_events<'a>(
        &'a self,
        query: &'a EventQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(self.fetch(query))
    }
}

/// Builds authenticated calendar clients from a [`GoogleConfig`].
#[derive(Debug, Clone)]
pub struct ClientFactory {
    config: GoogleConfig,
}

impl ClientFactory {
    /// Creates a factory for the given configuration.
    pub fn new(config: GoogleConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Wraps `token` into a ready-to-use client.
    pub fn build_client(&self, token: &TokenInfo) -> ProviderResult<GoogleCalendarClient> {
        GoogleCalendarClient::new(
            token.access_token.clone(),
            self.config.timeout,
            &self.config.user_agent,
        )
    }

    /// The token manager wired to the real store, endpoint and terminal.
    pub fn token_manager(
        &self,
    ) -> ProviderResult<TokenManager<FileTokenStore, OAuthClient, StdinPrompt>> {
        self.config.validate()?;
        let exchange = OAuthClient::new(
            self.config.credentials.clone(),
            self.config.scopes.clone(),
            self.config.timeout,
        )?;
        Ok(TokenManager::new(
            FileTokenStore::new(&self.config.token_path),
            exchange,
            StdinPrompt::new(),
        ))
    }

    /// Obtains a token, prompting the operator if needed, and builds a client.
    pub async fn connect(&self) -> ProviderResult<GoogleCalendarClient> {
        let token = self.token_manager()?.obtain_token().await?;
        self.build_client(&token)
    }
}

fn query_params(query: &EventQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("timeMin", query.time_min.to_rfc3339()),
        ("singleEvents", query.single_events.to_string()),
        ("maxResults", query.max_results.to_string()),
    ];
    if let Some(max) = query.time_max {
        params.push(("timeMax", max.to_rfc3339()));
    }
    if query.order_by_start_time {
        params.push(("orderBy", "startTime".to_string()));
    }
    params
}

/// Parses an `events.list` body into raw events.
///
/// Events without an id or a usable start are skipped with a warning.
pub fn parse_event_list(body: &str) -> ProviderResult<Vec<RawEvent>> {
    let list: EventListResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
    })?;

    Ok(list.items.into_iter().filter_map(convert_event).collect())
}

fn convert_event(event: ApiEvent) -> Option<RawEvent> {
    let Some(id) = event.id else {
        warn!("skipping event without id");
        return None;
    };

    let start = match (event.start.date_time, event.start.date) {
        (Some(dt), _) => {
            let parsed = DateTime::parse_from_rfc3339(&dt)
                .map_err(|e| warn!("event {}: bad start time: {}", id, e))
                .ok()?;
            RawEventTime::DateTime(parsed)
        }
        (None, Some(date)) => {
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| warn!("event {}: bad start date: {}", id, e))
                .ok()?;
            RawEventTime::Date(parsed)
        }
        (None, None) => {
            warn!("event {} has no start time", id);
            return None;
        }
    };

    let entry_points = event
        .conference_data
        .and_then(|cd| cd.entry_points)
        .unwrap_or_default()
        .into_iter()
        .map(|ep| RawEntryPoint {
            entry_point_type: ep.entry_point_type,
            uri: ep.uri,
            meeting_code: ep.meeting_code,
            passcode: ep.passcode,
            password: ep.password,
        })
        .collect();

    Some(RawEvent {
        id,
        summary: event.summary,
        status: event.status,
        start,
        entry_points,
    })
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    status: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    conference_data: Option<ApiConferenceData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiConferenceData {
    entry_points: Option<Vec<ApiEntryPoint>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEntryPoint {
    entry_point_type: String,
    uri: Option<String>,
    meeting_code: Option<String>,
    passcode: Option<String>,
    password: Option<String>,
}
