//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/meetlaunch/config.toml` by default. Every key is optional;
//! command-line flags and environment variables override what the file says.
//!
//! ```toml
//! [google]
//! credentials_file = "~/.config/meetlaunch/credentials.json"
//! token_path = "~/.local/share/meetlaunch/google-token.json"
//! calendar_id = "primary"
//! timeout_secs = 30
//!
//! [lookup]
//! lookahead_minutes = 30   # 0 searches without an upper bound
//!
//! [launch]
//! scheme = "zoommtg"
//! host = "zoom.us"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use meetlaunch_core::TimeWindow;
use meetlaunch_providers::google::{GoogleConfig, OAuthCredentials};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for the meetlaunch client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google Calendar settings.
    pub google: GoogleSettings,

    /// Search window settings.
    pub lookup: LookupSettings,

    /// Launch target settings.
    pub launch: LaunchSettings,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetlaunch")
    }
}

/// Google Calendar settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client registration downloaded from the Cloud Console.
    pub credentials_file: Option<PathBuf>,

    /// Where the token record is cached.
    pub token_path: Option<PathBuf>,

    /// Calendar to query.
    pub calendar_id: Option<String>,

    /// Network timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl GoogleSettings {
    /// Returns the credentials file path, falling back to the default.
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_file
            .clone()
            .unwrap_or_else(|| ClientConfig::default_config_dir().join("credentials.json"))
    }

    /// Converts to provider configuration.
    ///
    /// Reads and validates the application registration file.
    pub fn to_provider_config(&self) -> ClientResult<GoogleConfig> {
        let path = self.credentials_path();
        if !path.exists() {
            return Err(ClientError::Config(format!(
                "Google credentials not found at {}.\n  \
                 Download an OAuth client (Desktop app) from the Google Cloud Console\n  \
                 and save it there, or pass --credentials-file <path>.",
                path.display()
            )));
        }

        let credentials = OAuthCredentials::from_file(&path)?;
        Ok(self.apply(GoogleConfig::new(credentials)))
    }

    fn apply(&self, mut config: GoogleConfig) -> GoogleConfig {
        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }
        if let Some(ref id) = self.calendar_id {
            config = config.with_calendar_id(id);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// Search window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    /// How far ahead to look, in minutes. `0` means no upper bound.
    pub lookahead_minutes: u32,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            lookahead_minutes: TimeWindow::DEFAULT_LOOKAHEAD_MINUTES as u32,
        }
    }
}

impl LookupSettings {
    /// The search window for a lookup starting at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        match self.lookahead_minutes {
            0 => TimeWindow::unbounded(now),
            minutes => {
                TimeWindow::lookahead(now, Some(chrono::Duration::minutes(i64::from(minutes))))
            }
        }
    }

    /// Message shown when the window holds no meeting.
    pub fn no_meeting_text(&self) -> String {
        match self.lookahead_minutes {
            0 => "No upcoming meeting.".to_string(),
            minutes => format!("No upcoming meeting in the next {} minutes.", minutes),
        }
    }
}

/// Launch target settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    /// URI scheme handled by the conferencing application.
    pub scheme: String,

    /// Host part of the launch URI.
    pub host: String,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            scheme: "zoommtg".to_string(),
            host: "zoom.us".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CREDENTIALS: &str = r#"{
        "installed": {
            "client_id": "file-id.apps.googleusercontent.com",
            "client_secret": "file-secret",
            "redirect_uris": ["http://localhost"]
        }
    }"#;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.lookup.lookahead_minutes, 30);
        assert_eq!(config.launch.scheme, "zoommtg");
        assert_eq!(config.launch.host, "zoom.us");
        assert!(config.google.calendar_id.is_none());
    }

    #[test]
    fn full_file_parses() {
        let toml_content = r#"
[google]
credentials_file = "/etc/meetlaunch/credentials.json"
token_path = "/var/lib/meetlaunch/token.json"
calendar_id = "team@example.com"
timeout_secs = 10

[lookup]
lookahead_minutes = 0

[launch]
scheme = "zoomus"
host = "example.zoom.us"
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.google.credentials_path(),
            PathBuf::from("/etc/meetlaunch/credentials.json")
        );
        assert_eq!(config.google.timeout_secs, Some(10));
        assert_eq!(config.lookup.lookahead_minutes, 0);
        assert_eq!(config.launch.scheme, "zoomus");
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[lookup]\nlookahead_minutes = \"soon\"\n").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ClientConfig::load_from(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn provider_config_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.json");
        std::fs::write(&creds, CREDENTIALS).unwrap();

        let settings = GoogleSettings {
            credentials_file: Some(creds),
            token_path: Some(dir.path().join("token.json")),
            calendar_id: Some("team@example.com".to_string()),
            timeout_secs: Some(5),
        };
        let config = settings.to_provider_config().unwrap();
        assert_eq!(config.credentials.client_id, "file-id.apps.googleusercontent.com");
        assert_eq!(config.token_path, dir.path().join("token.json"));
        assert_eq!(config.calendar_id, "team@example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn provider_config_without_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GoogleSettings {
            credentials_file: Some(dir.path().join("missing.json")),
            ..Default::default()
        };
        let err = settings.to_provider_config().unwrap_err();
        assert!(err.to_string().contains("credentials not found"));
    }

    #[test]
    fn lookup_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let window = LookupSettings::default().window(now);
        assert_eq!(window.end, Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()));

        let unbounded = LookupSettings {
            lookahead_minutes: 0,
        };
        assert!(unbounded.window(now).is_unbounded());
    }

    #[test]
    fn no_meeting_text() {
        assert_eq!(
            LookupSettings::default().no_meeting_text(),
            "No upcoming meeting in the next 30 minutes."
        );
        assert_eq!(
            LookupSettings {
                lookahead_minutes: 0
            }
            .no_meeting_text(),
            "No upcoming meeting."
        );
    }
}
