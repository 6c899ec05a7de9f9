//! OAuth token values and their on-disk cache.
//!
//! A [`TokenInfo`] is never edited in place: a refresh produces a new value
//! which then replaces the stored record as a whole.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

/// Seconds shaved off the provider's `expires_in` so a token is treated as
/// expired slightly before Google stops accepting it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An OAuth token set as issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes that were granted.
    pub scopes: Vec<String>,

    /// When this token was issued or last refreshed.
    pub issued_at: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates a new token info from OAuth response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(|secs| expiry_from(now, secs)),
            scopes,
            issued_at: now,
        }
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// A token without expiry metadata is never considered expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Returns the token that replaces this one after a refresh.
    ///
    /// Google usually omits the refresh token from refresh responses; the
    /// current one is carried over in that case.
    pub fn refreshed(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        refresh_token: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
            expires_at: expires_in_secs.map(|secs| expiry_from(now, secs)),
            scopes: self.scopes.clone(),
            issued_at: now,
        }
    }

    /// Returns the time until the token expires, if known.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expires_at.map(|expires_at| expires_at - Utc::now())
    }
}

fn expiry_from(now: DateTime<Utc>, expires_in_secs: i64) -> DateTime<Utc> {
    now + Duration::seconds(expires_in_secs) - Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// Persistence for the single cached token record.
pub trait CredentialStore: Send + Sync {
    /// Reads the stored record.
    fn load(&self) -> Result<TokenInfo, StoreError>;

    /// Replaces the stored record.
    fn save(&self, token: &TokenInfo) -> Result<(), StoreError>;
}

/// Token cache backed by a JSON file.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a reader sees either the previous or the new complete record.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store for the record at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the token storage path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileTokenStore {
    fn load(&self) -> Result<TokenInfo, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no token file at {:?}", self.path);
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: "token file is empty".to_string(),
            });
        }

        let token: TokenInfo =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!("loaded token from {:?}", self.path);
        Ok(token)
    }

    fn save(&self, token: &TokenInfo) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let content = serde_json::to_string_pretty(token)
            .map_err(|e| self.write_error(std::io::Error::other(e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        write_private(&temp_path, content.as_bytes()).map_err(|e| self.write_error(e))?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.write_error(e));
        }

        debug!("saved token to {:?}", self.path);
        Ok(())
    }
}

/// Writes `content` to a freshly created file readable only by the owner.
///
/// A leftover file at `path` is removed first so the mode applies.
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Token cache held in memory, for callers that must not touch the disk.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<TokenInfo>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token`.
    pub fn with_token(token: TokenInfo) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    /// Returns the currently stored token, if any.
    pub fn get(&self) -> Option<TokenInfo> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }
}

impl CredentialStore for MemoryTokenStore {
    fn load(&self) -> Result<TokenInfo, StoreError> {
        self.get()
            .ok_or_else(|| StoreError::NotFound(PathBuf::from("<memory>")))
    }

    fn save(&self, token: &TokenInfo) -> Result<(), StoreError> {
        let mut guard = self.token.lock().map_err(|_| StoreError::Write {
            path: PathBuf::from("<memory>"),
            source: std::io::Error::other("token store lock poisoned"),
        })?;
        *guard = Some(token.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> TokenInfo {
        TokenInfo::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec![crate::google::GoogleConfig::DEFAULT_SCOPE.to_string()],
        )
    }

    #[test]
    fn token_info_creation() {
        let token = sample_token();
        assert_eq!(token.access_token, "access-token");
        assert_eq!(token.refresh_token, Some("refresh-token".to_string()));
        assert!(token.expires_at.is_some());
        assert!(!token.is_expired());
    }

    #[test]
    fn token_info_expired() {
        let mut token = sample_token();
        token.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(token.is_expired());
    }

    #[test]
    fn token_without_expiry_never_expires() {
        let token = TokenInfo::new("access", None, None, vec![]);
        assert!(!token.is_expired_at(Utc::now() + Duration::days(3650)));
        assert!(token.time_until_expiry().is_none());
    }

    #[test]
    fn expiry_includes_safety_margin() {
        let token = TokenInfo::new("access", None, Some(3600), vec![]);
        let remaining = token.time_until_expiry().unwrap();
        assert!(remaining <= Duration::seconds(3600 - EXPIRY_MARGIN_SECS));
        assert!(remaining > Duration::seconds(3600 - EXPIRY_MARGIN_SECS - 5));
    }

    #[test]
    fn refreshed_is_a_new_value() {
        let mut old = sample_token();
        old.expires_at = Some(Utc::now() - Duration::minutes(5));

        let new = old.refreshed("new-access", Some(3600), None);
        assert_eq!(old.access_token, "access-token");
        assert_eq!(new.access_token, "new-access");
        assert_eq!(new.refresh_token, old.refresh_token);
        assert_eq!(new.scopes, old.scopes);
        assert!(!new.is_expired());

        let rotated = old.refreshed("newer", Some(3600), Some("rotated".into()));
        assert_eq!(rotated.refresh_token.as_deref(), Some("rotated"));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));
        let token = sample_token();

        store.save(&token).unwrap();
        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());

        let loaded = FileTokenStore::new(store.path()).load().unwrap();
        assert_eq!(loaded, token);
    }

    #[test]
    fn file_store_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));

        let first = sample_token();
        store.save(&first).unwrap();
        let second = first.refreshed("second-access", Some(3600), None);
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), second);
    }

    #[test]
    fn file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        assert!(matches!(store.load(), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn file_store_empty_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "").unwrap();
        let store = FileTokenStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn file_store_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, r#"{"access_token": "trunc"#).unwrap();
        let store = FileTokenStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn file_store_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let store = FileTokenStore::new(blocker.join("token.json"));
        assert!(matches!(
            store.save(&sample_token()),
            Err(StoreError::Write { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store.save(&sample_token()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_replaces_stale_temp_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        let stale = dir.path().join("token.json.tmp");
        fs::write(&stale, "leftover from a crashed run").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&sample_token()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!stale.exists());
        assert_eq!(store.load().unwrap().access_token, "access-token");
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(matches!(store.load(), Err(StoreError::NotFound(_))));
        let token = sample_token();
        store.save(&token).unwrap();
        assert_eq!(store.load().unwrap(), token);
    }
}
