use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: impl Into<String>, email: Option<String>) -> Self {
        Self {
            token: token.into(),
            email,
            created_at: Utc::now(),
        }
    }
}

/// Clears wherever the credential is persisted. Called by the HTTP layer
/// when the backend answers 401 to an authenticated request.
pub trait SessionStore: Send + Sync {
    fn clear_stored(&self) -> Result<()>;
}

/// Bearer token persisted as JSON in the cache directory.
#[derive(Debug, Clone)]
pub struct Session {
    cache_dir: PathBuf,
}

impl Session {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Load session from disk
    pub fn load(&self) -> Result<Option<SessionData>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }

    /// Save session to disk
    pub fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    /// Remove the persisted session, if any
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    /// Get the bearer token of the persisted session
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.load()?.map(|d| d.token))
    }

    pub fn email(&self) -> Result<Option<String>> {
        Ok(self.load()?.and_then(|d| d.email))
    }

    pub fn path(&self) -> PathBuf {
        self.session_path()
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl SessionStore for Session {
    fn clear_stored(&self) -> Result<()> {
        self.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = Session::new(dir.path().join("luzia"));

        assert_eq!(session.load().expect("missing file is not an error"), None);

        let data = SessionData::new("abc.def", Some("ana@example.com".to_string()));
        session.save(&data).expect("save");
        assert_eq!(session.load().expect("load"), Some(data));
        assert_eq!(session.token().expect("token").as_deref(), Some("abc.def"));
        assert_eq!(session.email().expect("email").as_deref(), Some("ana@example.com"));

        session.clear_stored().expect("clear");
        assert!(!session.path().exists());
        assert_eq!(session.token().expect("token"), None);

        // Clearing twice is fine
        session.clear().expect("second clear");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = Session::new(dir.path());
        std::fs::write(session.path(), "{oops").expect("write");
        assert!(session.load().is_err());
    }
}
