//! Session providers supplying the current credential.
//!
//! The pipeline asks the provider for a credential before every request and
//! never caches the answer, so a token rotated between two calls is picked up
//! by the second one.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SessionError;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Token lifetime in minutes.
const TOKEN_EXPIRY_MINUTES: i64 = 30;

/// Opaque bearer token. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The credential to attach to the next request, if any.
    async fn current_credential(&self) -> Result<Option<Credential>, SessionError>;

    /// Invalidate the current session.
    async fn sign_out(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self, lifetime: Duration) -> bool {
        Utc::now() > self.created_at + lifetime
    }
}

/// Session persisted as JSON in a cache directory.
pub struct FileSession {
    cache_dir: PathBuf,
    lifetime: Duration,
}

impl FileSession {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lifetime: Duration::minutes(TOKEN_EXPIRY_MINUTES),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Persist a new token, replacing any existing session.
    pub fn store(&self, token: &str, username: &str) -> Result<SessionData, SessionError> {
        let data = SessionData {
            token: token.to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        std::fs::create_dir_all(&self.cache_dir)?;
        let contents = serde_json::to_string_pretty(&data)?;
        std::fs::write(self.session_path(), contents)?;
        Ok(data)
    }

    /// Read the session from disk. Expired sessions are treated as absent.
    pub fn load(&self) -> Result<Option<SessionData>, SessionError> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let data: SessionData = serde_json::from_str(&contents)?;
        if data.is_expired(self.lifetime) {
            debug!(username = %data.username, "Stored session has expired");
            return Ok(None);
        }
        Ok(Some(data))
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[async_trait]
impl SessionProvider for FileSession {
    async fn current_credential(&self) -> Result<Option<Credential>, SessionError> {
        Ok(self.load()?.and_then(|data| Credential::new(data.token)))
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credential_is_none() {
        assert!(Credential::new("").is_none());
        let cred = Credential::new("abc").unwrap();
        assert_eq!(cred.bearer_header(), "Bearer abc");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("secret-token").unwrap();
        assert!(!format!("{:?}", cred).contains("secret-token"));
    }

    #[tokio::test]
    async fn test_file_session_store_and_sign_out() {
        let dir = tempfile::tempdir().unwrap();
        let session = FileSession::new(dir.path().to_path_buf());
        assert!(session.current_credential().await.unwrap().is_none());

        session.store("tok-1", "ada").unwrap();
        let cred = session.current_credential().await.unwrap().unwrap();
        assert_eq!(cred.as_str(), "tok-1");

        session.sign_out().await.unwrap();
        assert!(session.current_credential().await.unwrap().is_none());
        // Signing out twice is fine
        session.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_session_picks_up_rotated_token() {
        let dir = tempfile::tempdir().unwrap();
        let session = FileSession::new(dir.path().to_path_buf());
        session.store("old", "ada").unwrap();
        assert_eq!(session.current_credential().await.unwrap().unwrap().as_str(), "old");
        session.store("new", "ada").unwrap();
        assert_eq!(session.current_credential().await.unwrap().unwrap().as_str(), "new");
    }

    #[tokio::test]
    async fn test_expired_session_has_no_credential() {
        let dir = tempfile::tempdir().unwrap();
        let session = FileSession::new(dir.path().to_path_buf()).with_lifetime(Duration::minutes(30));
        let data = SessionData {
            token: "stale".into(),
            username: "ada".into(),
            created_at: Utc::now() - Duration::minutes(31),
        };
        std::fs::write(
            dir.path().join(SESSION_FILE),
            serde_json::to_string(&data).unwrap(),
        )
        .unwrap();
        assert!(session.current_credential().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_session_file_fails_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        let session = FileSession::new(dir.path().to_path_buf());
        let err = session.current_credential().await.unwrap_err();
        assert!(matches!(err, SessionError::Corrupt(_)));
    }
}
