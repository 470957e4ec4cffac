//! Session token storage.
//!
//! A [`Session`] is the credential attached to every outgoing request. Where it
//! lives is abstracted behind [`SessionStore`] so the adapter never cares
//! whether the token came from a file, memory or an imported browser cookie.

pub mod cookie;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::TokenGrant;

/// Header carrying a browser-session (CSRF) token.
pub const CSRF_HEADER: &str = "Xsrf-Token";
/// Header carrying an API key.
pub const AUTH_HEADER: &str = "Authorization";
/// Header carrying the backend session cookies of a browser session.
pub const COOKIE_HEADER: &str = "Cookie";

/// Session storage errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// How the token authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Token obtained through the identity-provider redirect.
    Csrf,
    /// Long-lived API key created on the tokens page.
    ApiKey,
}

impl TokenKind {
    pub fn header_name(&self) -> &'static str {
        match self {
            TokenKind::Csrf => CSRF_HEADER,
            TokenKind::ApiKey => AUTH_HEADER,
        }
    }
}

/// Expiry applied when a session is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Lives until cleared (the browser-session cookie behaviour).
    #[default]
    UntilCleared,
    /// Expires after a fixed time.
    MaxAge(Duration),
}

/// Stored credential plus optional identity fields.
///
/// A browser session is the backend's session cookie (kept in `cookies`)
/// together with the rotating `Xsrf-Token` value in `token`. An API key is
/// the `token` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cookies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            token: token.into(),
            kind,
            cookies: BTreeMap::new(),
            email: None,
            user_id: None,
            expires_at: None,
        }
    }

    /// Session created by a successful code exchange.
    pub fn from_grant(grant: &TokenGrant) -> Self {
        Self {
            token: grant.token.clone(),
            kind: TokenKind::Csrf,
            cookies: grant.cookies.clone(),
            email: grant.email.clone(),
            user_id: grant.id,
            expires_at: None,
        }
    }

    /// Stamps the expiry according to `policy`, counted from `now`.
    pub fn with_policy(mut self, policy: ExpiryPolicy, now: DateTime<Utc>) -> Self {
        self.expires_at = match policy {
            ExpiryPolicy::UntilCleared => None,
            ExpiryPolicy::MaxAge(age) => Some(now + age),
        };
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// `(header name, header value)` pairs to attach to requests.
    ///
    /// A browser session sends its cookies plus the `Xsrf-Token` header once
    /// a token is known; an API key sends `Authorization` only.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if self.kind == TokenKind::Csrf && !self.cookies.is_empty() {
            headers.push((COOKIE_HEADER, self::cookie::cookie_header(&self.cookies)));
        }
        if !self.token.is_empty() {
            headers.push((self.kind.header_name(), self.token.clone()));
        }
        headers
    }

    /// A browser session holding cookies but no `Xsrf-Token` yet.
    pub fn needs_csrf(&self) -> bool {
        self.kind == TokenKind::Csrf && self.token.is_empty() && !self.cookies.is_empty()
    }
}

/// Get/set/clear access to the current session.
pub trait SessionStore: Send + Sync {
    /// Raw stored session, expired or not.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Removes the session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionError>;

    /// Current usable session. An expired session is cleared and reads as absent.
    fn current(&self) -> Result<Option<Session>, SessionError> {
        match self.load()? {
            Some(session) if session.is_expired(Utc::now()) => {
                debug!("stored session expired, clearing");
                self.clear()?;
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

/// Process-local store, used by tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// JSON file store, readable only by the owner on unix.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }
        debug!(path = %self.path.display(), "session stored");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
