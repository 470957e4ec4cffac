//! Login state machine.
//!
//! ```text
//! Unauthenticated --redirect(code)--> CodeReceived --exchange ok--> Authenticated
//!        ^                                 |                             |
//!        +----------- exchange failed -----+                             |
//!        +------------------- 401 / logout ------------------------------+
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use super::callback::{AuthCode, parse_callback, strip_callback_params};
use super::AuthError;
use crate::error::ApiError;
use crate::service::AuthService;
use crate::session::{ExpiryPolicy, Session, SessionStore, TokenKind};

/// Where the operator is in the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    CodeReceived(AuthCode),
    Authenticated(Session),
}

impl AuthState {
    pub fn name(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::CodeReceived(_) => "code_received",
            AuthState::Authenticated(_) => "authenticated",
        }
    }
}

/// Outcome of handling a provider redirect end to end.
#[derive(Debug)]
pub struct LoginOutcome {
    /// The redirect URL without `code`/`state`. Always stripped, whether or
    /// not the exchange succeeded, since a code is single-use.
    pub clean_url: Url,
    pub result: Result<Session, AuthError>,
}

/// Drives [`AuthState`] and keeps the session store in step with it.
pub struct AuthFlow {
    state: AuthState,
    store: Arc<dyn SessionStore>,
    policy: ExpiryPolicy,
}

impl AuthFlow {
    /// Starts from whatever the store holds: a live session means
    /// `Authenticated`, anything else `Unauthenticated`.
    pub fn resume(store: Arc<dyn SessionStore>, policy: ExpiryPolicy) -> Result<Self, AuthError> {
        let state = match store.current()? {
            Some(session) => AuthState::Authenticated(session),
            None => AuthState::Unauthenticated,
        };
        debug!(state = state.name(), "auth flow resumed");
        Ok(Self { state, store, policy })
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            AuthState::Authenticated(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    /// Records the code carried by a provider redirect.
    ///
    /// Valid from `Unauthenticated` and from `Authenticated` (re-login). A
    /// second redirect while a code is pending is rejected.
    pub fn receive_redirect(&mut self, url: &Url) -> Result<AuthCode, AuthError> {
        if let AuthState::CodeReceived(_) = self.state {
            return Err(self.invalid("redirect"));
        }
        let code = parse_callback(url).ok_or(AuthError::MissingCode)?;
        self.state = AuthState::CodeReceived(code.clone());
        Ok(code)
    }

    /// Exchanges the pending code. On success the session is stored; on
    /// failure the flow returns to `Unauthenticated` and the code is dropped.
    pub async fn exchange(&mut self, auth: &dyn AuthService) -> Result<Session, AuthError> {
        let code = match std::mem::replace(&mut self.state, AuthState::Unauthenticated) {
            AuthState::CodeReceived(code) => code,
            other => {
                self.state = other;
                return Err(self.invalid("exchange"));
            }
        };

        match auth.exchange_code(&code).await {
            Ok(grant) => {
                let session = Session::from_grant(&grant).with_policy(self.policy, Utc::now());
                self.store.save(&session)?;
                info!(email = ?session.email, "login completed");
                self.state = AuthState::Authenticated(session.clone());
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "authorization code exchange failed");
                Err(AuthError::ExchangeFailed(e))
            }
        }
    }

    /// Handles a provider redirect: record the code, exchange it and strip it
    /// from the URL.
    pub async fn complete_redirect(&mut self, auth: &dyn AuthService, url: &Url) -> LoginOutcome {
        let clean_url = strip_callback_params(url);
        let result = match self.receive_redirect(url) {
            Ok(_) => self.exchange(auth).await,
            Err(e) => Err(e),
        };
        LoginOutcome { clean_url, result }
    }

    /// Stores an API key as the session. Valid unless a code is pending.
    pub fn login_with_api_key(&mut self, token: &str) -> Result<Session, AuthError> {
        self.adopt(Session::new(token, TokenKind::ApiKey))
    }

    /// Stores a session obtained elsewhere (e.g. a browser cookie).
    /// Valid unless a code is pending.
    pub fn adopt(&mut self, session: Session) -> Result<Session, AuthError> {
        if let AuthState::CodeReceived(_) = self.state {
            return Err(self.invalid("adopt_session"));
        }
        let session = session.with_policy(self.policy, Utc::now());
        self.store.save(&session)?;
        debug!(kind = ?session.kind, "session stored");
        self.state = AuthState::Authenticated(session.clone());
        Ok(session)
    }

    /// Drops the session after the backend rejected it. Valid from every
    /// state; a pending code is discarded too.
    pub fn invalidate(&mut self) -> Result<(), AuthError> {
        self.store.clear()?;
        self.state = AuthState::Unauthenticated;
        Ok(())
    }

    /// Re-reads the store to pick up cookies the HTTP layer rotated, or a
    /// session it cleared after a 401. A pending code is kept.
    pub fn reload(&mut self) -> Result<Option<&Session>, AuthError> {
        if let AuthState::CodeReceived(_) = self.state {
            return Ok(None);
        }
        self.state = match self.store.current()? {
            Some(session) => AuthState::Authenticated(session),
            None => AuthState::Unauthenticated,
        };
        Ok(self.session())
    }

    /// Logs out server-side and locally. The local session is cleared even
    /// when the server call fails; a 401 means the server already forgot us.
    pub async fn logout(&mut self, auth: &dyn AuthService) -> Result<(), AuthError> {
        if !self.is_authenticated() {
            return Err(self.invalid("logout"));
        }
        let server = auth.logout().await;
        self.invalidate()?;
        match server {
            Ok(()) | Err(ApiError::Unauthorized) => Ok(()),
            Err(e) => Err(AuthError::LogoutFailed(e)),
        }
    }

    fn invalid(&self, event: &'static str) -> AuthError {
        AuthError::InvalidTransition {
            state: self.state.name(),
            event,
        }
    }
}
