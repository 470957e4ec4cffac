//! Login flow: authorization-code redirect, token exchange, guard and logout.

pub mod callback;
pub mod flow;
pub mod guard;

pub use callback::{AuthCode, has_callback_params, parse_callback, strip_callback_params};
pub use flow::{AuthFlow, AuthState, LoginOutcome};
pub use guard::{AuthGuard, LoginRedirect, provider_logout_url};

use thiserror::Error;

use crate::error::ApiError;
use crate::session::SessionError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Redirect URL carries no authorization code")]
    MissingCode,

    #[error("Invalid auth transition: '{event}' while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("Code exchange failed: {0}")]
    ExchangeFailed(#[source] ApiError),

    #[error("Logout failed: {0}")]
    LogoutFailed(#[source] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
