//! Typed API surface.
//!
//! Every backend operation has a `*_request` function returning its
//! [`RequestSpec`](crate::http::RequestSpec) (verb, path, parameter placement,
//! expected payload) and an async method on [`SignatrustClient`] sending it.

pub mod certification;
pub mod cooperator;
pub mod keys;
pub mod users;

use std::sync::Arc;

use signatrust_core::ApiResult;
use signatrust_core::auth::AuthGuard;
use signatrust_core::config::{ConsoleConfig, Variant};
use signatrust_core::session::SessionStore;

use crate::http::{HttpClient, Notifier};

/// Client for both backend families.
#[derive(Clone)]
pub struct SignatrustClient {
    http: HttpClient,
    variant: Variant,
}

impl SignatrustClient {
    pub fn new(http: HttpClient, variant: Variant) -> Self {
        Self { http, variant }
    }

    /// Builds the HTTP adapter from `config` and wraps it.
    pub fn from_config(
        config: &ConsoleConfig,
        sessions: Arc<dyn SessionStore>,
        guard: Arc<dyn AuthGuard>,
        notifier: Arc<dyn Notifier>,
    ) -> ApiResult<Self> {
        let http = HttpClient::new(config, sessions, guard, notifier)?;
        Ok(Self::new(http, config.variant))
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }
}
