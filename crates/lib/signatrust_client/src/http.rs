//! HTTP adapter shared by every API call.
//!
//! All requests go through [`HttpClient::request`], which attaches the stored
//! session token, applies the configured timeout and normalises the response:
//!
//! - 2xx: the body, as [`Payload::Json`], [`Payload::Blob`] or [`Payload::Empty`]
//!   depending on what the request expects
//! - 401: the session is cleared, the guard redirects to the login page once
//!   and the call fails with [`ApiError::Unauthorized`]
//! - 500: one user-visible notification, then [`ApiError::Server`]
//! - any other status: [`ApiError::Status`], left to the caller
//!
//! Redirects are not followed; the backend answers login and logout with one,
//! and a 3xx counts as success. `Set-Cookie` headers on a successful answer
//! update the stored browser session (the backend rotates its `Xsrf-Token`
//! there). Nothing is retried.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use signatrust_core::auth::AuthGuard;
use signatrust_core::config::ConsoleConfig;
use signatrust_core::models::TokenGrant;
use signatrust_core::session::cookie::apply_set_cookie;
use signatrust_core::session::{Session, SessionStore};
use signatrust_core::{ApiError, ApiResult};
use tracing::{debug, warn};
use url::Url;

/// Where a failed request is reported to the operator.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Notifier writing to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        tracing::error!(detail = message, "Request failed");
    }
}

/// What the caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Json,
    /// Raw bytes (file downloads).
    Blob,
    /// Body is ignored.
    Empty,
}

/// A file sent as a multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub field: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    Multipart(Upload),
}

/// Declarative description of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the base URL (may carry its own query string), or an
    /// absolute URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub response: ResponseKind,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::None,
            response: ResponseKind::Json,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path).expect(ResponseKind::Empty)
    }

    pub fn query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// JSON request body.
    pub fn json<T: Serialize>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, upload: Upload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }

    pub fn expect(mut self, kind: ResponseKind) -> Self {
        self.response = kind;
        self
    }
}

impl From<&str> for RequestSpec {
    fn from(path: &str) -> Self {
        Self::get(path)
    }
}

impl From<String> for RequestSpec {
    fn from(path: String) -> Self {
        Self::get(path)
    }
}

/// Normalised response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Blob(Bytes),
    Empty,
}

impl Payload {
    /// Decodes a JSON payload. An empty body decodes as JSON `null`.
    pub fn into_json<T: DeserializeOwned>(self) -> ApiResult<T> {
        match self {
            Payload::Json(v) => Ok(serde_json::from_value(v)?),
            Payload::Empty => Ok(serde_json::from_value(Value::Null)?),
            Payload::Blob(b) => Ok(serde_json::from_slice(&b)?),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Blob(b) => b,
            Payload::Json(v) => Bytes::from(v.to_string()),
            Payload::Empty => Bytes::new(),
        }
    }
}

/// Backend error body, `{"detail": "..."}`.
#[derive(Debug, serde::Deserialize)]
struct ErrorMessage {
    detail: String,
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(msg) = serde_json::from_str::<ErrorMessage>(body) {
        return msg.detail;
    }
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.to_string()
    }
}

/// Session-aware HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    sessions: Arc<dyn SessionStore>,
    guard: Arc<dyn AuthGuard>,
    notifier: Arc<dyn Notifier>,
}

impl HttpClient {
    pub fn new(
        config: &ConsoleConfig,
        sessions: Arc<dyn SessionStore>,
        guard: Arc<dyn AuthGuard>,
        notifier: Arc<dyn Notifier>,
    ) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(config.base_url.clone()),
            sessions,
            guard,
            notifier,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Sends a request described by `spec` (or a bare path, meaning `GET`).
    pub async fn request(&self, spec: impl Into<RequestSpec>) -> ApiResult<Payload> {
        self.execute(spec.into()).await
    }

    /// Same as [`HttpClient::request`] with the path given separately.
    pub async fn request_at(&self, path: &str, mut spec: RequestSpec) -> ApiResult<Payload> {
        spec.path = path.to_string();
        self.execute(spec).await
    }

    /// Sends `spec` and decodes the JSON body.
    pub async fn json<T: DeserializeOwned>(&self, spec: RequestSpec) -> ApiResult<T> {
        self.execute(spec).await?.into_json()
    }

    /// Resolves a request path against the base URL.
    pub fn resolve(&self, path: &str) -> ApiResult<Url> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("invalid path '{path}': {e}")))
    }

    /// Sends a code exchange without the stored credentials and builds the
    /// grant from the JSON body and the cookies the backend sets.
    pub async fn exchange(&self, spec: RequestSpec) -> ApiResult<TokenGrant> {
        let kind = spec.response;
        let resp = self.send(spec, None).await?;
        let cookies: Vec<String> = set_cookies(resp.headers()).map(str::to_string).collect();
        let mut grant = if resp.status().is_redirection() {
            TokenGrant::default()
        } else {
            match decode(kind, resp).await? {
                Payload::Empty => TokenGrant::default(),
                payload => payload.into_json()?,
            }
        };
        for raw in &cookies {
            apply_set_cookie(raw, &mut grant.token, &mut grant.cookies);
        }
        if grant.is_empty() {
            return Err(ApiError::Decode(
                "code exchange returned neither a token nor a session cookie".into(),
            ));
        }
        Ok(grant)
    }

    async fn execute(&self, spec: RequestSpec) -> ApiResult<Payload> {
        let kind = spec.response;
        let mut session = self.session().await;
        let resp = self.send(spec, session.as_ref()).await?;
        if let Some(session) = &mut session {
            self.absorb(session, resp.headers());
        }
        decode(kind, resp).await
    }

    /// Current session. A missing or unreadable session is not an error
    /// here; the server decides.
    async fn session(&self) -> Option<Session> {
        let mut session = match self.sessions.current() {
            Ok(session) => session?,
            Err(e) => {
                warn!(error = %e, "Could not read session, sending without token");
                return None;
            }
        };
        if session.needs_csrf() {
            self.prime_csrf(&mut session).await;
        }
        Some(session)
    }

    /// Loads the console index with the session cookies. The backend answers
    /// every authorised request with a fresh `Xsrf-Token` cookie.
    async fn prime_csrf(&self, session: &mut Session) {
        let mut req = self.client.get(self.base_url.clone());
        for (name, value) in session.headers() {
            req = req.header(name, value);
        }
        match req.send().await {
            Ok(resp) => {
                self.absorb(session, resp.headers());
                if session.needs_csrf() {
                    debug!("Backend handed out no CSRF token for the session");
                }
            }
            Err(e) => warn!(error = %e, "Could not fetch a CSRF token"),
        }
    }

    /// Applies `Set-Cookie` headers to `session` and stores it when it changed.
    fn absorb(&self, session: &mut Session, headers: &HeaderMap) {
        let mut changed = false;
        for raw in set_cookies(headers) {
            changed |= session.absorb_set_cookie(raw);
        }
        if changed {
            debug!("Session cookies updated");
            if let Err(e) = self.sessions.save(session) {
                warn!(error = %e, "Failed to store updated session");
            }
        }
    }

    /// Sends `spec` with the credentials of `session` and maps failure statuses.
    async fn send(&self, spec: RequestSpec, session: Option<&Session>) -> ApiResult<Response> {
        let url = self.resolve(&spec.path)?;
        debug!(method = %spec.method, url = %url, "Sending request");

        let mut req = self.client.request(spec.method.clone(), url.clone());
        if !spec.query.is_empty() {
            req = req.query(&spec.query);
        }
        if let Some(session) = session {
            for (name, value) in session.headers() {
                req = req.header(name, value);
            }
        }

        req = match spec.body {
            RequestBody::None => req,
            RequestBody::Json(body) => req.json(&body),
            RequestBody::Multipart(upload) => req.multipart(multipart_form(upload)?),
        };

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Transport(format!("request to {url} timed out"))
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %url, "Unauthorized, clearing session");
            if let Err(e) = self.sessions.clear() {
                warn!(error = %e, "Failed to clear session");
            }
            self.guard.redirect_to_login();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() && !status.is_redirection() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                self.notifier.error(&message);
                return Err(ApiError::Server(message));
            }
            debug!(status = status.as_u16(), message = %message, "Request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }
}

fn set_cookies(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
}

async fn decode(kind: ResponseKind, resp: Response) -> ApiResult<Payload> {
    match kind {
        ResponseKind::Empty => Ok(Payload::Empty),
        ResponseKind::Blob => {
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            Ok(Payload::Blob(bytes))
        }
        ResponseKind::Json => {
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Payload::Empty);
            }
            Ok(Payload::Json(serde_json::from_slice(&bytes)?))
        }
    }
}

fn multipart_form(upload: Upload) -> ApiResult<Form> {
    let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
    if let Some(mime) = &upload.mime {
        part = part
            .mime_str(mime)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid mime type '{mime}': {e}")))?;
    }
    Ok(Form::new().part(upload.field, part))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
