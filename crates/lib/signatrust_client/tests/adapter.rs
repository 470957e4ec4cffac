//! Adapter behaviour against an in-process mock backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde_json::json;
use signatrust_client::{Notifier, RequestSpec, SignatrustClient, Upload};
use signatrust_core::ApiError;
use signatrust_core::auth::{AuthFlow, LoginRedirect};
use signatrust_core::config::ConsoleConfig;
use signatrust_core::models::{QueryParams, Visibility};
use signatrust_core::session::{
    CSRF_HEADER, ExpiryPolicy, MemorySessionStore, Session, SessionStore, TokenKind,
};
use signatrust_core::state::KeyListState;
use tokio::net::TcpListener;
use url::Url;

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    query: Option<String>,
    csrf: Option<String>,
    authorization: Option<String>,
    cookie: Option<String>,
}

impl Seen {
    fn has_backend_session(&self) -> bool {
        self.cookie
            .as_deref()
            .is_some_and(|c| c.split("; ").any(|pair| pair == "signatrust=sess"))
    }
}

#[derive(Clone, Default)]
struct Backend {
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    fn record(&self, uri: &Uri, headers: &HeaderMap) -> Seen {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let seen = Seen {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            csrf: value(CSRF_HEADER),
            authorization: value("authorization"),
            cookie: value("cookie"),
        };
        self.seen.lock().unwrap().push(seen.clone());
        seen
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }

    fn paths(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|s| s.path.clone()).collect()
    }
}

fn browser_session(csrf: &str) -> Session {
    let mut session = Session::new(csrf, TokenKind::Csrf);
    session.cookies.insert("signatrust".into(), "sess".into());
    session
}

const CSRF_COOKIE: &str = "Xsrf-Token=valid; Secure; Path=/; Max-Age=600";

/// Cookie sessions need a matching CSRF header and get a fresh token back.
async fn user_info(State(b): State<Backend>, uri: Uri, headers: HeaderMap) -> Response {
    let seen = b.record(&uri, &headers);
    let body = Json(json!({"id": 1, "email": "ops@example.com"}));
    if seen.authorization.as_deref() == Some("api-key") {
        return body.into_response();
    }
    let csrf_ok = matches!(seen.csrf.as_deref(), Some("valid" | "rotated"));
    if seen.has_backend_session() && csrf_ok {
        let rotated = "Xsrf-Token=rotated; Secure; Path=/; Max-Age=600";
        return ([(header::SET_COOKIE, rotated)], body).into_response();
    }
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "unauthorized"}))).into_response()
}

async fn index(State(b): State<Backend>, uri: Uri, headers: HeaderMap) -> Response {
    let seen = b.record(&uri, &headers);
    let page = Html("<html><body>console</body></html>");
    if seen.has_backend_session() {
        ([(header::SET_COOKIE, CSRF_COOKIE)], page).into_response()
    } else {
        page.into_response()
    }
}

async fn list_keys(State(b): State<Backend>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    b.record(&uri, &headers);
    Json(json!({
        "data": [
            {"id": 1, "name": "prod-pgp", "visibility": "public", "key_type": "pgp", "key_state": "enabled"},
            {"id": 2, "name": "prod-ca", "visibility": "public", "key_type": "x509ca", "key_state": "disabled"}
        ],
        "meta": {"total_count": 12}
    }))
}

async fn name_identical(
    State(b): State<Backend>,
    Query(q): Query<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> StatusCode {
    b.record(&uri, &headers);
    if q.get("name").map(String::as_str) == Some("taken") {
        StatusCode::CONFLICT
    } else {
        StatusCode::OK
    }
}

async fn callback(State(b): State<Backend>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    b.record(&uri, &headers);
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/"),
            (header::SET_COOKIE, "signatrust=sess; Path=/; HttpOnly"),
        ],
    )
}

async fn slow(State(b): State<Backend>, uri: Uri, headers: HeaderMap) -> StatusCode {
    b.record(&uri, &headers);
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}

async fn boom(State(b): State<Backend>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    b.record(&uri, &headers);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"detail": "database unavailable"})),
    )
}

async fn export(State(b): State<Backend>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    b.record(&uri, &headers);
    ([(header::CONTENT_TYPE, "text/csv")], "id,name\n1,acme\n")
}

async fn upload(
    State(b): State<Backend>,
    uri: Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    b.record(&uri, &headers);
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let len = field.bytes().await.unwrap().len();
        fields.push(json!({"name": name, "file_name": file_name, "len": len}));
    }
    Json(json!({"fields": fields}))
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

struct Harness {
    client: SignatrustClient,
    backend: Backend,
    store: Arc<MemorySessionStore>,
    guard: Arc<LoginRedirect>,
    notifier: Arc<RecordingNotifier>,
}

async fn harness(session: Option<Session>) -> Harness {
    harness_with(session, |_| {}).await
}

async fn harness_with(session: Option<Session>, configure: impl FnOnce(&mut ConsoleConfig)) -> Harness {
    let backend = Backend::default();
    let app = Router::new()
        .route("/", get(index))
        .route("/slow", get(slow))
        .route("/api/v1/users/info", get(user_info))
        .route("/api/v1/users/callback", get(callback))
        .route("/api/v1/keys/", get(list_keys))
        .route("/api/v1/keys/name_identical", get(name_identical))
        .route("/boom", get(boom))
        .route(
            "/api-certification/console/certification/list/certInfoExport",
            get(export),
        )
        .route("/api-certification/console/fileUpload", post(upload))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = ConsoleConfig::new(Url::parse(&format!("http://{addr}")).unwrap());
    configure(&mut config);
    let store = Arc::new(match session {
        Some(s) => MemorySessionStore::with_session(s),
        None => MemorySessionStore::new(),
    });
    let guard = Arc::new(LoginRedirect::new(config.login_url.clone()));
    let notifier = Arc::new(RecordingNotifier::default());
    let client =
        SignatrustClient::from_config(&config, store.clone(), guard.clone(), notifier.clone())
            .unwrap();

    Harness {
        client,
        backend,
        store,
        guard,
        notifier,
    }
}

#[tokio::test]
async fn unauthorized_clears_session_and_redirects_once() {
    let h = harness(Some(Session::new("expired", TokenKind::Csrf))).await;

    let err = h.client.user_info().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(h.backend.hits(), 1);
    assert_eq!(h.guard.redirect_count(), 1);
    assert!(h.store.load().unwrap().is_none());
    assert!(h.notifier.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn absent_session_still_sends_request() {
    let h = harness(None).await;

    let err = h.client.user_info().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(h.backend.hits(), 1);
    assert!(h.backend.last().csrf.is_none());
    assert_eq!(h.guard.redirect_count(), 1);
}

#[tokio::test]
async fn server_error_notifies_once() {
    let h = harness(None).await;

    let err = h.client.http().request("/boom").await.unwrap_err();

    assert!(matches!(err, ApiError::Server(ref m) if m == "database unavailable"));
    assert_eq!(h.backend.hits(), 1);
    assert_eq!(
        *h.notifier.messages.lock().unwrap(),
        vec!["database unavailable".to_string()]
    );
    assert_eq!(h.guard.redirect_count(), 0);
}

#[tokio::test]
async fn other_statuses_are_returned_to_caller() {
    let h = harness(None).await;

    let err = h.client.http().request("/nowhere").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(h.notifier.messages.lock().unwrap().is_empty());
    assert_eq!(h.guard.redirect_count(), 0);
}

#[tokio::test]
async fn session_token_header_depends_on_kind() {
    let h = harness(Some(browser_session("valid"))).await;
    let me = h.client.user_info().await.unwrap();
    assert_eq!(me.email, "ops@example.com");
    let seen = h.backend.last();
    assert_eq!(seen.csrf.as_deref(), Some("valid"));
    assert_eq!(seen.cookie.as_deref(), Some("signatrust=sess"));
    assert!(seen.authorization.is_none());
    assert_eq!(h.store.load().unwrap().unwrap().token, "rotated");

    let h = harness(Some(Session::new("api-key", TokenKind::ApiKey))).await;
    h.client.user_info().await.unwrap();
    let seen = h.backend.last();
    assert_eq!(seen.authorization.as_deref(), Some("api-key"));
    assert!(seen.csrf.is_none());
    assert!(seen.cookie.is_none());
}

#[tokio::test]
async fn request_at_overrides_path_and_keeps_session() {
    let h = harness(Some(browser_session("valid"))).await;

    let payload = h
        .client
        .http()
        .request_at("/api/v1/users/info", RequestSpec::get(""))
        .await
        .unwrap();

    let body: serde_json::Value = payload.into_json().unwrap();
    assert_eq!(body["email"], "ops@example.com");
    let seen = h.backend.last();
    assert_eq!(seen.path, "/api/v1/users/info");
    assert_eq!(seen.csrf.as_deref(), Some("valid"));
    assert!(seen.has_backend_session());
}

#[tokio::test]
async fn slow_backend_times_out_as_transport_error() {
    let h = harness_with(None, |config| config.timeout = Duration::from_secs(1)).await;

    let err = h.client.http().request("/slow").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(ref m) if m.contains("timed out")), "{err:?}");
    assert_eq!(h.guard.redirect_count(), 0);
    assert!(h.notifier.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn key_list_sends_state_query_and_derives_counts() {
    let h = harness(Some(browser_session("valid"))).await;
    let mut state = KeyListState::new(Visibility::Public);
    state.set_search("prod");
    state.set_page(2);

    assert!(state.fetch(&h.client).await.unwrap());

    let seen = h.backend.last();
    assert_eq!(seen.path, "/api/v1/keys/");
    assert_eq!(
        seen.query.as_deref(),
        Some("visibility=public&page_size=10&page_number=2&name=prod")
    );
    assert_eq!(state.total_count(), 12);
    assert_eq!(state.counts().pgp, 1);
    assert_eq!(state.counts().x509, 1);
}

#[tokio::test]
async fn name_check_maps_conflict_to_taken() {
    let h = harness(None).await;
    assert!(h.client.name_available("fresh", Visibility::Public).await.unwrap());
    assert!(!h.client.name_available("taken", Visibility::Public).await.unwrap());
    assert_eq!(h.backend.hits(), 2);
}

#[tokio::test]
async fn code_exchange_establishes_session() {
    let h = harness(None).await;
    let mut flow = AuthFlow::resume(h.store.clone(), ExpiryPolicy::UntilCleared).unwrap();
    let redirect = Url::parse("https://console.example.com/?code=c0de&state=st#/keys").unwrap();

    let outcome = flow.complete_redirect(&h.client, &redirect).await;

    let session = outcome.result.unwrap();
    assert_eq!(session.cookies.get("signatrust").map(String::as_str), Some("sess"));
    assert!(session.needs_csrf());
    assert_eq!(outcome.clean_url.as_str(), "https://console.example.com/#/keys");
    assert_eq!(h.backend.paths(), vec!["/api/v1/users/callback"]);
    assert_eq!(h.backend.last().query.as_deref(), Some("code=c0de&state=st"));
    assert!(flow.is_authenticated());

    let me = h.client.user_info().await.unwrap();
    assert_eq!(me.email, "ops@example.com");
    assert_eq!(
        h.backend.paths(),
        vec!["/api/v1/users/callback", "/", "/api/v1/users/info"]
    );
    let seen = h.backend.last();
    assert_eq!(seen.csrf.as_deref(), Some("valid"));
    assert!(seen.has_backend_session());
    assert_eq!(h.store.load().unwrap().unwrap().token, "rotated");
}

#[tokio::test]
async fn exchange_ignores_stored_session_and_requires_a_cookie() {
    let h = harness(Some(browser_session("old"))).await;
    let mut flow = AuthFlow::resume(h.store.clone(), ExpiryPolicy::UntilCleared).unwrap();
    let redirect = Url::parse("https://console.example.com/?code=c0de").unwrap();

    // The index answers 200 without cookies; pointing the exchange there
    // leaves nothing to build a session from.
    let err = h
        .client
        .http()
        .exchange(RequestSpec::get("/"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "{err:?}");

    flow.complete_redirect(&h.client, &redirect).await.result.unwrap();
    assert!(h.backend.last().cookie.is_none());
}

#[tokio::test]
async fn certificate_export_returns_raw_bytes() {
    let h = harness(None).await;
    let bytes = h
        .client
        .export_certificates(&QueryParams::new().with("cooperatorName", "acme"))
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"id,name\n1,acme\n");
    assert_eq!(h.backend.last().query.as_deref(), Some("cooperatorName=acme"));
}

#[tokio::test]
async fn logo_upload_is_sent_as_multipart() {
    let h = harness(None).await;
    let upload = Upload::new("file", "logo.png", vec![0u8; 16]).with_mime("image/png");

    let body = h.client.upload_logo(upload).await.unwrap();

    assert_eq!(h.backend.last().query.as_deref(), Some("type=LOGO"));
    assert_eq!(
        body,
        json!({"fields": [{"name": "file", "file_name": "logo.png", "len": 16}]})
    );
}
