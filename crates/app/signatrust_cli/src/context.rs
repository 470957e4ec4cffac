use std::sync::Arc;

use signatrust_client::{LogNotifier, SignatrustClient};
use signatrust_core::auth::{AuthFlow, LoginRedirect};
use signatrust_core::config::{ConsoleConfig, Variant};
use signatrust_core::session::{FileSessionStore, SessionStore};
use signatrust_core::state::{KeyTableState, StatisticsState, TokenListState, TotalSource, UiState};

use crate::Result;

/// Everything a view needs, built once per invocation.
pub struct AppContext {
    pub config: ConsoleConfig,
    pub client: SignatrustClient,
    pub auth: AuthFlow,
    pub guard: Arc<LoginRedirect>,
    pub ui: UiState,
    pub keys: KeyTableState,
    pub tokens: TokenListState,
    pub stats: StatisticsState,
    /// Print JSON instead of tables.
    pub json: bool,
}

impl AppContext {
    pub fn new(config: ConsoleConfig, json: bool) -> Result<Self> {
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.session_path));
        let guard = Arc::new(LoginRedirect::new(config.login_url.clone()));
        let client = SignatrustClient::from_config(
            &config,
            store.clone(),
            guard.clone(),
            Arc::new(LogNotifier),
        )?;
        let auth = AuthFlow::resume(store, config.expiry_policy())?;

        // The certification console pages its key list locally.
        let total_source = match config.variant {
            Variant::Signatrust => TotalSource::ServerMeta,
            Variant::Certification => TotalSource::LocalSlice,
        };

        Ok(Self {
            config,
            client,
            auth,
            guard,
            ui: UiState::new(),
            keys: KeyTableState::with_total_source(total_source),
            tokens: TokenListState::new(),
            stats: StatisticsState::default(),
            json,
        })
    }
}
