//! API token list shown on the tokens page.

use crate::error::ApiResult;
use crate::models::{ApiToken, CreateApiToken};
use crate::service::TokenService;

/// Tokens of the logged-in user. Every mutation re-fetches the list.
#[derive(Debug, Clone, Default)]
pub struct TokenListState {
    tokens: Vec<ApiToken>,
    last_created: Option<ApiToken>,
}

impl TokenListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[ApiToken] {
        &self.tokens
    }

    /// Token returned by the last create; the only time its secret is visible.
    pub fn last_created(&self) -> Option<&ApiToken> {
        self.last_created.as_ref()
    }

    pub async fn refresh(&mut self, svc: &dyn TokenService) -> ApiResult<()> {
        self.tokens = svc.list_tokens().await?;
        Ok(())
    }

    pub async fn create(&mut self, svc: &dyn TokenService, description: &str) -> ApiResult<ApiToken> {
        let created = svc
            .create_token(&CreateApiToken {
                description: description.to_string(),
            })
            .await?;
        self.last_created = Some(created.clone());
        self.refresh(svc).await?;
        Ok(created)
    }

    pub async fn delete(&mut self, svc: &dyn TokenService, id: i32) -> ApiResult<()> {
        svc.delete_token(id).await?;
        self.refresh(svc).await
    }
}
