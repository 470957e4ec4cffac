//! Backend operations the state containers and auth flow depend on.
//!
//! `signatrust_client` implements these over HTTP; tests implement them with
//! canned responses.

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::AuthCode;
use crate::error::ApiResult;
use crate::models::{ApiToken, CreateApiToken, KeyListQuery, PagedKeys, QueryParams, TokenGrant};

/// Key listing.
#[async_trait]
pub trait KeyService: Send + Sync {
    async fn list_keys(&self, query: &KeyListQuery) -> ApiResult<PagedKeys>;
}

/// API token management for the logged-in user.
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn list_tokens(&self) -> ApiResult<Vec<ApiToken>>;
    async fn create_token(&self, request: &CreateApiToken) -> ApiResult<ApiToken>;
    async fn delete_token(&self, id: i32) -> ApiResult<()>;
}

/// Session establishment and teardown.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Trade an authorization code for a session token.
    async fn exchange_code(&self, code: &AuthCode) -> ApiResult<TokenGrant>;
    /// Invalidate the session server-side.
    async fn logout(&self) -> ApiResult<()>;
}

/// Certification console statistics. Shapes are server-defined.
#[async_trait]
pub trait StatisticsService: Send + Sync {
    async fn count_by_cooperator(&self) -> ApiResult<Value>;
    async fn count_by_increase(&self, params: &QueryParams) -> ApiResult<Value>;
}
