//! Users, session and API-token endpoints.

use async_trait::async_trait;
use serde_json::Value;
use signatrust_core::auth::AuthCode;
use signatrust_core::config::Variant;
use signatrust_core::models::{ApiToken, CreateApiToken, QueryParams, TokenGrant, UserIdentity};
use signatrust_core::service::{AuthService, TokenService};
use signatrust_core::ApiResult;
use tracing::info;

use super::SignatrustClient;
use crate::http::{RequestSpec, ResponseKind};

const USERS: &str = "/api/v1/users";
const CONSOLE_AUTH: &str = "/api-certification/console/auth";

pub fn login_url_request() -> RequestSpec {
    RequestSpec::get(format!("{USERS}/login"))
}

pub fn user_info_request() -> RequestSpec {
    RequestSpec::get(format!("{USERS}/info"))
}

pub fn permissions_request(params: &QueryParams) -> RequestSpec {
    RequestSpec::get(format!("{USERS}/")).query(params.pairs().to_vec())
}

/// Code exchange; the certification console has its own endpoint.
pub fn exchange_request(variant: Variant, code: &AuthCode) -> RequestSpec {
    let path = match variant {
        Variant::Signatrust => format!("{USERS}/callback"),
        Variant::Certification => format!("{CONSOLE_AUTH}/login"),
    };
    let mut spec = RequestSpec::get(path).param("code", &code.code);
    if let Some(state) = &code.state {
        spec = spec.param("state", state);
    }
    spec
}

pub fn logout_request(variant: Variant) -> RequestSpec {
    match variant {
        Variant::Signatrust => RequestSpec::post(format!("{USERS}/logout")),
        Variant::Certification => RequestSpec::get(format!("{CONSOLE_AUTH}/logout")),
    }
    .expect(ResponseKind::Empty)
}

pub fn list_tokens_request() -> RequestSpec {
    RequestSpec::get(format!("{USERS}/api_keys"))
}

pub fn create_token_request(body: &CreateApiToken) -> ApiResult<RequestSpec> {
    RequestSpec::post(format!("{USERS}/api_keys")).json(body)
}

pub fn delete_token_request(id: i32) -> RequestSpec {
    RequestSpec::delete(format!("{USERS}/api_keys/{id}")).expect(ResponseKind::Empty)
}

impl SignatrustClient {
    /// Login entry point as served by the backend.
    pub async fn login_url(&self) -> ApiResult<Value> {
        self.http.json(login_url_request()).await
    }

    pub async fn user_info(&self) -> ApiResult<UserIdentity> {
        self.http.json(user_info_request()).await
    }

    pub async fn permissions(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(permissions_request(params)).await
    }
}

#[async_trait]
impl AuthService for SignatrustClient {
    async fn exchange_code(&self, code: &AuthCode) -> ApiResult<TokenGrant> {
        self.http.exchange(exchange_request(self.variant, code)).await
    }

    async fn logout(&self) -> ApiResult<()> {
        self.http.request(logout_request(self.variant)).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenService for SignatrustClient {
    async fn list_tokens(&self) -> ApiResult<Vec<ApiToken>> {
        let tokens: Option<Vec<ApiToken>> = self.http.json(list_tokens_request()).await?;
        Ok(tokens.unwrap_or_default())
    }

    async fn create_token(&self, request: &CreateApiToken) -> ApiResult<ApiToken> {
        let token: ApiToken = self.http.json(create_token_request(request)?).await?;
        info!(id = token.id, "API token created");
        Ok(token)
    }

    async fn delete_token(&self, id: i32) -> ApiResult<()> {
        self.http.request(delete_token_request(id)).await?;
        info!(id, "API token deleted");
        Ok(())
    }
}
