//! Data-key endpoints.

use async_trait::async_trait;
use signatrust_core::models::{
    CreateKey, DataKey, ExportedKey, ImportKey, KeyAction, KeyListQuery, PagedKeys, Visibility,
};
use signatrust_core::service::KeyService;
use signatrust_core::{ApiError, ApiResult};
use tracing::{debug, info};

use super::SignatrustClient;
use crate::http::{RequestSpec, ResponseKind};

const KEYS: &str = "/api/v1/keys";

pub fn list_keys_request(query: &KeyListQuery) -> RequestSpec {
    RequestSpec::get(format!("{KEYS}/")).query(query.to_pairs())
}

pub fn show_key_request(id: i32) -> RequestSpec {
    RequestSpec::get(format!("{KEYS}/{id}"))
}

pub fn create_key_request(body: &CreateKey) -> ApiResult<RequestSpec> {
    RequestSpec::post(format!("{KEYS}/")).json(body)
}

pub fn import_key_request(body: &ImportKey) -> ApiResult<RequestSpec> {
    RequestSpec::post(format!("{KEYS}/import")).json(body)
}

/// `POST /api/v1/keys/{id}/{action}`. Only `export` returns a body.
pub fn key_action_request(id: i32, action: KeyAction) -> RequestSpec {
    let spec = RequestSpec::post(format!("{KEYS}/{id}/{}", action.path_segment()));
    match action {
        KeyAction::Export => spec,
        _ => spec.expect(ResponseKind::Empty),
    }
}

pub fn name_identical_request(name: &str, visibility: Visibility) -> RequestSpec {
    RequestSpec::head(format!("{KEYS}/name_identical"))
        .param("name", name)
        .param("visibility", visibility)
}

impl SignatrustClient {
    pub async fn list_keys_page(&self, query: &KeyListQuery) -> ApiResult<PagedKeys> {
        self.http.json(list_keys_request(query)).await
    }

    pub async fn show_key(&self, id: i32) -> ApiResult<DataKey> {
        self.http.json(show_key_request(id)).await
    }

    pub async fn create_key(&self, body: &CreateKey) -> ApiResult<DataKey> {
        let key: DataKey = self.http.json(create_key_request(body)?).await?;
        info!(id = key.id, name = %key.name, "Key created");
        Ok(key)
    }

    pub async fn import_key(&self, body: &ImportKey) -> ApiResult<DataKey> {
        let key: DataKey = self.http.json(import_key_request(body)?).await?;
        info!(id = key.id, name = %key.name, "Key imported");
        Ok(key)
    }

    /// Lifecycle action without a response body.
    pub async fn key_action(&self, id: i32, action: KeyAction) -> ApiResult<()> {
        if action == KeyAction::Export {
            return Err(ApiError::InvalidRequest(
                "use export_key to export key material".into(),
            ));
        }
        self.http.request(key_action_request(id, action)).await?;
        info!(id, action = action.path_segment(), "Key action applied");
        Ok(())
    }

    pub async fn export_key(&self, id: i32) -> ApiResult<ExportedKey> {
        self.http
            .json(key_action_request(id, KeyAction::Export))
            .await
    }

    /// Whether `name` is still free in `visibility`. The backend answers 2xx
    /// for a free name and 409 for a taken one.
    pub async fn name_available(&self, name: &str, visibility: Visibility) -> ApiResult<bool> {
        match self.http.request(name_identical_request(name, visibility)).await {
            Ok(_) => Ok(true),
            Err(ApiError::Status { status: 409, .. }) => {
                debug!(name, "Key name already taken");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl KeyService for SignatrustClient {
    async fn list_keys(&self, query: &KeyListQuery) -> ApiResult<PagedKeys> {
        self.list_keys_page(query).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use signatrust_core::models::SearchField;

    use super::*;

    #[test]
    fn list_query_is_flattened() {
        let q = KeyListQuery::page(Visibility::Private, 10, 2).with_search(SearchField::Name, "prod");
        let spec = list_keys_request(&q);
        assert_eq!(spec.path, "/api/v1/keys/");
        assert_eq!(
            spec.query,
            vec![
                ("visibility".into(), "private".into()),
                ("page_size".into(), "10".into()),
                ("page_number".into(), "2".into()),
                ("name".into(), "prod".into()),
            ]
        );
    }

    #[test]
    fn actions_interpolate_id() {
        let spec = key_action_request(42, KeyAction::RequestDelete);
        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.path, "/api/v1/keys/42/request_delete");
        assert_eq!(spec.response, ResponseKind::Empty);

        assert_eq!(
            key_action_request(42, KeyAction::Export).response,
            ResponseKind::Json
        );
    }

    #[test]
    fn name_check_is_head_with_query() {
        let spec = name_identical_request("release-key", Visibility::Public);
        assert_eq!(spec.method, Method::HEAD);
        assert_eq!(
            spec.query,
            vec![
                ("name".into(), "release-key".into()),
                ("visibility".into(), "public".into()),
            ]
        );
    }
}
