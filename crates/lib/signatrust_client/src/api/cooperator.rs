//! Certification console: cooperators, certificate categories and types.

use serde_json::Value;
use signatrust_core::models::QueryParams;
use signatrust_core::ApiResult;
use tracing::info;

use super::SignatrustClient;
use crate::http::{RequestSpec, Upload};

const CONSOLE: &str = "/api-certification/console";

/// Form field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

pub fn list_request(params: &QueryParams) -> RequestSpec {
    RequestSpec::get(format!("{CONSOLE}/cooperator/list")).query(params.pairs().to_vec())
}

pub fn categories_request(params: &QueryParams) -> RequestSpec {
    RequestSpec::get(format!("{CONSOLE}/cooperator/certCategory/list"))
        .query(params.pairs().to_vec())
}

pub fn cert_types_request() -> RequestSpec {
    RequestSpec::get(format!("{CONSOLE}/certType/list"))
}

pub fn save_request(body: &Value) -> ApiResult<RequestSpec> {
    RequestSpec::post(format!("{CONSOLE}/cooperator/save")).json(body)
}

/// Delete takes its parameters in the query string, not the body.
pub fn delete_request(params: &QueryParams) -> RequestSpec {
    RequestSpec::post(format!("{CONSOLE}/cooperator/delete")).query(params.pairs().to_vec())
}

pub fn detail_request(params: &QueryParams) -> RequestSpec {
    RequestSpec::get(format!("{CONSOLE}/cooperator/detail")).query(params.pairs().to_vec())
}

pub fn upload_logo_request(upload: Upload) -> RequestSpec {
    RequestSpec::post(format!("{CONSOLE}/fileUpload?type=LOGO")).multipart(upload)
}

impl SignatrustClient {
    pub async fn cooperators(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(list_request(params)).await
    }

    pub async fn cooperator_categories(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(categories_request(params)).await
    }

    pub async fn cert_types(&self) -> ApiResult<Value> {
        self.http.json(cert_types_request()).await
    }

    pub async fn save_cooperator(&self, body: &Value) -> ApiResult<Value> {
        let saved = self.http.json(save_request(body)?).await?;
        info!("Cooperator saved");
        Ok(saved)
    }

    pub async fn delete_cooperator(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(delete_request(params)).await
    }

    pub async fn cooperator_detail(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(detail_request(params)).await
    }

    /// Uploads a logo image; the response carries its stored location.
    pub async fn upload_logo(&self, upload: Upload) -> ApiResult<Value> {
        self.http.json(upload_logo_request(upload)).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;
    use crate::http::RequestBody;

    #[test]
    fn delete_uses_query_not_body() {
        let spec = delete_request(&QueryParams::new().with("id", 9));
        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.query, vec![("id".into(), "9".into())]);
        assert_eq!(spec.body, RequestBody::None);
    }

    #[test]
    fn logo_upload_is_multipart() {
        let upload = Upload::new(UPLOAD_FIELD, "logo.png", vec![1, 2, 3]).with_mime("image/png");
        let spec = upload_logo_request(upload.clone());
        assert_eq!(spec.path, "/api-certification/console/fileUpload?type=LOGO");
        assert_eq!(spec.body, RequestBody::Multipart(upload));
    }

    #[test]
    fn save_sends_json_body() {
        let body = serde_json::json!({"name": "acme", "certCategory": [1, 2]});
        let spec = save_request(&body).unwrap();
        assert_eq!(spec.body, RequestBody::Json(body));
    }
}
