//! Certification console: certificate records and statistics.
//!
//! Parameters and response shapes are defined by the certification backend,
//! so they travel as free-form [`QueryParams`] and JSON values.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use signatrust_core::models::QueryParams;
use signatrust_core::service::StatisticsService;
use signatrust_core::ApiResult;

use super::SignatrustClient;
use crate::http::{RequestSpec, ResponseKind};

const CERTIFICATION: &str = "/api-certification/console/certification";

fn with_params(spec: RequestSpec, params: &QueryParams) -> RequestSpec {
    spec.query(params.pairs().to_vec())
}

pub fn search_request(params: &QueryParams) -> RequestSpec {
    with_params(RequestSpec::get(format!("{CERTIFICATION}/list")), params)
}

/// CSV export, returned as a file.
pub fn export_request(params: &QueryParams) -> RequestSpec {
    with_params(
        RequestSpec::get(format!("{CERTIFICATION}/list/certInfoExport")),
        params,
    )
    .expect(ResponseKind::Blob)
}

pub fn edit_request(params: &QueryParams) -> RequestSpec {
    with_params(RequestSpec::put(CERTIFICATION), params)
}

/// Information upload; same endpoint as edit.
pub fn upload_info_request(params: &QueryParams) -> RequestSpec {
    edit_request(params)
}

pub fn delete_request(params: &QueryParams) -> RequestSpec {
    with_params(RequestSpec::delete(CERTIFICATION), params)
}

pub fn count_by_cooperator_request() -> RequestSpec {
    RequestSpec::get(format!("{CERTIFICATION}/statistics/countByCooperator"))
}

pub fn count_by_increase_request(params: &QueryParams) -> RequestSpec {
    with_params(
        RequestSpec::get(format!("{CERTIFICATION}/statistics/countByIncrease")),
        params,
    )
}

impl SignatrustClient {
    pub async fn search_certificates(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(search_request(params)).await
    }

    pub async fn export_certificates(&self, params: &QueryParams) -> ApiResult<Bytes> {
        Ok(self.http.request(export_request(params)).await?.into_bytes())
    }

    pub async fn edit_certificate(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(edit_request(params)).await
    }

    pub async fn upload_certificate_info(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(upload_info_request(params)).await
    }

    pub async fn delete_certificate(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(delete_request(params)).await
    }
}

#[async_trait]
impl StatisticsService for SignatrustClient {
    async fn count_by_cooperator(&self) -> ApiResult<Value> {
        self.http.json(count_by_cooperator_request()).await
    }

    async fn count_by_increase(&self, params: &QueryParams) -> ApiResult<Value> {
        self.http.json(count_by_increase_request(params)).await
    }
}
