//! # signatrust_client
//!
//! HTTP adapter and typed API surface for the Signatrust key-management
//! backend and the certification console backend.

pub mod api;
pub mod http;

pub use api::SignatrustClient;
pub use http::{
    HttpClient, LogNotifier, Notifier, Payload, RequestBody, RequestSpec, ResponseKind, Upload,
};
