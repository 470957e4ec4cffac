//! # signatrust_core
//!
//! Core domain logic for the Signatrust console: models, session storage,
//! the login state machine and the view state containers.

pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod service;
pub mod session;
pub mod state;

pub use error::{ApiError, ApiResult};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
