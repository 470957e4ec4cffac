use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("Fmt::{:?}: {}", .0, .0)]
    Fmt(#[from] std::fmt::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("{}", .0)]
    Api(#[from] signatrust_core::ApiError),

    #[error("{}", .0)]
    Auth(#[from] signatrust_core::auth::AuthError),

    #[error("{}", .0)]
    Session(#[from] signatrust_core::session::SessionError),

    #[error("Config: {}", .0)]
    Config(#[from] signatrust_core::config::ConfigError),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("Url: {}", .0)]
    Url(#[from] url::ParseError),
}
