//! Domain models shared by the client and the views.

pub mod key;
pub mod params;
pub mod user;

pub use key::{
    CreateKey, DataKey, ExportedKey, ImportKey, KeyAction, KeyListQuery, KeyState, KeyType,
    PagedKeys, PagedMeta, SearchField, Visibility,
};
pub use params::{KeyValue, QueryParams};
pub use user::{ApiToken, CreateApiToken, TokenGrant, UserIdentity};
