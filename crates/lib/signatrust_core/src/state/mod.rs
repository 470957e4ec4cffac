//! View state containers.
//!
//! Each container owns its fields and is only mutated through its own
//! methods. Views receive them through the application context.

pub mod keys;
pub mod statistics;
pub mod tokens;
pub mod ui;

pub use keys::{FetchTicket, KeyListState, KeyTableState, Pagination, TotalSource, TypeCounts};
pub use statistics::{CountWay, GrowthWindow, StatisticsState};
pub use tokens::TokenListState;
pub use ui::UiState;
