//! Orders domain module (order lifecycle tracking).
//!
//! This crate contains the order entity, the fixed status transition table,
//! and the search-query contract, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod order;
pub mod query;

pub use order::{Order, OrderStatus, OrderStatusChanged, TrackingEvent};
pub use query::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, OrderSearchInput, OrderSearchQuery, SortDirection, SortField,
};


