//! `ordertrack-infra` — adapters behind the tracking service's ports.
//!
//! Order stores (in-memory, Postgres), the bus-backed notification
//! publisher, optional Redis pub/sub transport, and the stale-order batch
//! job.

pub mod event_bus;
pub mod jobs;
pub mod publisher;
pub mod store;

pub use jobs::{StaleOrderCompletionJob, StaleOrderJobConfig, StaleOrderJobHandle};
pub use publisher::BusOrderEventPublisher;
pub use store::{InMemoryOrderStore, PostgresOrderStore};


