//! Background jobs.

pub mod stale_orders;

pub use stale_orders::{StaleOrderCompletionJob, StaleOrderJobConfig, StaleOrderJobHandle};


