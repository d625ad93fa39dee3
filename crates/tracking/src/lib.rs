//! `ordertrack-tracking` — order tracking application service.
//!
//! Orchestrates register / get / update-status / list / batch stale
//! completion against outbound ports; adapters live in `ordertrack-infra`.

pub mod ports;
pub mod service;

pub use ports::{OrderEventPublisher, OrderStore, PublishError, StoreError};
pub use service::{
    DEFAULT_STALENESS_DAYS, OrderTrackingService, TrackingError, default_staleness,
};


