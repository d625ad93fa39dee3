//! `ordertrack-events` — event publication mechanics.
//!
//! Transport-agnostic pub/sub used to fan order notifications out to
//! external consumers. Domain event types live with their domain
//! (`ordertrack-orders`); this crate only knows about envelopes and buses.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};


