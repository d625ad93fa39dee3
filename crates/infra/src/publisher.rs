//! Bus-backed implementation of the notification port.

use ordertrack_events::{EventBus, EventEnvelope};
use ordertrack_orders::{Order, OrderStatusChanged};
use ordertrack_tracking::{OrderEventPublisher, PublishError};

/// Publishes `orders.status_changed` envelopes onto an event bus.
///
/// The bus decides the transport (in-memory fan-out, Redis pub/sub); this
/// adapter only maps the order into its notification snapshot.
#[derive(Debug)]
pub struct BusOrderEventPublisher<B> {
    bus: B,
}

impl<B> BusOrderEventPublisher<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B> OrderEventPublisher for BusOrderEventPublisher<B>
where
    B: EventBus<EventEnvelope<OrderStatusChanged>>,
{
    fn publish_status_changed(&self, order: &Order) -> Result<(), PublishError> {
        let envelope = EventEnvelope::wrap(OrderStatusChanged::for_order(order));
        self.bus
            .publish(envelope)
            .map_err(|e| PublishError(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ordertrack_core::{CustomerId, OrderId};
    use ordertrack_events::InMemoryEventBus;
    use std::sync::Arc;

    #[test]
    fn publishes_a_status_changed_envelope() {
        let bus = Arc::new(InMemoryEventBus::<EventEnvelope<OrderStatusChanged>>::new());
        let subscription = bus.subscribe();
        let publisher = BusOrderEventPublisher::new(bus);

        let order = Order::create(
            OrderId::new("o-1").unwrap(),
            CustomerId::new("c-1").unwrap(),
            Utc::now(),
        );
        publisher.publish_status_changed(&order).unwrap();

        let envelope = subscription.try_recv().unwrap();
        assert_eq!(envelope.event_type(), "orders.status_changed");
        assert_eq!(envelope.payload().order_id, *order.id());
        assert_eq!(envelope.payload().status, "CREATED");
        assert_eq!(envelope.occurred_at(), order.updated_at());
    }
}


