//! Infrastructure wiring: order store, event bus, tracking service.

use std::sync::Arc;

use ordertrack_events::{EventEnvelope, InMemoryEventBus};
use ordertrack_infra::{BusOrderEventPublisher, InMemoryOrderStore, PostgresOrderStore};
use ordertrack_orders::OrderStatusChanged;
use ordertrack_tracking::{OrderEventPublisher, OrderStore, OrderTrackingService};

/// Services shared by the HTTP handlers (and the background job).
#[derive(Clone)]
pub struct AppServices {
    pub tracking: Arc<OrderTrackingService>,
}

impl AppServices {
    /// Fully in-memory wiring (tests, local dev without a database).
    pub fn in_memory() -> Self {
        let store: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
        Self {
            tracking: Arc::new(OrderTrackingService::new(store, in_memory_publisher())),
        }
    }
}

/// Build services from the environment.
///
/// `DATABASE_URL` selects the Postgres store (schema is ensured at
/// startup); otherwise everything stays in memory. With the `redis`
/// feature, `REDIS_URL` selects the Redis pub/sub notification transport.
pub async fn build_services() -> AppServices {
    let store: Arc<dyn OrderStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to postgres");
            let store = PostgresOrderStore::new(pool);
            store
                .ensure_schema()
                .await
                .expect("failed to ensure orders schema");
            tracing::info!("using postgres order store");
            Arc::new(store)
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set; using in-memory order store");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    AppServices {
        tracking: Arc::new(OrderTrackingService::new(store, build_publisher())),
    }
}

#[cfg(feature = "redis")]
fn build_publisher() -> Arc<dyn OrderEventPublisher> {
    use ordertrack_infra::event_bus::RedisPubSubEventBus;

    if let Ok(url) = std::env::var("REDIS_URL") {
        match RedisPubSubEventBus::new(&url, "orders.status_changed") {
            Ok(bus) => {
                tracing::info!("using redis pub/sub notification transport");
                return Arc::new(BusOrderEventPublisher::new(Arc::new(bus)));
            }
            Err(e) => {
                tracing::warn!(error = ?e, "redis unavailable; falling back to in-memory bus");
            }
        }
    }
    in_memory_publisher()
}

#[cfg(not(feature = "redis"))]
fn build_publisher() -> Arc<dyn OrderEventPublisher> {
    in_memory_publisher()
}

fn in_memory_publisher() -> Arc<dyn OrderEventPublisher> {
    let bus = Arc::new(InMemoryEventBus::<EventEnvelope<OrderStatusChanged>>::new());
    Arc::new(BusOrderEventPublisher::new(bus))
}


