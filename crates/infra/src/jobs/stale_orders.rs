//! Periodic stale-order completion job.
//!
//! The job is nothing more than a scheduled caller of
//! `OrderTrackingService::auto_complete_stale_shipped`; batch semantics
//! (snapshot, per-order isolation) live in the service.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info};

use ordertrack_tracking::{OrderTrackingService, default_staleness};

/// Job schedule configuration.
#[derive(Debug, Clone)]
pub struct StaleOrderJobConfig {
    /// How often the batch runs.
    pub run_interval: Duration,
    /// How long an order may sit in SHIPPED before being completed.
    pub staleness: chrono::Duration,
}

impl Default for StaleOrderJobConfig {
    fn default() -> Self {
        Self {
            run_interval: Duration::from_secs(30 * 60),
            staleness: default_staleness(),
        }
    }
}

/// Handle to a running job; dropping it does NOT stop the task, call
/// [`StaleOrderJobHandle::shutdown`] for a graceful stop.
#[derive(Debug)]
pub struct StaleOrderJobHandle {
    shutdown: watch::Sender<bool>,
    join: tokio::task::JoinHandle<()>,
}

impl StaleOrderJobHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.join.await;
    }
}

pub struct StaleOrderCompletionJob;

impl StaleOrderCompletionJob {
    /// Spawn the job on the current tokio runtime.
    ///
    /// The first run fires immediately; subsequent runs follow
    /// `config.run_interval`. A run that overlaps a missed tick is not
    /// replayed (ticks are skipped, not queued).
    pub fn spawn(
        service: Arc<OrderTrackingService>,
        config: StaleOrderJobConfig,
    ) -> StaleOrderJobHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.run_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service
                            .auto_complete_stale_shipped(Utc::now(), config.staleness)
                            .await
                        {
                            Ok(completed) => {
                                info!(completed, "stale order completion run finished");
                            }
                            Err(err) => {
                                error!(error = %err, "stale order completion run failed");
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        StaleOrderJobHandle {
            shutdown: shutdown_tx,
            join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::BusOrderEventPublisher;
    use crate::store::InMemoryOrderStore;
    use chrono::Duration as ChronoDuration;
    use ordertrack_core::{CustomerId, OrderId};
    use ordertrack_events::{EventEnvelope, InMemoryEventBus};
    use ordertrack_orders::{Order, OrderStatus, OrderStatusChanged};
    use ordertrack_tracking::OrderStore;

    #[tokio::test]
    async fn job_completes_stale_orders_on_its_schedule() {
        let store = Arc::new(InMemoryOrderStore::new());
        let bus = Arc::new(InMemoryEventBus::<EventEnvelope<OrderStatusChanged>>::new());
        let publisher = Arc::new(BusOrderEventPublisher::new(bus));
        let service = Arc::new(OrderTrackingService::new(store.clone(), publisher));

        let now = Utc::now();
        let mut order = Order::create(
            OrderId::new("o-stale").unwrap(),
            CustomerId::new("c-1").unwrap(),
            now - ChronoDuration::days(12),
        );
        order
            .transition_to(OrderStatus::Packed, now - ChronoDuration::days(11), "Packed")
            .unwrap();
        order
            .transition_to(OrderStatus::Shipped, now - ChronoDuration::days(10), "Shipped")
            .unwrap();
        store.save(&order).await.unwrap();

        let handle = StaleOrderCompletionJob::spawn(
            service,
            StaleOrderJobConfig {
                run_interval: Duration::from_millis(10),
                ..Default::default()
            },
        );

        // First tick fires immediately; give it a few periods to land.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        let completed = store
            .find_by_id(&OrderId::new("o-stale").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.status(), OrderStatus::Delivered);
    }
}


