//! Order tracking application service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use ordertrack_core::{CustomerId, DomainError, OrderId};
use ordertrack_orders::{Order, OrderSearchQuery, OrderStatus};

use crate::ports::{OrderEventPublisher, OrderStore, StoreError};

/// How long an order may sit in SHIPPED before the batch job completes it.
pub const DEFAULT_STALENESS_DAYS: i64 = 7;

/// Note recorded on auto-completed orders.
const AUTO_COMPLETE_NOTE: &str = "Auto-complete by batch job";

pub fn default_staleness() -> Duration {
    Duration::days(DEFAULT_STALENESS_DAYS)
}

/// Error surfaced by service operations.
///
/// Domain errors propagate unmodified from the point of detection; store
/// errors pass through opaquely. Publish failures are deliberately absent -
/// notification is best-effort (see [`OrderTrackingService`]).
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates the order lifecycle against the store and publisher ports.
///
/// Stateless between calls; safe to share (`Arc`) and invoke concurrently.
/// Calls on the same order id may interleave - the service does not
/// serialize them, per-document atomicity is the store's concern.
pub struct OrderTrackingService {
    store: Arc<dyn OrderStore>,
    publisher: Arc<dyn OrderEventPublisher>,
}

impl OrderTrackingService {
    pub fn new(store: Arc<dyn OrderStore>, publisher: Arc<dyn OrderEventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Register a new order.
    ///
    /// The duplicate check is a plain load-by-id immediately before the
    /// save: a benign race window exists and is accepted (this is not a
    /// multi-writer safe upsert).
    pub async fn register(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Order, TrackingError> {
        if self.store.find_by_id(&order_id).await?.is_some() {
            return Err(DomainError::conflict(format!("order already exists: {order_id}")).into());
        }

        let order = Order::create(order_id, customer_id, now);
        let saved = self.store.save(&order).await?;
        self.publish_best_effort(&saved);

        info!(order_id = %saved.id(), "order registered");
        Ok(saved)
    }

    pub async fn get_by_id(&self, order_id: &OrderId) -> Result<Order, TrackingError> {
        self.store
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Apply one status transition and persist the result.
    ///
    /// Propagates not-found from the load and the business-rule violation
    /// from an illegal transition; nothing is persisted in either case.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, TrackingError> {
        if note.trim().is_empty() {
            return Err(DomainError::validation("note must not be blank").into());
        }

        let mut order = self.get_by_id(order_id).await?;
        order.transition_to(target, now, note)?;

        let saved = self.store.save(&order).await?;
        self.publish_best_effort(&saved);

        info!(order_id = %saved.id(), status = %saved.status(), "order status updated");
        Ok(saved)
    }

    /// Page of orders matching the normalized query.
    pub async fn list_orders(&self, query: &OrderSearchQuery) -> Result<Vec<Order>, TrackingError> {
        Ok(self.store.find_by_query(query).await?)
    }

    /// Transition every order that has sat in SHIPPED longer than
    /// `staleness` to DELIVERED.
    ///
    /// Works off a snapshot fetched once. Each order is processed
    /// independently: an order that fails (it raced past SHIPPED since the
    /// snapshot, or its save failed) is logged and skipped, never aborting
    /// the rest. The returned count covers completions that were actually
    /// persisted.
    pub async fn auto_complete_stale_shipped(
        &self,
        now: DateTime<Utc>,
        staleness: Duration,
    ) -> Result<usize, TrackingError> {
        let threshold = now - staleness;
        let stale = self.store.find_shipped_before(threshold).await?;
        let candidates = stale.len();

        let mut completed = 0usize;
        for mut order in stale {
            if let Err(err) = order.transition_to(OrderStatus::Delivered, now, AUTO_COMPLETE_NOTE) {
                error!(order_id = %order.id(), error = %err, "skipping stale order: transition rejected");
                continue;
            }
            match self.store.save(&order).await {
                Ok(saved) => {
                    self.publish_best_effort(&saved);
                    completed += 1;
                }
                Err(err) => {
                    error!(order_id = %order.id(), error = %err, "skipping stale order: save failed");
                }
            }
        }

        info!(candidates, completed, "stale shipped orders auto-completed");
        Ok(completed)
    }

    /// Best-effort notification: the save already committed, so a publish
    /// failure is logged and swallowed, never returned.
    fn publish_best_effort(&self, order: &Order) {
        if let Err(err) = self.publisher.publish_status_changed(order) {
            warn!(order_id = %order.id(), error = %err, "status-changed notification failed");
        }
    }
}
