//! Outbound ports the tracking service is written (and tested) against.
//!
//! Adapters live in `ordertrack-infra`; the service only ever sees these
//! contracts. Store errors are opaque infrastructure failures - the service
//! propagates them without retrying or interpreting them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use ordertrack_core::OrderId;
use ordertrack_orders::{Order, OrderSearchQuery};

/// Order persistence failure (backend-specific detail flattened to text).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record failed entity invariant checks on rehydration.
    #[error("corrupt order record: {0}")]
    Corrupt(String),
}

/// Document-style order store.
///
/// Implementations must guarantee per-document atomicity for `save` (upsert
/// by id); the service performs no cross-document transactions on top.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Load one order by id; `None` when it does not exist.
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Upsert by id, returning the persisted order.
    async fn save(&self, order: &Order) -> Result<Order, StoreError>;

    /// All orders with status SHIPPED and `updated_at` strictly before
    /// `before`, in no particular order.
    async fn find_shipped_before(&self, before: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;

    /// The page of orders matching `query`, sorted per its sort field and
    /// direction and sliced per its page/size.
    async fn find_by_query(&self, query: &OrderSearchQuery) -> Result<Vec<Order>, StoreError>;
}

#[async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        (**self).find_by_id(order_id).await
    }

    async fn save(&self, order: &Order) -> Result<Order, StoreError> {
        (**self).save(order).await
    }

    async fn find_shipped_before(&self, before: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        (**self).find_shipped_before(before).await
    }

    async fn find_by_query(&self, query: &OrderSearchQuery) -> Result<Vec<Order>, StoreError> {
        (**self).find_by_query(query).await
    }
}

/// Notification publish failure.
#[derive(Debug, Error)]
#[error("notification publish failed: {0}")]
pub struct PublishError(pub String);

/// Fire-and-forget status-changed notification sink.
///
/// Publication happens after a successful save and is best-effort: a
/// failure here must never undo or mask the save.
pub trait OrderEventPublisher: Send + Sync {
    fn publish_status_changed(&self, order: &Order) -> Result<(), PublishError>;
}

impl<P> OrderEventPublisher for Arc<P>
where
    P: OrderEventPublisher + ?Sized,
{
    fn publish_status_changed(&self, order: &Order) -> Result<(), PublishError> {
        (**self).publish_status_changed(order)
    }
}


