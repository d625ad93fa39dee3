use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ordertrack_core::OrderId;
use ordertrack_orders::{Order, OrderSearchQuery, OrderStatus, SortDirection, SortField};
use ordertrack_tracking::{OrderStore, StoreError};

/// In-memory order store.
///
/// Intended for tests/dev. Not optimized for performance. Implements the
/// full query contract (filter, sort, page slice) in Rust; the filter
/// predicate itself lives with the query value object.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sort(orders: &mut [Order], query: &OrderSearchQuery) {
        orders.sort_by(|a, b| {
            let ordering = match query.sort_by() {
                SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
                SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
            };
            let ordering = match query.sort_dir() {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            // Deterministic paging for equal timestamps.
            ordering.then_with(|| a.id().cmp(b.id()))
        });
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(orders.get(order_id).cloned())
    }

    async fn save(&self, order: &Order) -> Result<Order, StoreError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        orders.insert(order.id().clone(), order.clone());
        Ok(order.clone())
    }

    async fn find_shipped_before(&self, before: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(orders
            .values()
            .filter(|o| o.status() == OrderStatus::Shipped && o.updated_at() < before)
            .cloned()
            .collect())
    }

    async fn find_by_query(&self, query: &OrderSearchQuery) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let mut matching: Vec<Order> = orders.values().filter(|o| query.matches(o)).cloned().collect();
        drop(orders);

        Self::sort(&mut matching, query);

        let size = query.size() as usize;
        let start = query.page() as usize * size;
        Ok(matching.into_iter().skip(start).take(size).collect())
    }
}
