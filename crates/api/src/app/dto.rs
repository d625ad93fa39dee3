use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ordertrack_orders::{Order, OrderSearchInput, TrackingEvent};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOrderRequest {
    pub order_id: String,
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub note: String,
}

/// Raw list filters exactly as they arrive on the query string; the domain
/// normalizer owns validation and clamping.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersParams {
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<String>,
    pub updated_from: Option<String>,
    pub updated_to: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl ListOrdersParams {
    pub fn into_input(self) -> OrderSearchInput {
        OrderSearchInput {
            order_id: self.order_id,
            customer_id: self.customer_id,
            status: self.status,
            updated_from: self.updated_from,
            updated_to: self.updated_to,
            page: self.page,
            size: self.size,
            sort_by: self.sort_by,
            sort_dir: self.sort_dir,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEventResponse {
    pub status: String,
    pub occurred_at: DateTime<Utc>,
    pub note: String,
}

impl TrackingEventResponse {
    fn from_event(event: &TrackingEvent) -> Self {
        Self {
            status: event.status.clone(),
            occurred_at: event.occurred_at,
            note: event.note.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: Vec<TrackingEventResponse>,
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            history: order
                .history()
                .iter()
                .map(TrackingEventResponse::from_event)
                .collect(),
        }
    }
}


