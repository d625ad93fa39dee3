use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use ordertrack_core::{CustomerId, OrderId};
use ordertrack_orders::{OrderSearchQuery, OrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
}

pub async fn register_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterOrderRequest>,
) -> axum::response::Response {
    let order_id = match OrderId::new(body.order_id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let customer_id = match CustomerId::new(body.customer_id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tracking.register(order_id, customer_id, Utc::now()).await {
        Ok(order) => (
            StatusCode::CREATED,
            Json(dto::OrderResponse::from_order(&order)),
        )
            .into_response(),
        Err(e) => errors::tracking_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match OrderId::new(id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tracking.get_by_id(&order_id).await {
        Ok(order) => (StatusCode::OK, Json(dto::OrderResponse::from_order(&order))).into_response(),
        Err(e) => errors::tracking_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let order_id = match OrderId::new(id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let target = match body.status.parse::<OrderStatus>() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .tracking
        .update_status(&order_id, target, &body.note, Utc::now())
        .await
    {
        Ok(order) => (StatusCode::OK, Json(dto::OrderResponse::from_order(&order))).into_response(),
        Err(e) => errors::tracking_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListOrdersParams>,
) -> axum::response::Response {
    let query = match OrderSearchQuery::from_input(params.into_input()) {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tracking.list_orders(&query).await {
        Ok(orders) => {
            let items: Vec<dto::OrderResponse> =
                orders.iter().map(dto::OrderResponse::from_order).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::tracking_error_to_response(e),
    }
}


