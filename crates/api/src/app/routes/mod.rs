use axum::Router;

pub mod orders;
pub mod system;

/// Router for all order-tracking endpoints.
pub fn router() -> Router {
    Router::new().nest("/api/orders", orders::router())
}


