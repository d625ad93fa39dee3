use std::sync::Arc;

use ordertrack_api::app::{build_app, services};
use ordertrack_infra::{StaleOrderCompletionJob, StaleOrderJobConfig};

#[tokio::main]
async fn main() {
    ordertrack_observability::init();

    let services = Arc::new(services::build_services().await);

    // Periodic batch completion of stale shipped orders.
    let _job = StaleOrderCompletionJob::spawn(
        services.tracking.clone(),
        StaleOrderJobConfig::default(),
    );

    let app = build_app(services);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}


