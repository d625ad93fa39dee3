use std::sync::Arc;

use ordertrack_api::app::{build_app, services::AppServices};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod) over in-memory wiring, bound to an
        // ephemeral port.
        let app = build_app(Arc::new(AppServices::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(
    client: &reqwest::Client,
    base_url: &str,
    order_id: &str,
    customer_id: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/api/orders", base_url))
        .json(&json!({"orderId": order_id, "customerId": customer_id}))
        .send()
        .await
        .unwrap()
}

async fn update_status(
    client: &reqwest::Client,
    base_url: &str,
    order_id: &str,
    status: &str,
    note: &str,
) -> reqwest::Response {
    client
        .put(format!("{}/api/orders/{}/status", base_url, order_id))
        .json(&json!({"status": status, "note": note}))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_lifecycle_register_track_update() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "o-1", "c-1").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["id"], "o-1");
    assert_eq!(body["customerId"], "c-1");
    assert_eq!(body["status"], "CREATED");
    assert_eq!(body["history"].as_array().unwrap().len(), 1);
    assert_eq!(body["history"][0]["note"], "Order created");
    assert_eq!(body["createdAt"], body["updatedAt"]);

    for status in ["PACKED", "SHIPPED", "DELIVERED"] {
        let res = update_status(&client, &srv.base_url, "o-1", status, "scan").await;
        assert_eq!(res.status(), StatusCode::OK, "transition to {status}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["status"], status);
    }

    // Delivered is terminal: going back to PACKED is a rule violation.
    let res = update_status(&client, &srv.base_url, "o-1", "PACKED", "oops").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invariant_violation");

    let res = client
        .get(format!("{}/api/orders/o-1", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history.last().unwrap()["status"], "DELIVERED");
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "o-dup", "c-1").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = register(&client, &srv.base_url, "o-dup", "c-2").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");

    // The first registration's data is unchanged.
    let res = client
        .get(format!("{}/api/orders/o-dup", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["customerId"], "c-1");
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/orders/no-such-order", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_are_rejected_up_front() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "  ", "c-1").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    register(&client, &srv.base_url, "o-2", "c-1").await;

    let res = update_status(&client, &srv.base_url, "o-2", "TELEPORTED", "note").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = update_status(&client, &srv.base_url, "o-2", "PACKED", "   ").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_sort_and_validate() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "ord-1", "acme-east").await;
    register(&client, &srv.base_url, "ord-2", "acme-west").await;
    register(&client, &srv.base_url, "po-3", "acme-east").await;
    update_status(&client, &srv.base_url, "ord-2", "PACKED", "Packed").await;
    update_status(&client, &srv.base_url, "ord-2", "SHIPPED", "Shipped").await;

    // Case-insensitive status filter, lowercase on purpose.
    let res = client
        .get(format!("{}/api/orders?status=shipped", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "ord-2");

    // Substring filters compose, matched case-insensitively.
    let res = client
        .get(format!(
            "{}/api/orders?orderId=ORD&customerId=east",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "ord-1");

    // Default sort: updatedAt descending - the shipped order floats first.
    let res = client
        .get(format!("{}/api/orders", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["id"], "ord-2");

    // Unknown status never reaches the store.
    let res = client
        .get(format!("{}/api/orders?status=BOGUS", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Malformed timestamp filter.
    let res = client
        .get(format!("{}/api/orders?updatedFrom=yesterday", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_pagination_slices_the_sorted_page() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for i in 0..5 {
        register(&client, &srv.base_url, &format!("o-{i}"), "c-1").await;
    }

    let res = client
        .get(format!(
            "{}/api/orders?sortBy=createdAt&sortDir=asc&page=1&size=2",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "o-2");
    assert_eq!(items[1]["id"], "o-3");

    // Oversized page sizes clamp instead of erroring.
    let res = client
        .get(format!("{}/api/orders?size=10000", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
}


