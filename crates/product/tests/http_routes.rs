mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use common::Harness;
use http_body_util::BodyExt;
use product::{domain::adjustment::UnderflowPolicy, handler::product_routes};
use serde_json::{Value, json};
use tower::ServiceExt;

fn router(harness: &Harness) -> Router {
    let (router, _) = product_routes(harness.query.clone()).split_for_parts();
    router
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

fn harness() -> Harness {
    Harness::new(&[("IPHONE_15", 5), ("AIRPODS", 0)], UnderflowPolicy::Reject)
}

#[tokio::test]
async fn availability_answers_in_request_order() {
    let body = json!([
        { "skuCode": "IPHONE_15", "quantity": 2 },
        { "skuCode": "AIRPODS", "quantity": 1 }
    ]);

    let (status, body) = send(
        router(&harness()),
        Method::POST,
        "/api/products/availability",
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "productAvailabilityList": [
                { "skuCode": "IPHONE_15", "available": true },
                { "skuCode": "AIRPODS", "available": false }
            ]
        })
    );
}

#[tokio::test]
async fn availability_of_unknown_sku_returns_404() {
    let body = json!([{ "skuCode": "GHOST", "quantity": 1 }]);

    let (status, body) = send(
        router(&harness()),
        Method::POST,
        "/api/products/availability",
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("GHOST"));
}

#[tokio::test]
async fn non_positive_quantity_returns_400() {
    let body = json!([{ "skuCode": "IPHONE_15", "quantity": 0 }]);

    let (status, _) = send(
        router(&harness()),
        Method::POST,
        "/api/products/availability",
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_lookup_by_sku() {
    let (status, body) = send(router(&harness()), Method::GET, "/api/products/IPHONE_15", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skuCode"], "IPHONE_15");
    assert_eq!(body["quantity"], 5);

    let (status, _) = send(router(&harness()), Method::GET, "/api/products/GHOST", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
