//! Raw HTTP surface: status codes, error bodies and admin endpoints

use reqwest::StatusCode;
use sandboxdb::server::{serve, LatencyConfig, ServerConfig};
use sandboxdb::wire::ErrorBody;
use sandboxdb::Storage;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

async fn start_server(latency: LatencyConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        latency,
        ..ServerConfig::default()
    };

    tokio::spawn(async move { serve(listener, &config, Arc::new(Storage::in_memory())).await });
    format!("http://{}", addr)
}

/// Server with database `test` and increment table `items`.
async fn provision() -> (String, reqwest::Client) {
    let base = start_server(LatencyConfig::none()).await;
    let http = reqwest::Client::new();

    let response = http.put(format!("{}/test", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = http
        .put(format!("{}/test/items", base))
        .json(&json!({"id": {"type": "increment"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    (base, http)
}

async fn error_body(response: reqwest::Response) -> ErrorBody {
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_error_body_shape() {
    let (base, http) = provision().await;

    let response = http.put(format!("{}/test", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "statusCode": 409,
            "error": "Conflict",
            "message": "Database exists",
            "code": "database_exists"
        })
    );

    let response = http
        .get(format!("{}/test/missing/document/x1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(response).await.message, "Unknown table");
}

#[tokio::test]
async fn test_insert_answers_ids() {
    let (base, http) = provision().await;

    let response = http
        .post(format!("{}/test/items/document", base))
        .json(&json!([{"a": 1}, {"id": "named", "a": 2}, {"a": 3}]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ids: Vec<String> = response.json().await.unwrap();
    assert_eq!(ids, vec!["1", "named", "2"]);

    let response = http
        .post(format!("{}/test/items/count", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.json::<u64>().await.unwrap(), 3);
}

#[tokio::test]
async fn test_bad_document_payloads_are_unprocessable() {
    let (base, http) = provision().await;

    for payload in [json!(42), json!([1, 2]), json!({"id": 5}), json!({"id": "has space"})] {
        let response = http
            .post(format!("{}/test/items/document", base))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", payload);
    }

    // Updates require an id.
    let response = http
        .patch(format!("{}/test/items/document", base))
        .json(&json!({"a": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_validation_errors() {
    let (base, http) = provision().await;

    let response = http
        .post(format!("{}/test/items/document?replace=maybe", base))
        .json(&json!({"a": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code.as_deref(), Some("validation"));

    let response = http
        .post(format!("{}/test/items/document?upsert=true", base))
        .json(&json!({"a": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http
        .put(format!("{}/test/radix", base))
        .json(&json!({"id": {"type": "increment", "radix": 63}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http
        .put(format!("{}/test/nopolicy", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = http
        .get(format!("{}/test/items/document/a-b", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_accepts_empty_and_null_criteria() {
    let (base, http) = provision().await;
    http.post(format!("{}/test/items/document", base))
        .json(&json!([{"a": 1}, {"a": 2}]))
        .send()
        .await
        .unwrap();

    let empty = http
        .post(format!("{}/test/items/query", base))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.json::<Vec<Value>>().await.unwrap().len(), 2);

    let null = http
        .post(format!("{}/test/items/query", base))
        .json(&Value::Null)
        .send()
        .await
        .unwrap();
    assert_eq!(null.json::<Vec<Value>>().await.unwrap().len(), 2);

    let array = http
        .post(format!("{}/test/items/query", base))
        .json(&json!([1]))
        .send()
        .await
        .unwrap();
    assert_eq!(array.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (base, http) = provision().await;

    let health: Value = http
        .get(format!("{}/_health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["version"], sandboxdb::VERSION);
    assert_eq!(health["databases"], 1);

    let metrics = http
        .get(format!("{}/_metrics", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("sandboxdb_writes_total"));
}

#[tokio::test]
async fn test_latency_is_injected_per_access() {
    let base = start_server(LatencyConfig {
        read: Duration::from_millis(20),
        write: Duration::from_millis(120),
    })
    .await;
    let http = reqwest::Client::new();

    let start = Instant::now();
    http.put(format!("{}/test", base)).send().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(120));

    let start = Instant::now();
    let response = http.get(format!("{}/_dbs", base)).send().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(response.json::<Vec<String>>().await.unwrap(), vec!["test"]);
}
