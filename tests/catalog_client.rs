mod common;

use std::time::Duration;

use serde_json::json;
use tagmatch::config::CatalogConfig;
use tagmatch::{CatalogClient, Error};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, max_retries: u32) -> CatalogConfig {
    CatalogConfig {
        base_url: server.uri(),
        products_path: "/products".to_string(),
        timeout: Duration::from_millis(500),
        max_retries,
        retry_delay: Duration::from_millis(5),
        ..CatalogConfig::default()
    }
}

#[tokio::test]
async fn fetches_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(common::products())))
        .expect(1)
        .mount(&server)
        .await;

    let client = CatalogClient::new(&config(&server, 0)).unwrap();
    let items = client.fetch_catalog().await.unwrap();

    assert_eq!(items, common::products());
}

#[tokio::test]
async fn retries_server_errors_then_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = CatalogClient::new(&config(&server, 2)).unwrap();
    let err = client.fetch_catalog().await.unwrap_err();

    assert!(matches!(err, Error::CatalogUnavailable { attempts: 3 }));
}

#[tokio::test]
async fn does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = CatalogClient::new(&config(&server, 3)).unwrap();
    let err = client.fetch_catalog().await.unwrap_err();

    assert!(matches!(err, Error::CatalogStatus { status: 404 }));
}

#[tokio::test]
async fn rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&config(&server, 0)).unwrap();
    let err = client.fetch_catalog().await.unwrap_err();

    assert!(matches!(err, Error::InvalidCatalog { .. }));
}

#[tokio::test]
async fn rejects_duplicate_ids() {
    let server = MockServer::start().await;
    let body = json!([
        { "id": 1, "name": "A", "category": "x", "preferences": [], "features": [] },
        { "id": 1, "name": "B", "category": "x", "preferences": [], "features": [] }
    ]);
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = CatalogClient::new(&config(&server, 0)).unwrap();
    let err = client.fetch_catalog().await.unwrap_err();

    assert!(matches!(err, Error::InvalidCatalog { .. }));
}

#[tokio::test]
async fn times_out_slow_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = CatalogClient::new(&config(&server, 0)).unwrap();
    let err = client.fetch_catalog().await.unwrap_err();

    // a lone attempt that times out is reported as unavailable
    assert!(matches!(err, Error::CatalogUnavailable { attempts: 1 }));
}
