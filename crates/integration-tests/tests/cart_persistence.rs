//! Cart persistence across restarts.
//!
//! Builds the storefront twice over the same cart directory. The second app
//! only shares the directory and the session cookie with the first.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use barbaro_core::ProductId;
use barbaro_storefront::cart::{CART_NAMESPACE, CartStore};
use barbaro_storefront::catalog::Catalog;
use barbaro_storefront::config::StorefrontConfig;
use barbaro_storefront::routes;
use barbaro_storefront::state::AppState;
use barbaro_storefront::storage::{FileStore, KeyValueStore};

const CATALOG: &str = r#"
products:
  - { id: whey, name: Whey Isolate, price: "49.90", stock: 10 }
  - { id: bar, name: Protein Bar, price: "2.50" }
"#;

fn app(dir: &Path) -> Router {
    let catalog = Catalog::from_yaml_str(CATALOG).unwrap();
    let storage = Arc::new(FileStore::open(dir).unwrap());
    routes::app(AppState::new(StorefrontConfig::default(), catalog, storage))
}

async fn call(app: &Router, request: Request<Body>) -> (Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (cookie, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = app(dir.path());
    let request = Request::post("/cart/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "product_id": "whey", "quantity": 2 }).to_string(),
        ))
        .unwrap();
    let (cookie, _) = call(&first, request).await;
    let cookie = cookie.unwrap();
    drop(first);

    let second = app(dir.path());
    let request = Request::get("/cart")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (_, body) = call(&second, request).await;

    assert_eq!(body["items"][0]["id"], "whey");
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["subtotal"], "$99.80");
}

#[tokio::test]
async fn test_unknown_cookie_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let request = Request::get("/cart")
        .header(header::COOKIE, "barbaro_session=bogus")
        .body(Body::empty())
        .unwrap();
    let (_, body) = call(&app, request).await;
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_default_cart_written_as_items_document() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let catalog = Catalog::from_yaml_str(CATALOG).unwrap();

    let mut store = CartStore::open_default(Arc::clone(&storage));
    store.add_item(catalog.get(&ProductId::new("bar")).cloned().unwrap(), 3);
    assert!(store.is_persisted());

    let raw = storage.get(CART_NAMESPACE).unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["items"][0]["quantity"], 3);
    assert_eq!(value["items"][0]["product"]["id"], "bar");

    let reopened = CartStore::open_default(storage);
    assert_eq!(reopened.total_items(), 3);
    assert_eq!(reopened.total_price().to_string(), "7.50");
}
