#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use opensase_storefront::domain::aggregates::{Category, ProductDraft};
use opensase_storefront::domain::value_objects::Money;
use opensase_storefront::{
    router, AppState, Database, DbConfig, EventPublisher, GatewayOrder, PaymentGateway, SignatureVerifier, StoreError,
};

pub const KEY_SECRET: &str = "test_key_secret";

/// Gateway double: hands out sequential order ids and remembers them, or fails on demand.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: AtomicUsize,
    pub fail: bool,
    orders: Mutex<HashMap<String, GatewayOrder>>,
}

impl FakeGateway {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> opensase_storefront::Result<GatewayOrder> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(StoreError::PaymentGateway("HTTP 401: Authentication failed".into()));
        }
        let order = GatewayOrder { id: format!("order_fake_{n}"), amount: amount_minor, currency: currency.into(), receipt: Some(receipt.into()) };
        self.orders.lock().unwrap().insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> opensase_storefront::Result<GatewayOrder> {
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| StoreError::PaymentGateway(format!("HTTP 400: The id provided does not exist ({order_id})")))
    }
}

/// Router over an in-memory database, a fake gateway and a known key secret.
pub struct TestApp {
    router: Router,
    pub db: Database,
    pub gateway: Arc<FakeGateway>,
    pub verifier: SignatureVerifier,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(FakeGateway::default()).await
    }

    pub async fn with_gateway(gateway: FakeGateway) -> Self {
        let db = Database::connect(DbConfig::in_memory()).await.expect("in-memory database");
        let gateway = Arc::new(gateway);
        let verifier = SignatureVerifier::new(KEY_SECRET);
        let state = AppState::new(db.clone(), gateway.clone(), verifier.clone(), EventPublisher::disabled(), "INR");
        Self { router: router(state, Duration::from_secs(5)), db, gateway, verifier }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) { self.request(Method::GET, uri, None).await }
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) { self.request(Method::POST, uri, Some(body)).await }
    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) { self.request(Method::PUT, uri, Some(body)).await }
    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) { self.request(Method::DELETE, uri, None).await }

    /// Inserts a product directly and returns its id as a string.
    pub async fn seed_product(&self, name: &str, price: i64) -> String {
        let product = ProductDraft {
            name: name.into(),
            description: format!("{name} for tests"),
            price: Money::from_major(price),
            original_price: None,
            img: format!("/uploads/{}.png", name.to_lowercase()),
            category: Category::Electronics,
            brand: "Acme".into(),
            stock: ProductDraft::DEFAULT_STOCK,
            is_featured: false,
        }
        .into_product();
        self.db.products().insert(&product).await.unwrap();
        product.id.to_string()
    }

    pub async fn seed_coupon(&self, body: Value) {
        let (status, json) = self.post("/api/coupon/create", body).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
    }

    pub async fn add_to_cart(&self, user_id: &str, product_id: &str, quantity: u32) {
        let (status, json) = self
            .post("/api/cart/add", json!({ "userId": user_id, "productId": product_id, "quantity": quantity }))
            .await;
        assert!(status.is_success(), "{json}");
    }

    /// Opens a payment intent through the API and returns the gateway order id.
    pub async fn open_intent(&self, amount: f64) -> String {
        let (status, json) = self.post("/api/payment/create-order", json!({ "amount": amount })).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json["id"].as_str().unwrap().to_string()
    }

    /// Signature the payment widget would return for this pair.
    pub fn sign(&self, razorpay_order_id: &str, payment_id: &str) -> String {
        self.verifier.sign(razorpay_order_id, payment_id).unwrap()
    }
}
