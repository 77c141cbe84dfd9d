//! HTTP surface.
//!
//! Every response is a JSON object with a `success` flag, an optional
//! `message`, and the payload under a named key (`product`, `cartItems`, ...).

mod cart;
mod contact;
mod coupons;
pub mod error;
pub mod extract;
mod orders;
mod payments;
mod products;
mod reviews;
mod wishlist;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::checkout::CheckoutService;
use crate::db::Database;
use crate::messaging::EventPublisher;
use crate::payment::{PaymentGateway, SignatureVerifier};
use crate::{Result, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub checkout: CheckoutService,
    pub gateway: Arc<dyn PaymentGateway>,
    pub events: EventPublisher,
    pub currency: String,
}

impl AppState {
    pub fn new(
        db: Database,
        gateway: Arc<dyn PaymentGateway>,
        verifier: SignatureVerifier,
        events: EventPublisher,
        currency: impl Into<String>,
    ) -> Self {
        let currency = currency.into();
        let checkout = CheckoutService::new(db.clone(), gateway.clone(), events.clone(), verifier, currency.clone());
        Self { db, checkout, gateway, events, currency }
    }
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        // catalog
        .route("/api/product", get(products::search))
        .route("/api/product/all", get(products::list_all))
        .route("/api/product/featured/list", get(products::featured))
        .route("/api/product/categories/list", get(products::categories))
        .route("/api/product/add", post(products::create))
        .route("/api/product/update/:id", put(products::update))
        .route("/api/product/remove/:id", delete(products::remove))
        .route("/api/product/:id", get(products::get_one))
        // cart
        .route("/api/cart/add", post(cart::add))
        .route("/api/cart/update/:id", put(cart::update))
        .route("/api/cart/remove/:id", delete(cart::remove))
        .route("/api/cart/clear/:user_id", delete(cart::clear))
        .route("/api/cart/:user_id", get(cart::list))
        .route("/api/cart/:user_id/summary", get(cart::summary))
        // coupons
        .route("/api/coupon", get(coupons::list))
        .route("/api/coupon/validate", post(coupons::validate))
        .route("/api/coupon/create", post(coupons::create))
        // checkout and orders
        .route("/api/payment/create-order", post(payments::create_order))
        .route("/api/orders", get(orders::list_all))
        .route("/api/orders/create", post(orders::create))
        .route("/api/orders/status/:id", put(orders::update_status))
        .route("/api/orders/:user_id", get(orders::list_for_user))
        // reviews and wishlist
        .route("/api/review/add", post(reviews::add))
        .route("/api/review/:product_id", get(reviews::list))
        .route("/api/wishlist/add", post(wishlist::add))
        .route("/api/wishlist/remove/:id", delete(wishlist::remove))
        .route("/api/wishlist/check/:user_id/:product_id", get(wishlist::check))
        .route("/api/wishlist/:user_id", get(wishlist::list))
        // contact
        .route("/api/contact", get(contact::list).post(contact::submit))
        .route("/api/contact/unread-count", get(contact::unread_count))
        .route("/api/contact/user/:email", get(contact::list_by_email))
        .route("/api/contact/:id/status", put(contact::set_status))
        .route("/api/contact/:id/reply", put(contact::reply))
        .route("/api/contact/:id", delete(contact::remove))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

async fn health(State(s): State<AppState>) -> impl IntoResponse {
    let database = s.db.health_check().await;
    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(json!({ "status": if database { "healthy" } else { "degraded" }, "service": "opensase-storefront", "database": database })))
}

/// Action words that share a path segment with `:user_id` (`/api/cart/add`
/// next to `/api/cart/:user_id`). A user named after one could never read
/// their own cart, orders or wishlist, so such ids are refused up front.
const RESERVED_USER_IDS: [&str; 7] = ["add", "check", "clear", "create", "remove", "status", "update"];

pub(crate) fn check_user_id(user_id: &str) -> Result<()> {
    if RESERVED_USER_IDS.iter().any(|w| w.eq_ignore_ascii_case(user_id.trim())) {
        return Err(StoreError::validation(format!("userId '{user_id}' is reserved")));
    }
    Ok(())
}

/// Path ids arrive as strings so a malformed one gets the same 400 envelope as any other bad input.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| StoreError::validation(format!("Invalid {what} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_user_ids() {
        for id in ["create", "Update", " clear "] {
            assert!(matches!(check_user_id(id), Err(StoreError::Validation(_))));
        }
        assert!(check_user_id("u1").is_ok());
        assert!(check_user_id("creator").is_ok());
    }
}
