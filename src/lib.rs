//! OpenSASE Storefront
//!
//! Self-hosted storefront backend: catalog, cart, coupons, Razorpay checkout
//! and order management behind a JSON API.
//!
//! ## Features
//! - Product catalog with search, featured listing and review ratings
//! - Per-user carts with price snapshots
//! - Coupon evaluation and atomic redemption
//! - Payment intents through Razorpay with server-side signature checks
//! - Idempotent order placement with a guarded status lifecycle
//! - Wishlists and customer contact messages

pub mod checkout;
pub mod config;
pub mod db;
pub mod domain;
pub mod http;
pub mod messaging;
pub mod payment;
pub mod repository;

use thiserror::Error;

use crate::domain::aggregates::{CouponError, OrderError, OrderStatus, ProductError};
use crate::domain::value_objects::{CouponCodeError, Money, MoneyError};

pub use crate::checkout::{CartSummary, CheckoutService, OrderLineRequest, PaymentConfirmation, PlaceOrder};
pub use crate::config::AppConfig;
pub use crate::db::{Database, DbConfig};
pub use crate::http::{router, AppState};
pub use crate::messaging::EventPublisher;
pub use crate::payment::{GatewayOrder, PaymentGateway, PaymentIntent, RazorpayGateway, SignatureVerifier};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid or expired coupon code")]
    CouponNotFound,

    #[error("Coupon usage limit reached")]
    CouponExhausted,

    #[error("Minimum purchase of ₹{0} required")]
    MinPurchaseNotMet(Money),

    #[error("Payment signature verification failed")]
    InvalidPaymentSignature,

    #[error("Paid amount {paid} does not match the order total {expected}")]
    PaymentAmountMismatch { paid: Money, expected: Money },

    #[error("Cannot change order status from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("An order already exists for payment {0}")]
    DuplicateOrder(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: impl Into<String>) -> Self { Self::NotFound(entity.into()) }
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

impl From<CouponError> for StoreError {
    fn from(e: CouponError) -> Self {
        match e {
            CouponError::NotFound => Self::CouponNotFound,
            CouponError::Exhausted => Self::CouponExhausted,
            CouponError::MinPurchaseNotMet(min) => Self::MinPurchaseNotMet(min),
            CouponError::Invalid(msg) => Self::Validation(msg),
        }
    }
}

impl From<OrderError> for StoreError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidTransition { from, to } => Self::InvalidStatusTransition { from, to },
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<ProductError> for StoreError {
    fn from(e: ProductError) -> Self { Self::Validation(e.to_string()) }
}

impl From<MoneyError> for StoreError {
    fn from(e: MoneyError) -> Self { Self::Validation(e.to_string()) }
}

impl From<CouponCodeError> for StoreError {
    fn from(e: CouponCodeError) -> Self { Self::Validation(e.to_string()) }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}
