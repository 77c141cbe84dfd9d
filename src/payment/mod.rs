//! Payment gateway seam.
//!
//! The storefront never captures money itself. It asks the gateway for a
//! remote order (the payment intent), the customer pays in the hosted widget,
//! and the widget's `{payment_id, order_id, signature}` triple comes back to
//! the order writer, which checks it with [`SignatureVerifier`]. The signature
//! does not cover the amount, so the writer also reads the remote order back
//! with [`PaymentGateway::fetch_order`] and matches its amount to the order total.

pub mod razorpay;
pub mod signature;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::value_objects::Money;
use crate::{Result, StoreError};

pub use razorpay::RazorpayGateway;
pub use signature::SignatureVerifier;

/// Remote order as reported by the gateway. `amount` is in minor units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<GatewayOrder>;

    async fn fetch_order(&self, order_id: &str) -> Result<GatewayOrder>;
}

/// What the client needs to open the payment widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Per-call receipt tag. Millisecond resolution; two calls in the same
/// millisecond share a receipt, which the gateway tolerates.
pub fn receipt() -> String {
    format!("rcpt_{}", Utc::now().timestamp_millis())
}

/// Converts `amount` to minor units and opens a remote order for it.
/// Nothing is stored locally.
pub async fn create_payment_intent(gateway: &dyn PaymentGateway, amount: Money, currency: &str) -> Result<PaymentIntent> {
    if !amount.is_positive() {
        return Err(StoreError::InvalidAmount);
    }
    let amount_minor = amount.to_minor().map_err(|_| StoreError::InvalidAmount)?;
    if amount_minor <= 0 {
        return Err(StoreError::InvalidAmount);
    }

    let receipt = receipt();
    let order = gateway.create_order(amount_minor, currency, &receipt).await?;
    info!(intent_id = %order.id, amount_minor, currency, "Payment intent created");

    Ok(PaymentIntent {
        id: order.id,
        amount: order.amount,
        currency: order.currency,
        receipt: order.receipt.unwrap_or(receipt),
    })
}
