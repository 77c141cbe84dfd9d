//! Razorpay Orders API adapter.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{instrument, warn};

use super::{GatewayOrder, PaymentGateway};
use crate::{Result, StoreError};

#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

impl RazorpayGateway {
    pub fn new(base_url: impl Into<String>, key_id: impl Into<String>, key_secret: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }

    pub fn key_id(&self) -> &str { &self.key_id }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self))]
    async fn create_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<GatewayOrder> {
        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderRequest { amount: amount_minor, currency, receipt })
            .send()
            .await
            .map_err(|e| StoreError::PaymentGateway(format!("request failed: {e}")))?;

        read_order(response).await
    }

    #[instrument(skip(self))]
    async fn fetch_order(&self, order_id: &str) -> Result<GatewayOrder> {
        let response = self
            .client
            .get(format!("{}/v1/orders/{}", self.base_url, order_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| StoreError::PaymentGateway(format!("request failed: {e}")))?;

        read_order(response).await
    }
}

async fn read_order(response: reqwest::Response) -> Result<GatewayOrder> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, body = %body, "Razorpay rejected request");
        return Err(StoreError::PaymentGateway(format!("HTTP {status}: {body}")));
    }

    response
        .json::<GatewayOrder>()
        .await
        .map_err(|e| StoreError::PaymentGateway(format!("unreadable response: {e}")))
}
