use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::extract::ValidatedJson;
use super::AppState;
use crate::domain::value_objects::Money;
use crate::payment::create_payment_intent;
use crate::{Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    amount: Option<Decimal>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    currency: Option<String>,
}

/// Opens a gateway order. The body mirrors the gateway's own order object so
/// the widget can be configured straight from it.
pub async fn create_order(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<CreatePaymentRequest>) -> Result<impl IntoResponse> {
    let amount = req.amount.map(Money::new).ok_or(StoreError::InvalidAmount)?;
    let currency = req.currency.as_deref().unwrap_or(&s.currency).to_uppercase();
    let intent = create_payment_intent(s.gateway.as_ref(), amount, &currency).await?;
    Ok(Json(json!({
        "success": true,
        "id": intent.id,
        "amount": intent.amount,
        "currency": intent.currency,
        "receipt": intent.receipt,
    })))
}
