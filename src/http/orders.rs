use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::extract::ValidatedJson;
use super::{check_user_id, parse_id, AppState};
use crate::checkout::{OrderLineRequest, PaymentConfirmation, PlaceOrder};
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::Money;
use crate::{Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "userId is required"))]
    user_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "items are required"))]
    items: Vec<OrderItemRequest>,
    total_amount: Option<Decimal>,
    #[serde(default)]
    #[validate(length(min = 1, message = "paymentId is required"))]
    payment_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "razorpayOrderId is required"))]
    razorpay_order_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "razorpaySignature is required"))]
    razorpay_signature: String,
    coupon_code: Option<String>,
}

/// Clients may send `name`/`img` too; those are ignored in favor of the catalog.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(default)]
    product_id: String,
    quantity: Option<u32>,
    price: Option<Decimal>,
}

impl CreateOrderRequest {
    fn into_command(self) -> Result<PlaceOrder> {
        let items = self
            .items
            .into_iter()
            .map(|i| {
                Ok(OrderLineRequest {
                    product_id: parse_id(&i.product_id, "product")?,
                    quantity: i.quantity.ok_or_else(|| StoreError::validation("item quantity is required"))?,
                    price: i.price.map(Money::new).ok_or_else(|| StoreError::validation("item price is required"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PlaceOrder {
            user_id: self.user_id,
            items,
            total_amount: self.total_amount.map(Money::new).ok_or_else(|| StoreError::validation("totalAmount is required"))?,
            payment: PaymentConfirmation {
                payment_id: self.payment_id,
                order_id: self.razorpay_order_id,
                signature: self.razorpay_signature,
            },
            coupon_code: self.coupon_code,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    status: Option<String>,
}

pub async fn create(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<CreateOrderRequest>) -> Result<impl IntoResponse> {
    check_user_id(&req.user_id)?;
    let order = s.checkout.place_order(req.into_command()?).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": "Order created successfully", "order": order }))))
}

pub async fn list_for_user(State(s): State<AppState>, Path(user_id): Path<String>) -> Result<impl IntoResponse> {
    let orders = s.db.orders().list_for_user(&user_id).await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

pub async fn list_all(State(s): State<AppState>) -> Result<impl IntoResponse> {
    let orders = s.db.orders().list_all().await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

pub async fn update_status(
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<StatusRequest>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "order")?;
    let status: OrderStatus = req
        .status
        .ok_or_else(|| StoreError::validation("status is required"))?
        .parse()
        .map_err(StoreError::Validation)?;
    let order = s.checkout.update_order_status(id, status).await?;
    Ok(Json(json!({ "success": true, "message": "Order status updated", "order": order })))
}
