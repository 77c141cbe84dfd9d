use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::extract::ValidatedJson;
use super::{check_user_id, parse_id, AppState};
use crate::domain::aggregates::CartItem;
use crate::domain::value_objects::Money;
use crate::repository::cart::CartUpsert;
use crate::{Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "userId is required"))]
    user_id: String,
    #[serde(default)]
    product_id: String,
    /// Price shown to the customer. Falls back to the catalog price.
    product_price: Option<Decimal>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(required(message = "quantity is required"), range(min = 1, message = "quantity must be at least 1"))]
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UserParam {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    coupon: Option<String>,
}

pub async fn add(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<AddToCartRequest>) -> Result<impl IntoResponse> {
    check_user_id(&req.user_id)?;
    let product_id = parse_id(&req.product_id, "product")?;
    let price = match req.product_price {
        Some(p) => Money::new(p).round_cents(),
        None => s.db.products().get(product_id).await?.ok_or_else(|| StoreError::not_found("Product"))?.price,
    };
    if !price.is_positive() {
        return Err(StoreError::validation("productPrice must be positive"));
    }

    let item = CartItem::new(req.user_id, product_id, price, req.quantity.unwrap_or(1));
    Ok(match s.db.carts().add(&item).await? {
        CartUpsert::Created(item) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "message": "Product added to cart", "cartItem": item })),
        ),
        CartUpsert::Updated(item) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Product quantity updated in cart", "cartItem": item })),
        ),
    })
}

pub async fn list(State(s): State<AppState>, Path(user_id): Path<String>) -> Result<impl IntoResponse> {
    let summary = s.checkout.cart_summary(&user_id, None).await?;
    Ok(Json(json!({ "success": true, "cartItems": summary.items, "subtotal": summary.totals.subtotal })))
}

pub async fn summary(
    State(s): State<AppState>,
    Path(user_id): Path<String>,
    Query(p): Query<SummaryParams>,
) -> Result<impl IntoResponse> {
    let summary = s.checkout.cart_summary(&user_id, p.coupon.as_deref()).await?;
    Ok(Json(json!({ "success": true, "summary": summary })))
}

/// Line ids are only touched on behalf of their owner; `?userId=` scopes the write.
pub async fn update(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Query(owner): Query<UserParam>,
    ValidatedJson(req): ValidatedJson<UpdateQuantityRequest>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "cart item")?;
    let user_id = owner.user_id.ok_or_else(|| StoreError::validation("userId is required"))?;
    let quantity = req.quantity.ok_or_else(|| StoreError::validation("quantity is required"))?;
    let item = s.db.carts().set_quantity(&user_id, id, quantity).await?.ok_or_else(|| StoreError::not_found("Cart item"))?;
    Ok(Json(json!({ "success": true, "message": "Cart updated", "cartItem": item })))
}

pub async fn remove(State(s): State<AppState>, Path(id): Path<String>, Query(owner): Query<UserParam>) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "cart item")?;
    let user_id = owner.user_id.ok_or_else(|| StoreError::validation("userId is required"))?;
    if !s.db.carts().remove(&user_id, id).await? {
        return Err(StoreError::not_found("Cart item"));
    }
    Ok(Json(json!({ "success": true, "message": "Item removed from cart" })))
}

pub async fn clear(State(s): State<AppState>, Path(user_id): Path<String>) -> Result<impl IntoResponse> {
    let removed = s.db.carts().clear(&user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Cart cleared", "removed": removed })))
}
