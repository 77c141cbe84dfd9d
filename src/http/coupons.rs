use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::extract::ValidatedJson;
use super::AppState;
use crate::domain::aggregates::{CouponDraft, DiscountType};
use crate::domain::value_objects::{CouponCode, Money};
use crate::{Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "code is required"))]
    code: String,
    cart_total: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 32, message = "code must be 1 to 32 characters"))]
    code: String,
    discount_type: Option<DiscountType>,
    discount_value: Option<Decimal>,
    min_purchase: Option<Decimal>,
    max_discount: Option<Decimal>,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    usage_limit: Option<u32>,
    is_active: Option<bool>,
}

impl CreateCouponRequest {
    fn into_draft(self) -> Result<CouponDraft> {
        Ok(CouponDraft {
            code: CouponCode::new(self.code)?,
            discount_type: self.discount_type.ok_or_else(|| StoreError::validation("discountType is required"))?,
            discount_value: self.discount_value.ok_or_else(|| StoreError::validation("discountValue is required"))?,
            min_purchase: self.min_purchase.map_or(Money::ZERO, Money::new),
            max_discount: self.max_discount.map(Money::new),
            valid_from: self.valid_from,
            valid_until: self.valid_until.ok_or_else(|| StoreError::validation("validUntil is required"))?,
            usage_limit: self.usage_limit,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

pub async fn validate(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<ValidateCouponRequest>) -> Result<impl IntoResponse> {
    let cart_total = req.cart_total.ok_or_else(|| StoreError::validation("cartTotal is required"))?;
    let applied = s.checkout.validate_coupon(&req.code, Money::new(cart_total)).await?;
    Ok(Json(json!({ "success": true, "coupon": applied })))
}

pub async fn create(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<CreateCouponRequest>) -> Result<impl IntoResponse> {
    let coupon = req.into_draft()?.into_coupon()?;
    s.db.coupons().insert(&coupon).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": "Coupon created successfully", "coupon": coupon }))))
}

pub async fn list(State(s): State<AppState>) -> Result<impl IntoResponse> {
    let coupons = s.db.coupons().list_all().await?;
    Ok(Json(json!({ "success": true, "coupons": coupons })))
}
