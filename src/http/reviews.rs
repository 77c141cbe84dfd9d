use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::extract::ValidatedJson;
use super::{parse_id, AppState};
use crate::domain::aggregates::Review;
use crate::{Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "userId is required"))]
    user_id: String,
    #[serde(default)]
    product_id: String,
    #[validate(required(message = "rating is required"), range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    rating: Option<u8>,
    #[serde(default)]
    #[validate(length(min = 1, message = "comment is required"))]
    comment: String,
}

pub async fn add(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<ReviewRequest>) -> Result<impl IntoResponse> {
    let product_id = parse_id(&req.product_id, "product")?;
    let rating = req.rating.ok_or_else(|| StoreError::validation("rating is required"))?;
    let review = Review::new(req.user_id, product_id, rating, req.comment);
    s.db.reviews().submit(&review).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": "Review added successfully", "review": review }))))
}

pub async fn list(State(s): State<AppState>, Path(product_id): Path<String>) -> Result<impl IntoResponse> {
    let product_id = parse_id(&product_id, "product")?;
    let reviews = s.db.reviews().list_for_product(product_id).await?;
    Ok(Json(json!({ "success": true, "reviews": reviews })))
}
