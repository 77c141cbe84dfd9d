use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::extract::ValidatedJson;
use super::{check_user_id, parse_id, AppState};
use crate::domain::aggregates::{WishlistEntry, WishlistItem};
use crate::{Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "User ID and Product ID are required"))]
    user_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "User ID and Product ID are required"))]
    product_id: String,
}

pub async fn add(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<WishlistRequest>) -> Result<impl IntoResponse> {
    check_user_id(&req.user_id)?;
    let product_id = parse_id(&req.product_id, "product")?;
    let item = WishlistItem::new(req.user_id, product_id);
    s.db.wishlist().add(&item).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": "Added to wishlist", "wishlistItem": item }))))
}

/// Entries whose product has since been deleted are left out.
pub async fn list(State(s): State<AppState>, Path(user_id): Path<String>) -> Result<impl IntoResponse> {
    let items = s.db.wishlist().list(&user_id).await?;
    let ids: Vec<_> = items.iter().map(|i| i.product_id).collect();
    let mut products = s.db.products().get_many(&ids).await?;
    let wishlist: Vec<WishlistEntry> = items
        .into_iter()
        .filter_map(|item| products.remove(&item.product_id).map(|product| WishlistEntry { item, product }))
        .collect();
    Ok(Json(json!({ "success": true, "wishlist": wishlist })))
}

pub async fn remove(State(s): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "wishlist item")?;
    if !s.db.wishlist().remove(id).await? {
        return Err(StoreError::not_found("Wishlist item"));
    }
    Ok(Json(json!({ "success": true, "message": "Removed from wishlist" })))
}

pub async fn check(State(s): State<AppState>, Path((user_id, product_id)): Path<(String, String)>) -> Result<impl IntoResponse> {
    let product_id = parse_id(&product_id, "product")?;
    let item = s.db.wishlist().find(&user_id, product_id).await?;
    Ok(Json(json!({ "success": true, "inWishlist": item.is_some(), "wishlistItemId": item.map(|i| i.id) })))
}
