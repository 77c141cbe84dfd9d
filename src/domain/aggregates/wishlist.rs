//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::product::Product;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: Uuid,
    pub user_id: String,
    pub product_id: Uuid,
    pub added_at: DateTime<Utc>,
}

impl WishlistItem {
    pub fn new(user_id: impl Into<String>, product_id: Uuid) -> Self {
        Self { id: Uuid::now_v7(), user_id: user_id.into(), product_id, added_at: Utc::now() }
    }
}

/// A wishlist entry joined with its (still existing) product.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    #[serde(flatten)]
    pub item: WishlistItem,
    pub product: Product,
}
