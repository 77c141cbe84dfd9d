//! Review Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One review per (user, product). Submitting one recomputes the product's rating.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user_id: String,
    pub product_id: Uuid,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: impl Into<String>, product_id: Uuid, rating: u8, comment: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), user_id: user_id.into(), product_id, rating, comment: comment.into(), created_at: Utc::now() }
    }
}
