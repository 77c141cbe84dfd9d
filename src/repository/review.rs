//! Review Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{corrupt, is_unique_violation, to_u32, ProductRepository};
use crate::domain::aggregates::product::average_rating;
use crate::domain::aggregates::Review;
use crate::{Result, StoreError};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: String,
    product_id: Uuid,
    rating: i64,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;
    fn try_from(r: ReviewRow) -> Result<Self> {
        Ok(Review {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            rating: u8::try_from(r.rating).map_err(|_| corrupt("rating", r.rating))?,
            comment: r.comment,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    /// Stores the review and refreshes the product's rating and review count
    /// in the same transaction.
    pub async fn submit(&self, review: &Review) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?")
            .bind(review.product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("Product"));
        }

        let res = sqlx::query(
            "INSERT INTO reviews (id, user_id, product_id, rating, comment, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(review.id)
        .bind(&review.user_id)
        .bind(review.product_id)
        .bind(i64::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await;
        match res {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::validation("You have already reviewed this product"))
            }
            Err(e) => return Err(e.into()),
        }

        let ratings: Vec<i64> = sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = ?")
            .bind(review.product_id)
            .fetch_all(&mut *tx)
            .await?;
        let ratings = ratings
            .into_iter()
            .map(|r| u8::try_from(r).map_err(|_| corrupt("rating", r)))
            .collect::<Result<Vec<u8>>>()?;
        let count = to_u32("review_count", ratings.len() as i64)?;
        ProductRepository::set_rating(&mut tx, review.product_id, average_rating(&ratings), count).await?;

        tx.commit().await?;
        debug!(product_id = %review.product_id, reviews = count, "Review stored");
        Ok(())
    }

    pub async fn list_for_product(&self, product_id: Uuid) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT * FROM reviews WHERE product_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Review::try_from).collect()
    }
}
