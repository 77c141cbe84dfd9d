//! Wishlist Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::is_unique_violation;
use crate::domain::aggregates::WishlistItem;
use crate::{Result, StoreError};

#[derive(sqlx::FromRow)]
struct WishlistRow {
    id: Uuid,
    user_id: String,
    product_id: Uuid,
    added_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistItem {
    fn from(r: WishlistRow) -> Self {
        WishlistItem { id: r.id, user_id: r.user_id, product_id: r.product_id, added_at: r.added_at }
    }
}

#[derive(Debug, Clone)]
pub struct WishlistRepository {
    pool: SqlitePool,
}

impl WishlistRepository {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    pub async fn add(&self, item: &WishlistItem) -> Result<()> {
        let res = sqlx::query("INSERT INTO wishlist_items (id, user_id, product_id, added_at) VALUES (?, ?, ?, ?)")
            .bind(item.id)
            .bind(&item.user_id)
            .bind(item.product_id)
            .bind(item.added_at)
            .execute(&self.pool)
            .await;
        match res {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::validation("Product already in wishlist")),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<WishlistItem>> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            "SELECT * FROM wishlist_items WHERE user_id = ? ORDER BY added_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(WishlistItem::from).collect())
    }

    pub async fn find(&self, user_id: &str, product_id: Uuid) -> Result<Option<WishlistItem>> {
        let row = sqlx::query_as::<_, WishlistRow>("SELECT * FROM wishlist_items WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(WishlistItem::from))
    }

    pub async fn remove(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM wishlist_items WHERE id = ?").bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbConfig};

    #[tokio::test]
    async fn test_wishlist_membership() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        let wishlist = db.wishlist();
        let product = Uuid::now_v7();
        let item = WishlistItem::new("u1", product);
        wishlist.add(&item).await.unwrap();

        let err = wishlist.add(&WishlistItem::new("u1", product)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        assert_eq!(wishlist.find("u1", product).await.unwrap().unwrap().id, item.id);
        assert!(wishlist.find("u2", product).await.unwrap().is_none());
        assert!(wishlist.remove(item.id).await.unwrap());
        assert!(wishlist.list("u1").await.unwrap().is_empty());
    }
}
