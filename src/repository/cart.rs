//! Cart Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::to_u32;
use crate::domain::aggregates::CartItem;
use crate::domain::value_objects::Money;
use crate::Result;

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    user_id: String,
    product_id: Uuid,
    product_price_minor: i64,
    quantity: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = crate::StoreError;
    fn try_from(r: CartItemRow) -> Result<Self> {
        Ok(CartItem {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            product_price: Money::from_minor(r.product_price_minor),
            quantity: to_u32("quantity", r.quantity)?,
            created_at: r.created_at,
        })
    }
}

/// Result of adding a product to a cart.
#[derive(Debug, Clone)]
pub enum CartUpsert {
    Created(CartItem),
    /// The product was already in the cart; quantities were summed and the
    /// originally captured price kept.
    Updated(CartItem),
}

impl CartUpsert {
    pub fn item(&self) -> &CartItem {
        match self { Self::Created(i) | Self::Updated(i) => i }
    }

    pub fn into_item(self) -> CartItem {
        match self { Self::Created(i) | Self::Updated(i) => i }
    }

    pub fn is_created(&self) -> bool { matches!(self, Self::Created(_)) }
}

#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    /// Inserts the line or bumps the quantity of the existing (user, product)
    /// line in one statement, so concurrent adds cannot create duplicates.
    pub async fn add(&self, item: &CartItem) -> Result<CartUpsert> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "INSERT INTO cart_items (id, user_id, product_id, product_price_minor, quantity, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity \
             RETURNING *",
        )
        .bind(item.id)
        .bind(&item.user_id)
        .bind(item.product_id)
        .bind(item.product_price.to_minor()?)
        .bind(i64::from(item.quantity))
        .bind(item.created_at)
        .fetch_one(&self.pool)
        .await?;

        let stored = CartItem::try_from(row)?;
        debug!(user_id = %stored.user_id, product_id = %stored.product_id, quantity = stored.quantity, "Cart line saved");
        Ok(if stored.id == item.id { CartUpsert::Created(stored) } else { CartUpsert::Updated(stored) })
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT * FROM cart_items WHERE user_id = ? ORDER BY created_at, rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CartItem::try_from).collect()
    }

    /// Sets the quantity of a line the user owns. `None` when no such line exists.
    pub async fn set_quantity(&self, user_id: &str, item_id: Uuid, quantity: u32) -> Result<Option<CartItem>> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "UPDATE cart_items SET quantity = ? WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(i64::from(quantity))
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CartItem::try_from).transpose()
    }

    pub async fn remove(&self, user_id: &str, item_id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM cart_items WHERE id = ? AND user_id = ?")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Empties the cart. Returns the number of lines removed.
    pub async fn clear(&self, user_id: &str) -> Result<u64> {
        let res = sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        debug!(user_id, removed = res.rows_affected(), "Cart cleared");
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbConfig};

    async fn repo() -> CartRepository {
        Database::connect(DbConfig::in_memory()).await.unwrap().carts()
    }

    #[tokio::test]
    async fn test_add_merges_same_product() {
        let carts = repo().await;
        let product = Uuid::now_v7();
        let first = carts.add(&CartItem::new("u1", product, Money::from_major(500), 2)).await.unwrap();
        assert!(first.is_created());

        // later add carries a new price; the captured one wins
        let second = carts.add(&CartItem::new("u1", product, Money::from_major(450), 1)).await.unwrap();
        assert!(!second.is_created());
        let merged = second.into_item();
        assert_eq!(merged.id, first.item().id);
        assert_eq!(merged.quantity, 3);
        assert_eq!(merged.product_price, Money::from_major(500));
        assert_eq!(carts.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lines_are_scoped_to_user() {
        let carts = repo().await;
        let line = carts.add(&CartItem::new("u1", Uuid::now_v7(), Money::from_major(10), 1)).await.unwrap().into_item();
        assert!(carts.set_quantity("u2", line.id, 5).await.unwrap().is_none());
        assert!(!carts.remove("u2", line.id).await.unwrap());
        assert_eq!(carts.set_quantity("u1", line.id, 5).await.unwrap().unwrap().quantity, 5);
        assert!(carts.list("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let carts = repo().await;
        for _ in 0..3 {
            carts.add(&CartItem::new("u1", Uuid::now_v7(), Money::from_major(10), 1)).await.unwrap();
        }
        carts.add(&CartItem::new("u2", Uuid::now_v7(), Money::from_major(10), 1)).await.unwrap();
        assert_eq!(carts.clear("u1").await.unwrap(), 3);
        assert!(carts.list("u1").await.unwrap().is_empty());
        assert_eq!(carts.list("u2").await.unwrap().len(), 1);
    }
}
