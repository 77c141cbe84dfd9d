//! Order Repository

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{corrupt, is_unique_violation, to_u32};
use crate::domain::aggregates::{LineItem, Order, OrderStatus, PaymentRef};
use crate::domain::value_objects::{CouponCode, Money};
use crate::{Result, StoreError};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: String,
    subtotal_minor: i64,
    discount_minor: i64,
    tax_minor: i64,
    total_minor: i64,
    coupon_code: Option<String>,
    currency: String,
    status: String,
    payment_id: String,
    razorpay_order_id: String,
    payment_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    order_id: Uuid,
    product_id: Uuid,
    name: String,
    img: String,
    quantity: i64,
    price_minor: i64,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = StoreError;
    fn try_from(r: LineItemRow) -> Result<Self> {
        Ok(LineItem {
            product_id: r.product_id,
            name: r.name,
            img: r.img,
            quantity: to_u32("quantity", r.quantity)?,
            price: Money::from_minor(r.price_minor),
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Result<Order> {
        let coupon_code = self
            .coupon_code
            .map(CouponCode::new)
            .transpose()
            .map_err(|e| corrupt("coupon_code", e))?;
        Ok(Order::restore(
            self.id,
            self.user_id,
            items,
            Money::from_minor(self.subtotal_minor),
            Money::from_minor(self.discount_minor),
            Money::from_minor(self.tax_minor),
            Money::from_minor(self.total_minor),
            coupon_code,
            self.currency,
            self.status.parse().map_err(|e: String| corrupt("status", e))?,
            PaymentRef {
                payment_id: self.payment_id,
                razorpay_order_id: self.razorpay_order_id,
                payment_status: self.payment_status.parse().map_err(|e: String| corrupt("payment_status", e))?,
            },
            self.created_at,
            self.updated_at,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    /// Writes the order header and its line items on the given connection,
    /// normally the checkout transaction. A second order for the same payment
    /// id is rejected by the unique index and surfaces as `DuplicateOrder`.
    pub(crate) async fn insert_with(conn: &mut SqliteConnection, order: &Order) -> Result<()> {
        let payment = order.payment();
        let res = sqlx::query(
            "INSERT INTO orders (id, user_id, subtotal_minor, discount_minor, tax_minor, total_minor, coupon_code, \
             currency, status, payment_id, razorpay_order_id, payment_status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id())
        .bind(order.user_id())
        .bind(order.subtotal().to_minor()?)
        .bind(order.discount().to_minor()?)
        .bind(order.tax().to_minor()?)
        .bind(order.total_amount().to_minor()?)
        .bind(order.coupon_code().map(CouponCode::as_str))
        .bind(order.currency())
        .bind(order.status().as_str())
        .bind(&payment.payment_id)
        .bind(&payment.razorpay_order_id)
        .bind(payment.payment_status.as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *conn)
        .await;

        match res {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(StoreError::DuplicateOrder(payment.payment_id.clone())),
            Err(e) => return Err(e.into()),
        }

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (order_id, position, product_id, name, img, quantity, price_minor) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(order.id())
            .bind(position as i64)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(&item.img)
            .bind(i64::from(item.quantity))
            .bind(item.price.to_minor()?)
            .execute(&mut *conn)
            .await?;
        }

        debug!(order_id = %order.id(), items = order.items().len(), "Order written");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let Some(row) = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let mut items = self.load_items(&[row.id]).await?;
        let lines = items.remove(&row.id).unwrap_or_default();
        row.into_order(lines).map(Some)
    }

    pub async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM orders WHERE payment_id = ?")
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;
        match id {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    pub async fn list_all(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Persists a status change made on the aggregate. The write only lands
    /// if the stored status is still `from`.
    pub async fn update_status(&self, order: &Order, from: OrderStatus) -> Result<()> {
        let res = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(order.status().as_str())
            .bind(order.updated_at())
            .bind(order.id())
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::Conflict("Order status was changed by another request".into()));
        }
        Ok(())
    }

    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.load_items(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    /// Line items for a batch of orders, in their original order.
    async fn load_items(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<LineItem>>> {
        let mut grouped: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        if order_ids.is_empty() { return Ok(grouped); }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT order_id, product_id, name, img, quantity, price_minor FROM order_items WHERE order_id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in order_ids { sep.push_bind(*id); }
        qb.push(") ORDER BY order_id, position");

        for row in qb.build_query_as::<LineItemRow>().fetch_all(&self.pool).await? {
            let order_id = row.order_id;
            grouped.entry(order_id).or_default().push(LineItem::try_from(row)?);
        }
        Ok(grouped)
    }
}
