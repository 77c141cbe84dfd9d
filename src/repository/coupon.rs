//! Coupon Repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use super::{corrupt, is_unique_violation, to_u32};
use crate::domain::aggregates::Coupon;
use crate::domain::value_objects::{CouponCode, Money};
use crate::{Result, StoreError};

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    discount_type: String,
    discount_value: String,
    min_purchase_minor: i64,
    max_discount_minor: Option<i64>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    usage_limit: Option<i64>,
    used_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = StoreError;
    fn try_from(r: CouponRow) -> Result<Self> {
        Ok(Coupon {
            id: r.id,
            code: CouponCode::new(r.code).map_err(|e| corrupt("code", e))?,
            discount_type: r.discount_type.parse().map_err(|e| corrupt("discount_type", e))?,
            discount_value: Decimal::from_str(&r.discount_value).map_err(|e| corrupt("discount_value", e))?,
            min_purchase: Money::from_minor(r.min_purchase_minor),
            max_discount: r.max_discount_minor.map(Money::from_minor),
            valid_from: r.valid_from,
            valid_until: r.valid_until,
            usage_limit: r.usage_limit.map(|l| to_u32("usage_limit", l)).transpose()?,
            used_count: to_u32("used_count", r.used_count)?,
            is_active: r.is_active,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    pub async fn insert(&self, c: &Coupon) -> Result<()> {
        let res = sqlx::query(
            "INSERT INTO coupons (id, code, discount_type, discount_value, min_purchase_minor, max_discount_minor, \
             valid_from, valid_until, usage_limit, used_count, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(c.id)
        .bind(c.code.as_str())
        .bind(c.discount_type.as_str())
        .bind(c.discount_value.to_string())
        .bind(c.min_purchase.to_minor()?)
        .bind(c.max_discount.map(|m| m.to_minor()).transpose()?)
        .bind(c.valid_from)
        .bind(c.valid_until)
        .bind(c.usage_limit.map(i64::from))
        .bind(i64::from(c.used_count))
        .bind(c.is_active)
        .bind(c.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => {
                debug!(code = %c.code, "Coupon created");
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(format!("Coupon {} already exists", c.code))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>> {
        sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Coupon::try_from)
            .transpose()
    }

    /// Same lookup, on the checkout transaction's connection.
    pub(crate) async fn find_by_code_in(conn: &mut SqliteConnection, code: &CouponCode) -> Result<Option<Coupon>> {
        sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = ?")
            .bind(code.as_str())
            .fetch_optional(conn)
            .await?
            .map(Coupon::try_from)
            .transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Coupon>> {
        let rows = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Coupon::try_from).collect()
    }

    /// Consumes one use. The limit check and the increment are a single
    /// statement; `false` means the coupon was exhausted in the meantime.
    pub(crate) async fn redeem(conn: &mut SqliteConnection, id: Uuid) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE coupons SET used_count = used_count + 1 \
             WHERE id = ? AND (usage_limit IS NULL OR used_count < usage_limit)",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbConfig};
    use crate::domain::aggregates::{CouponDraft, DiscountType};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn draft(code: &str, limit: Option<u32>) -> CouponDraft {
        CouponDraft {
            code: CouponCode::new(code).unwrap(), discount_type: DiscountType::Percentage, discount_value: dec!(12.5),
            min_purchase: Money::from_major(100), max_discount: Some(Money::from_major(250)), valid_from: None,
            valid_until: Utc::now() + Duration::days(7), usage_limit: limit, is_active: true,
        }
    }

    #[tokio::test]
    async fn test_coupon_round_trip() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        let coupons = db.coupons();
        let c = draft("welcome", None).into_coupon().unwrap();
        coupons.insert(&c).await.unwrap();

        let found = coupons.find_by_code(&CouponCode::new("WELCOME").unwrap()).await.unwrap().unwrap();
        assert_eq!(found.discount_value, dec!(12.5));
        assert_eq!(found.max_discount, Some(Money::from_major(250)));
        assert_eq!(found.usage_limit, None);

        let dup = coupons.insert(&draft("Welcome", None).into_coupon().unwrap()).await.unwrap_err();
        assert!(matches!(dup, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_redeem_stops_at_limit() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        let c = draft("once", Some(1)).into_coupon().unwrap();
        db.coupons().insert(&c).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(CouponRepository::redeem(&mut conn, c.id).await.unwrap());
        assert!(!CouponRepository::redeem(&mut conn, c.id).await.unwrap());
        drop(conn);

        let found = db.coupons().find_by_code(&c.code).await.unwrap().unwrap();
        assert_eq!(found.used_count, 1);
        assert!(found.is_exhausted());
    }
}
