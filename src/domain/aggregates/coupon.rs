//! Coupon Aggregate
//!
//! Evaluation is a pure function of the coupon record, the cart total and the
//! clock reading passed in. Redemption (bumping `used_count`) is the order
//! writer's job and happens inside its transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::value_objects::{CouponCode, Money};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Money,
    pub max_discount: Option<Money>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType { Percentage, Fixed }

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Percentage => "percentage", Self::Fixed => "fixed" }
    }
}

impl FromStr for DiscountType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!("unknown discount type: {other}")),
        }
    }
}

/// What the caller gets back from a successful evaluation. Usage counters stay private.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount: Money,
}

impl Coupon {
    /// Active and inside its validity window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && now <= self.valid_until
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.used_count >= limit)
    }

    pub fn evaluate(&self, cart_total: Money, now: DateTime<Utc>) -> Result<AppliedCoupon, CouponError> {
        if !self.is_live(now) { return Err(CouponError::NotFound); }
        if self.is_exhausted() { return Err(CouponError::Exhausted); }
        if cart_total < self.min_purchase { return Err(CouponError::MinPurchaseNotMet(self.min_purchase)); }

        let discount = match self.discount_type {
            DiscountType::Percentage => {
                let raw = cart_total.percent(self.discount_value);
                self.max_discount.map_or(raw, |cap| raw.min(cap))
            }
            DiscountType::Fixed => Money::new(self.discount_value),
        };

        Ok(AppliedCoupon {
            code: self.code.clone(),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            // A discount never takes the cart below zero.
            discount: discount.min(cart_total).round_cents(),
        })
    }
}

/// Fields an admin supplies when creating a coupon.
#[derive(Clone, Debug)]
pub struct CouponDraft {
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Money,
    pub max_discount: Option<Money>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<u32>,
    pub is_active: bool,
}

impl CouponDraft {
    pub fn into_coupon(self) -> Result<Coupon, CouponError> {
        if self.discount_value <= Decimal::ZERO { return Err(CouponError::Invalid("discountValue must be positive".into())); }
        if self.discount_type == DiscountType::Percentage && self.discount_value > Decimal::ONE_HUNDRED {
            return Err(CouponError::Invalid("percentage discount cannot exceed 100".into()));
        }
        let now = Utc::now();
        let valid_from = self.valid_from.unwrap_or(now);
        if self.valid_until < valid_from { return Err(CouponError::Invalid("validUntil is before validFrom".into())); }
        Ok(Coupon {
            id: Uuid::now_v7(), code: self.code, discount_type: self.discount_type, discount_value: self.discount_value,
            min_purchase: self.min_purchase, max_discount: self.max_discount, valid_from, valid_until: self.valid_until,
            usage_limit: self.usage_limit, used_count: 0, is_active: self.is_active, created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponError { NotFound, Exhausted, MinPurchaseNotMet(Money), Invalid(String) }
impl std::error::Error for CouponError {}
impl fmt::Display for CouponError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Invalid or expired coupon code"),
            Self::Exhausted => write!(f, "Coupon usage limit reached"),
            Self::MinPurchaseNotMet(min) => write!(f, "Minimum purchase of ₹{min} required"),
            Self::Invalid(msg) => write!(f, "Invalid coupon: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon(kind: DiscountType, value: Decimal) -> Coupon {
        CouponDraft {
            code: CouponCode::new("save10").unwrap(), discount_type: kind, discount_value: value,
            min_purchase: Money::ZERO, max_discount: None, valid_from: Some(Utc::now() - Duration::days(1)),
            valid_until: Utc::now() + Duration::days(30), usage_limit: None, is_active: true,
        }.into_coupon().unwrap()
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(DiscountType::Percentage, dec!(10));
        let applied = c.evaluate(Money::from_major(1300), Utc::now()).unwrap();
        assert_eq!(applied.discount, Money::from_major(130));
        assert_eq!(applied.code.as_str(), "SAVE10");
    }

    #[test]
    fn test_percentage_discount_respects_cap() {
        let mut c = coupon(DiscountType::Percentage, dec!(50));
        c.max_discount = Some(Money::from_major(200));
        for total in [500, 1300, 1_000_000] {
            let applied = c.evaluate(Money::from_major(total), Utc::now()).unwrap();
            assert!(applied.discount <= Money::from_major(200));
        }
    }

    #[test]
    fn test_fixed_discount() {
        let c = coupon(DiscountType::Fixed, dec!(50));
        assert_eq!(c.evaluate(Money::from_major(1300), Utc::now()).unwrap().discount, Money::from_major(50));
        // clamped so the total never goes negative
        assert_eq!(c.evaluate(Money::from_major(30), Utc::now()).unwrap().discount, Money::from_major(30));
    }

    #[test]
    fn test_min_purchase() {
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        c.min_purchase = Money::from_major(2000);
        let err = c.evaluate(Money::from_major(1300), Utc::now()).unwrap_err();
        assert_eq!(err, CouponError::MinPurchaseNotMet(Money::from_major(2000)));
        assert!(err.to_string().contains("2000.00"));
    }

    #[test]
    fn test_usage_limit() {
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        c.usage_limit = Some(1);
        c.used_count = 1;
        assert_eq!(c.evaluate(Money::from_major(1300), Utc::now()), Err(CouponError::Exhausted));
    }

    #[test]
    fn test_window_and_active_flag() {
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        assert_eq!(c.evaluate(Money::from_major(100), Utc::now() + Duration::days(31)), Err(CouponError::NotFound));
        assert_eq!(c.evaluate(Money::from_major(100), Utc::now() - Duration::days(2)), Err(CouponError::NotFound));
        c.is_active = false;
        assert_eq!(c.evaluate(Money::from_major(100), Utc::now()), Err(CouponError::NotFound));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let c = coupon(DiscountType::Percentage, dec!(12.5));
        let now = Utc::now();
        let a = c.evaluate(Money::from_major(999), now).unwrap();
        let b = c.evaluate(Money::from_major(999), now).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.discount.amount(), dec!(124.88));
    }
}
