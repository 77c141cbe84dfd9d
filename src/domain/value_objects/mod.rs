//! Value Objects for the storefront

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// Money value object.
///
/// The store runs in a single currency, so the amount carries no currency tag.
/// Storage keeps minor units (paise). Derived amounts (discounts, tax) are
/// rounded to whole paise with [`Money::round_cents`] as soon as they are
/// computed, so a priced cart adds up exactly once stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub const fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn from_major(amount: i64) -> Self { Self(Decimal::from(amount)) }
    pub fn from_minor(minor: i64) -> Self { Self(Decimal::new(minor, 2)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_positive(&self) -> bool { self.0 > Decimal::ZERO }

    /// Rounds to two decimal places, half away from zero.
    pub fn round_cents(self) -> Money {
        Money(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Converts to minor units, rounding half away from zero.
    pub fn to_minor(&self) -> Result<i64, MoneyError> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(MoneyError::OutOfRange)
    }

    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }

    /// `self × rate / 100`.
    pub fn percent(&self, rate: Decimal) -> Money { Money(self.0 * rate / Decimal::ONE_HUNDRED) }

    pub fn min(self, other: Money) -> Money { if other < self { other } else { self } }
    pub fn abs(self) -> Money { Money(self.0.abs()) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money { Money(self.0 - rhs.0) }
}

impl Mul<Decimal> for Money {
    type Output = Money;
    fn mul(self, rhs: Decimal) -> Money { Money(self.0 * rhs) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self { Self(amount) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { OutOfRange }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Amount out of range") }
}

/// Coupon code value object. Codes are case-insensitive and stored upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: impl Into<String>) -> Result<Self, CouponCodeError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(CouponCodeError::Empty); }
        if value.len() > 32 { return Err(CouponCodeError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> String { code.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CouponCodeError { Empty, TooLong }
impl std::error::Error for CouponCodeError {}
impl fmt::Display for CouponCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "Coupon code is empty"), Self::TooLong => write!(f, "Coupon code is too long") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_coupon_code_normalized() {
        let code = CouponCode::new("  save10 ").unwrap();
        assert_eq!(code.as_str(), "SAVE10");
        assert_eq!(CouponCode::new("   "), Err(CouponCodeError::Empty));
    }

    #[test]
    fn test_money_minor_units() {
        assert_eq!(Money::new(dec!(499.99)).to_minor().unwrap(), 49999);
        assert_eq!(Money::new(dec!(0.005)).to_minor().unwrap(), 1);
        assert_eq!(Money::from_minor(12345).amount(), dec!(123.45));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_major(500).multiply(2);
        let b = Money::from_major(300);
        assert_eq!([a, b].into_iter().sum::<Money>(), Money::from_major(1300));
        assert_eq!(Money::from_major(1300).percent(dec!(10)), Money::from_major(130));
        assert_eq!(Money::from_major(50).min(Money::from_major(20)), Money::from_major(20));
    }
}
