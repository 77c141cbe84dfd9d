//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::Money;

/// Tax charged on the discounted subtotal.
pub const TAX_RATE: Decimal = dec!(0.10);

/// One (user, product) line in a cart. `product_price` is the price captured
/// when the product was first added and is never re-read from the catalog.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: String,
    pub product_id: Uuid,
    pub product_price: Money,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(user_id: impl Into<String>, product_id: Uuid, product_price: Money, quantity: u32) -> Self {
        Self { id: Uuid::now_v7(), user_id: user_id.into(), product_id, product_price, quantity, created_at: Utc::now() }
    }

    pub fn line_total(&self) -> Money { self.product_price.multiply(self.quantity) }
}

/// A cart line joined with the live product, if it still exists.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Option<Product>,
}

/// Σ(productPrice × quantity). Lines whose product was deleted still count.
pub fn subtotal<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> Money {
    items.into_iter().map(CartItem::line_total).sum()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl CartTotals {
    /// Shipping is always free; tax is `TAX_RATE` of the discounted subtotal.
    /// Discount and tax are rounded to paise first and the total is built from
    /// the rounded parts, so `total == subtotal - discount + tax` holds exactly.
    pub fn compute(subtotal: Money, discount: Money) -> Self {
        let subtotal = subtotal.round_cents();
        let discount = discount.round_cents();
        let taxable = subtotal - discount;
        let tax = (taxable * TAX_RATE).round_cents();
        Self { subtotal, discount, tax, shipping: Money::ZERO, total: taxable + tax }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, qty: u32) -> CartItem { CartItem::new("u1", Uuid::now_v7(), Money::from_major(price), qty) }

    #[test]
    fn test_cart_pricing() {
        let items = vec![item(500, 2), item(300, 1)];
        let sub = subtotal(&items);
        assert_eq!(sub, Money::from_major(1300));
        let totals = CartTotals::compute(sub, Money::from_major(130));
        assert_eq!(totals.tax, Money::from_major(117));
        assert_eq!(totals.total, Money::from_major(1287));
        assert_eq!(totals.shipping, Money::ZERO);
    }

    #[test]
    fn test_total_is_eleven_tenths_of_discounted_subtotal() {
        for (sub, disc) in [(1300, 0), (999, 49), (1, 1), (25_000, 2_500)] {
            let t = CartTotals::compute(Money::from_major(sub), Money::from_major(disc));
            assert_eq!(t.total.amount(), dec!(1.1) * Decimal::from(sub - disc));
        }
    }

    #[test]
    fn test_fractional_discount_rounds_to_paise() {
        // 12.5% of 999 is 124.875
        let t = CartTotals::compute(Money::from_major(999), Money::from_major(999).percent(dec!(12.5)));
        assert_eq!(t.discount.amount(), dec!(124.88));
        assert_eq!(t.tax.amount(), dec!(87.41));
        assert_eq!(t.total.amount(), dec!(961.53));
        assert_eq!(t.total, t.subtotal - t.discount + t.tax);

        for (price, rate) in [(dec!(999.99), dec!(12.5)), (dec!(333.33), dec!(7.25)), (dec!(0.05), dec!(33.3))] {
            let sub = Money::new(price);
            let t = CartTotals::compute(sub, sub.percent(rate));
            assert_eq!(t.total, t.subtotal - t.discount + t.tax);
            assert_eq!(t.total, t.total.round_cents());
            assert_eq!(t.tax, t.tax.round_cents());
        }
    }

    #[test]
    fn test_empty_cart() {
        let t = CartTotals::compute(subtotal(&Vec::<CartItem>::new()), Money::ZERO);
        assert_eq!(t.total, Money::ZERO);
    }
}
