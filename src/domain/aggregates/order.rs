//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::aggregates::cart::CartTotals;
use crate::domain::value_objects::{CouponCode, Money};
use crate::domain::events::{DomainEvent, OrderEvent};

/// A price-frozen snapshot of a checkout. Name, image and price are copied
/// from the catalog at creation so the order stays renderable after the
/// product changes or disappears.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    user_id: String,
    items: Vec<LineItem>,
    subtotal: Money,
    discount: Money,
    tax: Money,
    total_amount: Money,
    coupon_code: Option<CouponCode>,
    currency: String,
    status: OrderStatus,
    #[serde(flatten)]
    payment: PaymentRef,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem { pub product_id: Uuid, pub name: String, pub img: String, pub quantity: u32, pub price: Money }

impl LineItem {
    pub fn total(&self) -> Money { self.price.multiply(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRef {
    pub payment_id: String,
    pub razorpay_order_id: String,
    pub payment_status: PaymentStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Completed, Failed, Refunded }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool { self.allowed_next().contains(&next) }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Completed => "completed", Self::Failed => "failed", Self::Refunded => "refunded" }
    }
}

impl FromStr for OrderStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Order {
    /// Builds a confirmed, paid order. The payment has already been verified by the caller.
    pub fn place(
        user_id: impl Into<String>,
        items: Vec<LineItem>,
        totals: CartTotals,
        coupon_code: Option<CouponCode>,
        currency: &str,
        payment_id: impl Into<String>,
        razorpay_order_id: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let subtotal: Money = items.iter().map(LineItem::total).sum();
        if subtotal != totals.subtotal { return Err(OrderError::SubtotalMismatch); }
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::now_v7(), user_id: user_id.into(), items, subtotal, discount: totals.discount,
            tax: totals.tax, total_amount: totals.total, coupon_code, currency: currency.to_string(),
            status: OrderStatus::Confirmed,
            payment: PaymentRef { payment_id: payment_id.into(), razorpay_order_id: razorpay_order_id.into(), payment_status: PaymentStatus::Completed },
            created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: order.id, user_id: order.user_id.clone(), total: order.total_amount,
        }));
        Ok(order)
    }

    /// Rebuilds an order from storage without raising events.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid, user_id: String, items: Vec<LineItem>, subtotal: Money, discount: Money, tax: Money,
        total_amount: Money, coupon_code: Option<CouponCode>, currency: String, status: OrderStatus,
        payment: PaymentRef, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, user_id, items, subtotal, discount, tax, total_amount, coupon_code, currency, status, payment, created_at, updated_at, events: vec![] }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn subtotal(&self) -> Money { self.subtotal }
    pub fn discount(&self) -> Money { self.discount }
    pub fn tax(&self) -> Money { self.tax }
    pub fn total_amount(&self) -> Money { self.total_amount }
    pub fn coupon_code(&self) -> Option<&CouponCode> { self.coupon_code.as_ref() }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment(&self) -> &PaymentRef { &self.payment }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        let from = self.status;
        self.status = next;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, from, to: next }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError { NoItems, SubtotalMismatch, InvalidTransition { from: OrderStatus, to: OrderStatus } }
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "Order has no items"),
            Self::SubtotalMismatch => write!(f, "Order subtotal does not match its items"),
            Self::InvalidTransition { from, to } => write!(f, "Cannot move order from {from} to {to}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: u32) -> LineItem {
        LineItem { product_id: Uuid::now_v7(), name: "Widget".into(), img: "/w.png".into(), quantity, price: Money::from_major(price) }
    }

    fn placed() -> Order {
        let items = vec![line(500, 2), line(300, 1)];
        let totals = CartTotals::compute(Money::from_major(1300), Money::ZERO);
        Order::place("u1", items, totals, None, "INR", "pay_1", "order_1").unwrap()
    }

    #[test]
    fn test_order_placement() {
        let mut order = placed();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.payment().payment_status, PaymentStatus::Completed);
        assert_eq!(order.subtotal(), Money::from_major(1300));
        assert_eq!(order.total_amount(), Money::from_major(1430));
        assert_eq!(order.take_events().len(), 1);
    }

    #[test]
    fn test_order_rejects_mismatched_totals() {
        let totals = CartTotals::compute(Money::from_major(999), Money::ZERO);
        assert_eq!(Order::place("u1", vec![line(500, 2)], totals, None, "INR", "p", "o").unwrap_err(), OrderError::SubtotalMismatch);
        let empty = CartTotals::compute(Money::ZERO, Money::ZERO);
        assert_eq!(Order::place("u1", vec![], empty, None, "INR", "p", "o").unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn test_order_workflow() {
        let mut order = placed();
        order.take_events();
        order.transition_to(OrderStatus::Processing).unwrap();
        order.transition_to(OrderStatus::Shipped).unwrap();
        order.transition_to(OrderStatus::Delivered).unwrap();
        assert_eq!(order.take_events().len(), 3);
        let err = order.transition_to(OrderStatus::Processing).unwrap_err();
        assert_eq!(err, OrderError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Processing });
    }

    #[test]
    fn test_transition_table() {
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
    }
}
