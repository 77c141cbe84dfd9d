//! Checkout: cart pricing with coupons, and the order writer.
//!
//! `place_order` is the only multi-step write in the service. The payment
//! signature is checked before anything touches the database, and a retry for
//! an already recorded payment is answered with `DuplicateOrder` before any
//! pricing runs. The amount paid at the gateway must match the computed total.
//! Coupon redemption, the order header and its line items then commit
//! together, and the cart is emptied afterwards.

use chrono::Utc;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::domain::aggregates::cart::subtotal;
use crate::domain::aggregates::{AppliedCoupon, CartLine, CartTotals, LineItem, Order, OrderStatus};
use crate::domain::value_objects::{CouponCode, Money};
use crate::messaging::EventPublisher;
use crate::payment::{PaymentGateway, SignatureVerifier};
use crate::repository::{CouponRepository, OrderRepository};
use crate::{Result, StoreError};

/// One requested line: quantity and the unit price the customer saw.
#[derive(Clone, Debug)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: Money,
}

/// What the payment widget hands back after a successful payment.
#[derive(Clone, Debug)]
pub struct PaymentConfirmation {
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
}

#[derive(Clone, Debug)]
pub struct PlaceOrder {
    pub user_id: String,
    pub items: Vec<OrderLineRequest>,
    pub total_amount: Money,
    pub payment: PaymentConfirmation,
    pub coupon_code: Option<String>,
}

impl PlaceOrder {
    fn check(&self) -> Result<()> {
        if self.user_id.trim().is_empty() { return Err(StoreError::validation("userId is required")); }
        if self.items.is_empty() { return Err(StoreError::validation("Order must contain at least one item")); }
        if let Some(bad) = self.items.iter().find(|i| i.quantity == 0 || !i.price.is_positive()) {
            return Err(StoreError::validation(format!("Invalid quantity or price for product {}", bad.product_id)));
        }
        if !self.total_amount.is_positive() { return Err(StoreError::validation("totalAmount must be positive")); }
        if self.payment.payment_id.trim().is_empty() || self.payment.order_id.trim().is_empty() {
            return Err(StoreError::validation("paymentId and razorpayOrderId are required"));
        }
        if self.payment.signature.trim().is_empty() {
            return Err(StoreError::validation("Payment signature is required"));
        }
        Ok(())
    }
}

/// Pricing breakdown for a cart, with the coupon that produced the discount.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub coupon: Option<AppliedCoupon>,
}

/// Largest gap tolerated between the client's total and ours.
const TOTAL_TOLERANCE: Money = Money::new(dec!(0.01));

#[derive(Clone)]
pub struct CheckoutService {
    db: Database,
    gateway: Arc<dyn PaymentGateway>,
    events: EventPublisher,
    verifier: SignatureVerifier,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        db: Database,
        gateway: Arc<dyn PaymentGateway>,
        events: EventPublisher,
        verifier: SignatureVerifier,
        currency: impl Into<String>,
    ) -> Self {
        Self { db, gateway, events, verifier, currency: currency.into() }
    }

    /// Checks a code against a cart total without consuming it.
    pub async fn validate_coupon(&self, code: &str, cart_total: Money) -> Result<AppliedCoupon> {
        let code = CouponCode::new(code).map_err(|_| StoreError::CouponNotFound)?;
        let coupon = self.db.coupons().find_by_code(&code).await?.ok_or(StoreError::CouponNotFound)?;
        Ok(coupon.evaluate(cart_total, Utc::now())?)
    }

    /// Cart lines joined with live products plus the price breakdown.
    /// Lines whose product is gone keep counting toward the subtotal.
    pub async fn cart_summary(&self, user_id: &str, coupon: Option<&str>) -> Result<CartSummary> {
        let items = self.db.carts().list(user_id).await?;
        let sub = subtotal(&items);

        let applied = match coupon.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Some(self.validate_coupon(code, sub).await?),
            None => None,
        };
        let discount = applied.as_ref().map_or(Money::ZERO, |a| a.discount);

        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let mut products = self.db.products().get_many(&ids).await?;
        let lines = items
            .into_iter()
            .map(|item| {
                let product = products.remove(&item.product_id);
                CartLine { item, product }
            })
            .collect();

        Ok(CartSummary { items: lines, totals: CartTotals::compute(sub, discount), coupon: applied })
    }

    #[instrument(skip(self, req), fields(user_id = %req.user_id, payment_id = %req.payment.payment_id))]
    pub async fn place_order(&self, req: PlaceOrder) -> Result<Order> {
        req.check()?;
        self.verifier.verify(&req.payment.order_id, &req.payment.payment_id, &req.payment.signature)?;
        // The unique index on payment_id still backs this up for concurrent retries.
        if self.db.orders().find_by_payment_id(&req.payment.payment_id).await?.is_some() {
            return Err(StoreError::DuplicateOrder(req.payment.payment_id.clone()));
        }
        let coupon_code = req.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(CouponCode::new).transpose()?;

        let ids: Vec<Uuid> = req.items.iter().map(|i| i.product_id).collect::<HashSet<_>>().into_iter().collect();
        let products = self.db.products().get_many(&ids).await?;
        let items = req
            .items
            .iter()
            .map(|line| {
                let product = products
                    .get(&line.product_id)
                    .ok_or_else(|| StoreError::NotFound(format!("Product {}", line.product_id)))?;
                Ok(LineItem {
                    product_id: line.product_id,
                    name: product.name.clone(),
                    img: product.img.clone(),
                    quantity: line.quantity,
                    price: line.price.round_cents(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let sub: Money = items.iter().map(LineItem::total).sum();
        let paid = self.gateway.fetch_order(&req.payment.order_id).await?;

        let mut tx = self.db.pool().begin().await?;

        let coupon = match &coupon_code {
            Some(code) => Some(CouponRepository::find_by_code_in(&mut tx, code).await?.ok_or(StoreError::CouponNotFound)?),
            None => None,
        };
        let discount = match &coupon {
            Some(c) => c.evaluate(sub, Utc::now())?.discount,
            None => Money::ZERO,
        };
        let totals = CartTotals::compute(sub, discount);
        if (totals.total - req.total_amount).abs() > TOTAL_TOLERANCE {
            return Err(StoreError::validation(format!(
                "totalAmount {} does not match the computed total {}",
                req.total_amount, totals.total
            )));
        }
        let paid_amount = Money::from_minor(paid.amount);
        if (paid_amount - totals.total).abs() > TOTAL_TOLERANCE {
            return Err(StoreError::PaymentAmountMismatch { paid: paid_amount, expected: totals.total });
        }

        let mut order = Order::place(
            req.user_id.as_str(),
            items,
            totals,
            coupon_code,
            &self.currency,
            req.payment.payment_id.as_str(),
            req.payment.order_id.as_str(),
        )?;

        if let Some(c) = &coupon {
            if !CouponRepository::redeem(&mut tx, c.id).await? {
                return Err(StoreError::CouponExhausted);
            }
        }
        OrderRepository::insert_with(&mut tx, &order).await?;
        tx.commit().await?;

        info!(order_id = %order.id(), total = %order.total_amount(), "Order placed");

        if let Err(e) = self.db.carts().clear(order.user_id()).await {
            warn!(order_id = %order.id(), error = %e, "Cart clear after order failed");
        }
        self.events.publish(order.take_events()).await;
        Ok(order)
    }

    pub async fn update_order_status(&self, order_id: Uuid, next: OrderStatus) -> Result<Order> {
        let mut order = self.db.orders().get(order_id).await?.ok_or_else(|| StoreError::not_found("Order"))?;
        let from = order.status();
        order.transition_to(next)?;
        self.db.orders().update_status(&order, from).await?;
        info!(order_id = %order_id, %from, to = %next, "Order status updated");
        self.events.publish(order.take_events()).await;
        Ok(order)
    }
}
