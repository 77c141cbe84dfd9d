//! Aggregates module
pub mod product;
pub mod cart;
pub mod coupon;
pub mod order;
pub mod review;
pub mod wishlist;
pub mod contact;

pub use product::{Category, Product, ProductDraft, ProductError, ProductQuery, SortBy};
pub use cart::{CartItem, CartLine, CartTotals, TAX_RATE};
pub use coupon::{AppliedCoupon, Coupon, CouponDraft, CouponError, DiscountType};
pub use order::{LineItem, Order, OrderError, OrderStatus, PaymentRef, PaymentStatus};
pub use review::Review;
pub use wishlist::{WishlistEntry, WishlistItem};
pub use contact::{ContactMessage, MessageStatus};
