//! Repositories: one per aggregate, all sharing the SQLite pool.
//!
//! Money columns hold minor units; rows are mapped into domain types here so
//! nothing above this layer sees storage representations.

pub mod cart;
pub mod contact;
pub mod coupon;
pub mod order;
pub mod product;
pub mod review;
pub mod wishlist;

pub use cart::CartRepository;
pub use contact::ContactRepository;
pub use coupon::CouponRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use review::ReviewRepository;
pub use wishlist::WishlistRepository;

use crate::StoreError;

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Column values that fail to decode into a domain type mean the row was not written by us.
pub(crate) fn corrupt(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(format!("corrupt {column} column: {detail}"))
}

pub(crate) fn to_u32(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| corrupt(column, value))
}
