//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub img: String,
    pub category: Category,
    pub brand: String,
    pub stock: u32,
    pub rating: f64,
    pub review_count: u32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields an admin supplies when creating or replacing a product.
#[derive(Clone, Debug)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub img: String,
    pub category: Category,
    pub brand: String,
    pub stock: u32,
    pub is_featured: bool,
}

impl ProductDraft {
    pub const DEFAULT_STOCK: u32 = 100;

    pub fn check(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if !self.price.is_positive() { return Err(ProductError::InvalidPrice); }
        if self.original_price.is_some_and(|p| !p.is_positive()) { return Err(ProductError::InvalidPrice); }
        Ok(())
    }

    pub fn into_product(self) -> Product {
        Product {
            id: Uuid::now_v7(), name: self.name, description: self.description, price: self.price,
            original_price: self.original_price, img: self.img, category: self.category, brand: self.brand,
            stock: self.stock, rating: 0.0, review_count: 0, is_featured: self.is_featured, created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Fashion,
    #[serde(rename = "Home & Kitchen")]
    HomeAndKitchen,
    Sports,
    Books,
    Beauty,
    Toys,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Electronics, Self::Fashion, Self::HomeAndKitchen, Self::Sports,
        Self::Books, Self::Beauty, Self::Toys, Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Fashion => "Fashion",
            Self::HomeAndKitchen => "Home & Kitchen",
            Self::Sports => "Sports",
            Self::Books => "Books",
            Self::Beauty => "Beauty",
            Self::Toys => "Toys",
            Self::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = ProductError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|c| c.as_str() == s).ok_or_else(|| ProductError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Catalog search filter.
#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub text: Option<String>,
    pub category: Option<Category>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub sort: SortBy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy { PriceLow, PriceHigh, Rating, #[default] Newest }

impl SortBy {
    pub fn order_clause(&self) -> &'static str {
        match self {
            Self::PriceLow => "price_minor ASC",
            Self::PriceHigh => "price_minor DESC",
            Self::Rating => "rating DESC",
            Self::Newest => "created_at DESC, rowid DESC",
        }
    }
}

/// Mean of the review ratings, rounded to one decimal place.
pub fn average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() { return 0.0; }
    let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
    let mean = Decimal::from(sum) / Decimal::from(ratings.len() as u64);
    mean.round_dp(1).to_f64().unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingName, InvalidPrice, UnknownCategory(String) }
impl std::error::Error for ProductError {}
impl fmt::Display for ProductError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "Product name is required"),
            Self::InvalidPrice => write!(f, "Price must be greater than zero"),
            Self::UnknownCategory(c) => write!(f, "Unknown category: {c}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Headphones".into(), description: "Over-ear".into(), price: Money::from_major(2499),
            original_price: None, img: "/img/h.png".into(), category: Category::Electronics,
            brand: String::new(), stock: ProductDraft::DEFAULT_STOCK, is_featured: false,
        }
    }

    #[test]
    fn test_product_draft() {
        let p = draft().into_product();
        assert_eq!(p.rating, 0.0);
        assert_eq!(p.stock, 100);
        let mut bad = draft();
        bad.price = Money::ZERO;
        assert_eq!(bad.check(), Err(ProductError::InvalidPrice));
    }

    #[test]
    fn test_category_names() {
        assert_eq!("Home & Kitchen".parse::<Category>().unwrap(), Category::HomeAndKitchen);
        assert!("Garden".parse::<Category>().is_err());
        assert_eq!(serde_json::to_string(&Category::HomeAndKitchen).unwrap(), "\"Home & Kitchen\"");
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[5, 4, 4]), 4.3);
        assert_eq!(average_rating(&[]), 0.0);
    }
}
