use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use super::extract::ValidatedJson;
use super::{parse_id, AppState};
use crate::domain::aggregates::{Category, ProductDraft, ProductQuery, SortBy};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::Money;
use crate::{Result, StoreError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    q: Option<String>,
    category: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    sort_by: Option<SortBy>,
}

impl SearchParams {
    fn into_query(self) -> Result<ProductQuery> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") | Some("All") => None,
            Some(c) => Some(c.parse::<Category>()?),
        };
        Ok(ProductQuery {
            text: self.q,
            category,
            min_price: price_param("minPrice", self.min_price)?,
            max_price: price_param("maxPrice", self.max_price)?,
            sort: self.sort_by.unwrap_or_default(),
        })
    }
}

fn price_param(name: &str, raw: Option<String>) -> Result<Option<Money>> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Decimal::from_str(s)
            .map(|d| Some(Money::new(d)))
            .map_err(|_| StoreError::validation(format!("{name} must be a number"))),
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "description is required"))]
    description: String,
    price: Option<Decimal>,
    original_price: Option<Decimal>,
    #[serde(default)]
    #[validate(length(min = 1, message = "img is required"))]
    img: String,
    category: Option<String>,
    #[serde(default)]
    brand: String,
    stock: Option<u32>,
    #[serde(default)]
    is_featured: bool,
}

impl ProductRequest {
    fn into_draft(self) -> Result<ProductDraft> {
        let price = self.price.ok_or_else(|| StoreError::validation("price is required"))?;
        let category = self.category.ok_or_else(|| StoreError::validation("category is required"))?;
        let draft = ProductDraft {
            name: self.name.trim().to_string(),
            description: self.description,
            price: Money::new(price).round_cents(),
            original_price: self.original_price.map(|p| Money::new(p).round_cents()),
            img: self.img,
            category: category.parse()?,
            brand: self.brand,
            stock: self.stock.unwrap_or(ProductDraft::DEFAULT_STOCK),
            is_featured: self.is_featured,
        };
        draft.check()?;
        Ok(draft)
    }
}

pub async fn search(State(s): State<AppState>, Query(p): Query<SearchParams>) -> Result<impl IntoResponse> {
    let products = s.db.products().search(&p.into_query()?).await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

pub async fn list_all(State(s): State<AppState>) -> Result<impl IntoResponse> {
    let products = s.db.products().list_all().await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

pub async fn featured(State(s): State<AppState>) -> Result<impl IntoResponse> {
    let products = s.db.products().featured().await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

pub async fn categories(State(s): State<AppState>) -> Result<impl IntoResponse> {
    let categories = s.db.products().categories().await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

pub async fn get_one(State(s): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "product")?;
    let product = s.db.products().get(id).await?.ok_or_else(|| StoreError::not_found("Product"))?;
    Ok(Json(json!({ "success": true, "product": product })))
}

pub async fn create(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<ProductRequest>) -> Result<impl IntoResponse> {
    let product = req.into_draft()?.into_product();
    s.db.products().insert(&product).await?;
    info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": "Product added successfully", "product": product }))))
}

pub async fn update(
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "product")?;
    let draft = req.into_draft()?;
    let product = s.db.products().update(id, &draft).await?.ok_or_else(|| StoreError::not_found("Product"))?;
    Ok(Json(json!({ "success": true, "message": "Product updated successfully", "product": product })))
}

pub async fn remove(State(s): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let id = parse_id(&id, "product")?;
    if !s.db.products().delete(id).await? {
        return Err(StoreError::not_found("Product"));
    }
    info!(product_id = %id, "Product deleted");
    s.events.publish(vec![DomainEvent::Product(ProductEvent::Deleted { product_id: id })]).await;
    Ok(Json(json!({ "success": true, "message": "Product deleted successfully" })))
}
