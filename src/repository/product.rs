//! Product Repository

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{corrupt, to_u32};
use crate::domain::aggregates::{Product, ProductDraft, ProductQuery};
use crate::domain::value_objects::Money;
use crate::Result;

const FEATURED_LIMIT: i64 = 8;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price_minor: i64,
    original_price_minor: Option<i64>,
    img: String,
    category: String,
    brand: String,
    stock: i64,
    rating: f64,
    review_count: i64,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = crate::StoreError;
    fn try_from(r: ProductRow) -> Result<Self> {
        Ok(Product {
            id: r.id,
            name: r.name,
            description: r.description,
            price: Money::from_minor(r.price_minor),
            original_price: r.original_price_minor.map(Money::from_minor),
            img: r.img,
            category: r.category.parse().map_err(|e| corrupt("category", e))?,
            brand: r.brand,
            stock: to_u32("stock", r.stock)?,
            rating: r.rating,
            review_count: to_u32("review_count", r.review_count)?,
            is_featured: r.is_featured,
            created_at: r.created_at,
        })
    }
}

fn collect(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    pub async fn insert(&self, p: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, description, price_minor, original_price_minor, img, category, brand, stock, rating, review_count, is_featured, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(p.id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.price.to_minor()?)
        .bind(p.original_price.map(|m| m.to_minor()).transpose()?)
        .bind(&p.img)
        .bind(p.category.as_str())
        .bind(&p.brand)
        .bind(i64::from(p.stock))
        .bind(p.rating)
        .bind(i64::from(p.review_count))
        .bind(p.is_featured)
        .bind(p.created_at)
        .execute(&self.pool)
        .await?;
        debug!(product_id = %p.id, "Product inserted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// Looks up several products at once; ids with no product are absent from the map.
    pub async fn get_many(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>> {
        if ids.is_empty() { return Ok(HashMap::new()); }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids { sep.push_bind(*id); }
        qb.push(")");
        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        Ok(collect(rows)?.into_iter().map(|p| (p.id, p)).collect())
    }

    pub async fn list_all(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    pub async fn search(&self, q: &ProductQuery) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE 1 = 1");
        if let Some(text) = q.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(text));
            qb.push(" AND (name LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
            qb.push(" OR description LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
            qb.push(" OR brand LIKE ").push_bind(pattern).push(" ESCAPE '\\')");
        }
        if let Some(category) = q.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(min) = q.min_price {
            qb.push(" AND price_minor >= ").push_bind(min.to_minor()?);
        }
        if let Some(max) = q.max_price {
            qb.push(" AND price_minor <= ").push_bind(max.to_minor()?);
        }
        qb.push(" ORDER BY ").push(q.sort.order_clause());

        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        debug!(count = rows.len(), "Product search");
        collect(rows)
    }

    pub async fn featured(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE is_featured = 1 ORDER BY created_at DESC, rowid DESC LIMIT ?")
            .bind(FEATURED_LIMIT)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        Ok(sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
            .fetch_all(&self.pool)
            .await?)
    }

    /// Replaces the editable fields. Rating aggregates and creation time are kept.
    pub async fn update(&self, id: Uuid, d: &ProductDraft) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET name = ?, description = ?, price_minor = ?, original_price_minor = ?, img = ?, \
             category = ?, brand = ?, stock = ?, is_featured = ? WHERE id = ? RETURNING *",
        )
        .bind(&d.name)
        .bind(&d.description)
        .bind(d.price.to_minor()?)
        .bind(d.original_price.map(|m| m.to_minor()).transpose()?)
        .bind(&d.img)
        .bind(d.category.as_str())
        .bind(&d.brand)
        .bind(i64::from(d.stock))
        .bind(d.is_featured)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Product::try_from).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM products WHERE id = ?").bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    /// Writes recomputed review aggregates; runs inside the review transaction.
    pub(crate) async fn set_rating(conn: &mut SqliteConnection, id: Uuid, rating: f64, review_count: u32) -> Result<()> {
        sqlx::query("UPDATE products SET rating = ?, review_count = ? WHERE id = ?")
            .bind(rating)
            .bind(i64::from(review_count))
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbConfig};
    use crate::domain::aggregates::{Category, SortBy};

    fn draft(name: &str, price: i64, category: Category) -> ProductDraft {
        ProductDraft {
            name: name.into(), description: format!("{name} description"), price: Money::from_major(price),
            original_price: None, img: format!("/uploads/{name}.png"), category, brand: "Acme".into(),
            stock: ProductDraft::DEFAULT_STOCK, is_featured: price > 1000,
        }
    }

    async fn seeded() -> ProductRepository {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        for (name, price, cat) in [("Kettle", 900, Category::HomeAndKitchen), ("Laptop", 55_000, Category::Electronics), ("Novel", 350, Category::Books)] {
            repo.insert(&draft(name, price, cat).into_product()).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_product_round_trip_and_delete() {
        let repo = seeded().await;
        let p = draft("Mixer", 2499, Category::HomeAndKitchen).into_product();
        repo.insert(&p).await.unwrap();
        let found = repo.get(p.id).await.unwrap().unwrap();
        assert_eq!(found.price, Money::from_major(2499));
        assert_eq!(found.category, Category::HomeAndKitchen);
        assert!(repo.delete(p.id).await.unwrap());
        assert!(repo.get(p.id).await.unwrap().is_none());
        assert!(!repo.delete(p.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_filters_and_sort() {
        let repo = seeded().await;
        let q = ProductQuery { text: Some("LAPTOP".into()), ..Default::default() };
        assert_eq!(repo.search(&q).await.unwrap().len(), 1);

        let q = ProductQuery { max_price: Some(Money::from_major(1000)), sort: SortBy::PriceHigh, ..Default::default() };
        let names: Vec<_> = repo.search(&q).await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Kettle", "Novel"]);

        let q = ProductQuery { category: Some(Category::Books), ..Default::default() };
        assert_eq!(repo.search(&q).await.unwrap()[0].name, "Novel");

        let q = ProductQuery { text: Some("100%".into()), ..Default::default() };
        assert!(repo.search(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_featured_and_categories() {
        let repo = seeded().await;
        let featured = repo.featured().await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].name, "Laptop");
        assert_eq!(repo.categories().await.unwrap(), vec!["Books", "Electronics", "Home & Kitchen"]);
    }

    #[tokio::test]
    async fn test_update_keeps_rating() {
        let repo = seeded().await;
        let p = repo.list_all().await.unwrap().remove(0);
        let mut d = draft("Renamed", 100, Category::Toys);
        d.stock = 3;
        let updated = repo.update(p.id, &d).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.stock, 3);
        assert_eq!(updated.created_at, p.created_at);
        assert!(repo.update(Uuid::now_v7(), &d).await.unwrap().is_none());
    }
}
