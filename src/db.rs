//! SQLite connection pool and repository access.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::repository::{
    CartRepository, ContactRepository, CouponRepository, OrderRepository, ProductRepository,
    ReviewRepository, WishlistRepository,
};
use crate::Result;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), max_connections: 5, acquire_timeout: Duration::from_secs(30), run_migrations: true }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Isolated in-memory database for tests. An in-memory SQLite database
    /// lives and dies with its connection, so the pool holds exactly one.
    pub fn in_memory() -> Self {
        Self { url: "sqlite::memory:".to_string(), max_connections: 1, acquire_timeout: Duration::from_secs(5), run_migrations: true }
    }

    fn is_memory(&self) -> bool { self.url.contains(":memory:") }
}

/// Database handle. Cheap to clone; every repository shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: DbConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to database");

        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .foreign_keys(true)
            .create_if_missing(true);
        if !config.is_memory() {
            options = options.journal_mode(SqliteJournalMode::Wal).synchronous(SqliteSynchronous::Normal);
        }

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout);
        if config.is_memory() {
            pool_options = pool_options.min_connections(1).idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let db = Self { pool };
        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        info!(migrations = MIGRATOR.migrations.len(), "Migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool { &self.pool }

    pub fn products(&self) -> ProductRepository { ProductRepository::new(self.pool.clone()) }
    pub fn carts(&self) -> CartRepository { CartRepository::new(self.pool.clone()) }
    pub fn coupons(&self) -> CouponRepository { CouponRepository::new(self.pool.clone()) }
    pub fn orders(&self) -> OrderRepository { OrderRepository::new(self.pool.clone()) }
    pub fn reviews(&self) -> ReviewRepository { ReviewRepository::new(self.pool.clone()) }
    pub fn wishlist(&self) -> WishlistRepository { WishlistRepository::new(self.pool.clone()) }
    pub fn contacts(&self) -> ContactRepository { ContactRepository::new(self.pool.clone()) }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn close(&self) { self.pool.close().await; }
}
