//! Service configuration, read from the environment (and `.env` via dotenvy).

use std::time::Duration;

use crate::{Result, StoreError};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_api_base: String,
    pub payment_timeout: Duration,
    pub request_timeout: Duration,
    pub currency: String,
    pub nats_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: "sqlite://storefront.db".to_string(),
            database_max_connections: 5,
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            razorpay_api_base: "https://api.razorpay.com".to_string(),
            payment_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            currency: "INR".to_string(),
            nats_url: None,
        }
    }
}

impl AppConfig {
    /// Reads `PORT`, `DATABASE_URL`, `RAZORPAY_*`, `STORE_CURRENCY`, timeouts and `NATS_URL`.
    /// Razorpay credentials are mandatory; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            razorpay_key_id: required_var("RAZORPAY_KEY_ID")?,
            razorpay_key_secret: required_var("RAZORPAY_KEY_SECRET")?,
            razorpay_api_base: std::env::var("RAZORPAY_API_BASE").unwrap_or(defaults.razorpay_api_base),
            payment_timeout: Duration::from_secs(parse_var("PAYMENT_TIMEOUT_SECS", 10u64)?),
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30u64)?),
            currency: std::env::var("STORE_CURRENCY").unwrap_or(defaults.currency),
            nats_url: std::env::var("NATS_URL").ok().filter(|url| !url.is_empty()),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StoreError::Internal(format!("{name} environment variable not set")))
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| StoreError::Internal(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
