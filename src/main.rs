//! OpenSASE Storefront - Self-hosted storefront backend

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_storefront::{router, AppConfig, AppState, Database, DbConfig, EventPublisher, RazorpayGateway, SignatureVerifier};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let db = Database::connect(DbConfig::new(&config.database_url).max_connections(config.database_max_connections))
        .await
        .context("connecting to database")?;

    let events = match &config.nats_url {
        Some(url) => EventPublisher::connect(url).await,
        None => EventPublisher::disabled(),
    };
    let gateway = RazorpayGateway::new(
        &config.razorpay_api_base,
        &config.razorpay_key_id,
        &config.razorpay_key_secret,
        config.payment_timeout,
    )?;
    let verifier = SignatureVerifier::new(config.razorpay_key_secret.clone());

    let state = AppState::new(db.clone(), Arc::new(gateway), verifier, events, config.currency.clone());
    let app = router(state, config.request_timeout);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🚀 OpenSASE Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    db.close().await;
    Ok(())
}
