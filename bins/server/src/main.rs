//! Cashbook API Server
//!
//! Main entry point for the daily cash-register ledger service.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cashbook_api::{AppState, create_router};
use cashbook_core::cash::{CashLedgerService, parse_timezone};
use cashbook_db::{CachedCategoryDirectory, CashLedgerRepository, CategoryRepository};
use cashbook_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(config.log.json);

    let db = cashbook_db::connect_with_config(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let business_tz = parse_timezone(&config.ledger.timezone).map_err(|e| anyhow!(e))?;
    let directory = CachedCategoryDirectory::new(
        CategoryRepository::new(db.clone()),
        config.ledger.category_cache_capacity,
        config.ledger.category_cache_ttl_secs,
    );
    let ledger = CashLedgerService::new(
        Arc::new(CashLedgerRepository::new(db)),
        Arc::new(directory),
    )
    .with_business_timezone(business_tz);
    info!(timezone = %business_tz, "Cash ledger configured");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .context("jwt.access_token_expiry_secs is too large")?,
    });

    let app = create_router(AppState::new(ledger, jwt_service));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cashbook=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
