//! Papertrade - Paper-Trading Portfolio Ledger Service
//!
//! Wires the SQLite-backed ledger store, the quote oracle, and the ledger
//! engine into an axum HTTP server. All interesting invariants live in the
//! `ledger` module; this binary is configuration and transport only.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use papertrade_backend::{
    api,
    config::Config,
    ledger::{LedgerEngine, SqliteLedgerStore},
    oracle::FinnhubOracle,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "papertrade_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    if config.finnhub_api_key.is_empty() {
        warn!("FINNHUB_API_KEY is empty; sells will fail with PriceUnavailable");
    }

    let store = Arc::new(
        SqliteLedgerStore::open(&config.db_path)
            .context("Failed to open the ledger database")?,
    );
    let oracle = Arc::new(FinnhubOracle::new(
        config.finnhub_base_url.clone(),
        config.finnhub_api_key.clone(),
        Duration::from_secs(config.quote_timeout_secs),
    )?);
    let engine = Arc::new(LedgerEngine::new(
        store,
        oracle,
        config.opening_balance_cents(),
    ));

    let app = api::create_router(engine)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, db = %config.db_path, "Papertrade ledger service up");

    axum::serve(listener, app)
        .await
        .context("HTTP server exited")?;

    Ok(())
}
