//! Price Oracle
//!
//! External quote provider, treated as untrusted: slow, flaky, or down at any
//! time. The client carries its own request timeout so a hung upstream can
//! never wedge a sell; any failure here surfaces to the engine as a single
//! "no usable price" condition and the operation aborts untouched.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ledger::money::{dollars_to_cents, UsdCents};

/// Contract the engine depends on for sell pricing.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current price of `symbol` in cents. Err means no usable price.
    async fn price_cents(&self, symbol: &str) -> Result<UsdCents>;
}

/// Finnhub-style quote endpoint: `GET {base}/quote?symbol=S&token=KEY`,
/// current price in the `c` field.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price in dollars; 0 or absent when the symbol is unknown.
    c: Option<f64>,
}

pub struct FinnhubOracle {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubOracle {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build quote HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl PriceOracle for FinnhubOracle {
    async fn price_cents(&self, symbol: &str) -> Result<UsdCents> {
        let url = format!("{}/quote", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("token", &self.api_key)])
            .send()
            .await
            .context("Quote request failed")?
            .error_for_status()
            .context("Quote endpoint returned an error status")?;

        let quote: QuoteResponse = response
            .json()
            .await
            .context("Failed to parse quote response")?;

        // Finnhub reports 0.0 for unknown symbols rather than an error.
        let price = match quote.c {
            Some(p) if p > 0.0 => p,
            other => {
                warn!(symbol, price = ?other, "Oracle returned no usable price");
                return Err(anyhow!("no usable price for {}", symbol));
            }
        };

        let cents = dollars_to_cents(price);
        debug!(symbol, cents, "Fetched quote");
        Ok(cents)
    }
}
