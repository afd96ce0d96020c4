//! Runtime configuration
//!
//! CLI flags with env fallbacks; `.env` is loaded by main before parsing.

use clap::Parser;

use crate::ledger::money::{dollars_to_cents, UsdCents};

#[derive(Debug, Parser)]
#[command(name = "papertrade", about = "Paper-trading portfolio ledger service")]
pub struct Config {
    /// Address to bind the HTTP server on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// Path to the SQLite ledger database
    #[arg(long, env = "LEDGER_DB_PATH", default_value = "papertrade.db")]
    pub db_path: String,

    /// Quote API base URL
    #[arg(long, env = "FINNHUB_BASE_URL", default_value = "https://finnhub.io/api/v1")]
    pub finnhub_base_url: String,

    /// Quote API key
    #[arg(long, env = "FINNHUB_API_KEY", default_value = "")]
    pub finnhub_api_key: String,

    /// Quote request timeout in seconds
    #[arg(long, env = "QUOTE_TIMEOUT_SECS", default_value_t = 5)]
    pub quote_timeout_secs: u64,

    /// Simulated cash balance granted to new accounts, in dollars
    #[arg(long, env = "STARTING_BALANCE", default_value_t = 100_000.0)]
    pub starting_balance: f64,
}

impl Config {
    pub fn opening_balance_cents(&self) -> UsdCents {
        dollars_to_cents(self.starting_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["papertrade"]);
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.opening_balance_cents(), 100_000_00);
        assert_eq!(config.quote_timeout_secs, 5);
    }

    #[test]
    fn test_flag_overrides() {
        let config = Config::parse_from([
            "papertrade",
            "--starting-balance",
            "500.50",
            "--db-path",
            "/tmp/test.db",
        ]);
        assert_eq!(config.opening_balance_cents(), 500_50);
        assert_eq!(config.db_path, "/tmp/test.db");
    }
}
