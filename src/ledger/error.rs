//! Ledger error taxonomy
//!
//! Structured kinds so callers and tests can branch on behavior without
//! string matching. Everything here is recoverable at the caller boundary;
//! HTTP status mapping lives in the api layer, the core stays transport-free.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Buy amount exceeds the account's cash balance.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Sell quantity exceeds the held quantity (or no position at all).
    #[error("insufficient shares to sell")]
    InsufficientShares,

    /// The price oracle could not supply a usable price during a sell.
    #[error("could not fetch current price")]
    PriceUnavailable,

    /// Unknown account identity.
    #[error("account not found")]
    AccountNotFound,

    /// Non-positive amount/quantity or empty symbol.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Infrastructure failure: store I/O, exhausted compare-and-swap retries.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}
