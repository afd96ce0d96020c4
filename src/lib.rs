//! Papertrade Backend Library
//!
//! Exposes the portfolio ledger core, the price oracle client, and the HTTP
//! surface for use by the binary and integration tests.

pub mod api;
pub mod config;
pub mod ledger;
pub mod oracle;
