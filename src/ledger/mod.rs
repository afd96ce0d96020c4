//! Portfolio ledger core: account model, engine, cost-basis calculator,
//! error taxonomy, and the document store it persists through.

pub mod account;
pub mod basis;
pub mod engine;
pub mod error;
pub mod money;
pub mod store;

pub use account::{Account, Position, Transaction, TxKind};
pub use engine::LedgerEngine;
pub use error::LedgerError;
pub use store::{LedgerStore, SaveOutcome, SqliteLedgerStore, Version};
