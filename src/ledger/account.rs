//! Account document model
//!
//! One Account per user: cash balance, open positions keyed by symbol, and an
//! append-only transaction log. The store persists the whole document as one
//! JSON blob and the engine always writes back a full replacement, so every
//! committed state is internally consistent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::ledger::money::{MicroShares, UsdCents};

/// Direction of a committed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Buy,
    Sell,
}

/// One currently held symbol.
///
/// `quantity` is strictly positive while the position exists; the engine
/// removes the map entry the moment it reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: MicroShares,
    /// Amount paid when the position was opened. Informational: average cost
    /// is always derived from the transaction log, never from this field.
    pub amount_invested: UsdCents,
    pub last_action: TxKind,
    pub updated_at: DateTime<Utc>,
}

/// Immutable record of one committed buy or sell.
///
/// `amount` is the cash that moved: outflow on buys, inflow on sells.
/// Log ordering is insertion order; the timestamp is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TxKind,
    pub symbol: String,
    pub amount: UsdCents,
    pub quantity: MicroShares,
    pub at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(kind: TxKind, symbol: &str, amount: UsdCents, quantity: MicroShares) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            symbol: symbol.to_string(),
            amount,
            quantity,
            at: Utc::now(),
        }
    }
}

/// The per-user ledger document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    /// Never negative after a committed operation.
    pub balance: UsdCents,
    pub positions: HashMap<String, Position>,
    /// Append-only; entries are never mutated or removed.
    pub transactions: Vec<Transaction>,
}

impl Account {
    pub fn new(account_id: &str, opening_balance: UsdCents) -> Self {
        Self {
            account_id: account_id.to_string(),
            balance: opening_balance,
            positions: HashMap::new(),
            transactions: Vec::new(),
        }
    }
}
