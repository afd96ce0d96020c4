//! Cost Basis Calculator
//!
//! Derives the average price paid per currently-held share of one symbol by
//! replaying its transaction history. Fully-closed-and-reopened cycles are
//! ignored: only transactions after the last point where the running share
//! count returned to zero contribute to the open position.
//!
//! Pure function over the log. Never persisted, so it can be recomputed at
//! any time and calling it twice on the same history gives the same answer.

use crate::ledger::account::{Transaction, TxKind};
use crate::ledger::money::{avg_price_cents, mul_div, MicroShares, UsdCents};

/// Average price in cents per share of the open position in `symbol`,
/// or None when nothing is currently held.
pub fn average_price(transactions: &[Transaction], symbol: &str) -> Option<UsdCents> {
    let mut history: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.symbol == symbol)
        .collect();
    // Stable sort: ties keep insertion order, which is the authoritative
    // ordering for same-timestamp entries.
    history.sort_by_key(|tx| tx.at);

    // Last index where the running share count hit exactly zero marks a full
    // liquidation; everything before it belongs to a closed lot.
    let mut running: MicroShares = 0;
    let mut last_zero: Option<usize> = None;
    for (i, tx) in history.iter().enumerate() {
        running += match tx.kind {
            TxKind::Buy => tx.quantity,
            TxKind::Sell => -tx.quantity,
        };
        if running == 0 {
            last_zero = Some(i);
        }
    }

    let relevant = match last_zero {
        Some(i) => &history[i + 1..],
        None => &history[..],
    };

    let mut cost: UsdCents = 0;
    let mut shares: MicroShares = 0;
    for tx in relevant {
        match tx.kind {
            TxKind::Buy => {
                cost += tx.amount;
                shares += tx.quantity;
            }
            TxKind::Sell => {
                // Selling a pro-rata slice of the average-cost lot, not
                // FIFO/LIFO: cost scales down by the fraction that remains.
                if shares > 0 {
                    cost = mul_div(cost, shares - tx.quantity, shares);
                }
                shares -= tx.quantity;
            }
        }
    }

    avg_price_cents(cost, shares)
}
