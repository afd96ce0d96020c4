//! Portfolio Ledger Engine
//!
//! Validates and applies buy/sell operations against a per-account document.
//! Each mutation is load → validate → compute → compare-and-swap save, with a
//! bounded retry on version conflict, so balance and position invariants hold
//! even when the surrounding layer fires concurrent requests at one account.
//! Nothing partially commits: any failure after load leaves the stored
//! document exactly as it was.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ledger::account::{Account, Position, Transaction, TxKind};
use crate::ledger::error::LedgerError;
use crate::ledger::money::{sale_amount, MicroShares, UsdCents};
use crate::ledger::store::{LedgerStore, SaveOutcome};
use crate::oracle::PriceOracle;

/// Save attempts per mutation before giving up. Conflicts only come from
/// writers on the same account, so contention windows are short.
const MAX_SAVE_ATTEMPTS: u32 = 5;

pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    oracle: Arc<dyn PriceOracle>,
    opening_balance: UsdCents,
}

impl LedgerEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        oracle: Arc<dyn PriceOracle>,
        opening_balance: UsdCents,
    ) -> Self {
        Self {
            store,
            oracle,
            opening_balance,
        }
    }

    /// Create the account with the configured starting balance if it does not
    /// exist yet. Idempotent: an existing account is returned untouched.
    pub async fn open_account(&self, account_id: &str) -> Result<Account, LedgerError> {
        if account_id.trim().is_empty() {
            return Err(LedgerError::invalid("account id must not be empty"));
        }

        let account = Account::new(account_id, self.opening_balance);
        if self.store.create(&account).await? {
            info!(account_id, balance = account.balance, "Opened account");
            return Ok(account);
        }

        // Already existed; hand back the stored document.
        match self.store.load(account_id).await? {
            Some((existing, _)) => Ok(existing),
            None => Err(LedgerError::Storage(anyhow!(
                "account {} vanished between create and load",
                account_id
            ))),
        }
    }

    /// Buy `quantity` of `symbol` for `amount_invested` cash.
    ///
    /// The quantity is caller-computed (amount / current price); the engine
    /// trusts it and never fetches a price on buys.
    pub async fn buy(
        &self,
        account_id: &str,
        symbol: &str,
        amount_invested: UsdCents,
        quantity: MicroShares,
    ) -> Result<Account, LedgerError> {
        validate_symbol(symbol)?;
        if amount_invested <= 0 {
            return Err(LedgerError::invalid("amount invested must be positive"));
        }
        if quantity <= 0 {
            return Err(LedgerError::invalid("quantity must be positive"));
        }

        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let (mut account, version) = self
                .store
                .load(account_id)
                .await?
                .ok_or(LedgerError::AccountNotFound)?;

            if account.balance < amount_invested {
                return Err(LedgerError::InsufficientFunds);
            }

            let now = Utc::now();
            match account.positions.get_mut(symbol) {
                Some(position) => {
                    // Wire quantities saturate at i64::MAX, so an unchecked
                    // add here could wrap the position negative
                    position.quantity = position
                        .quantity
                        .checked_add(quantity)
                        .ok_or_else(|| LedgerError::invalid("position quantity out of range"))?;
                    position.last_action = TxKind::Buy;
                    position.updated_at = now;
                }
                None => {
                    account.positions.insert(
                        symbol.to_string(),
                        Position {
                            symbol: symbol.to_string(),
                            quantity,
                            amount_invested,
                            last_action: TxKind::Buy,
                            updated_at: now,
                        },
                    );
                }
            }

            account
                .transactions
                .push(Transaction::new(TxKind::Buy, symbol, amount_invested, quantity));
            account.balance -= amount_invested;

            match self.store.save(&account, version).await? {
                SaveOutcome::Saved => {
                    info!(
                        account_id,
                        symbol,
                        amount = amount_invested,
                        quantity,
                        balance = account.balance,
                        "Buy committed"
                    );
                    return Ok(account);
                }
                SaveOutcome::Conflict => {
                    debug!(account_id, attempt, "Buy hit a version conflict, reloading");
                }
            }
        }

        Err(LedgerError::Storage(anyhow!(
            "buy on {} gave up after {} version conflicts",
            account_id,
            MAX_SAVE_ATTEMPTS
        )))
    }

    /// Sell `quantity` of `symbol` at the oracle's current price.
    ///
    /// The price is fetched once, after the first successful validation, and
    /// reused across conflict retries; the engine never re-issues the
    /// external call and never retries a failed mutation on its own.
    pub async fn sell(
        &self,
        account_id: &str,
        symbol: &str,
        quantity: MicroShares,
    ) -> Result<Account, LedgerError> {
        validate_symbol(symbol)?;
        if quantity <= 0 {
            return Err(LedgerError::invalid("quantity must be positive"));
        }

        let mut price: Option<UsdCents> = None;

        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let (mut account, version) = self
                .store
                .load(account_id)
                .await?
                .ok_or(LedgerError::AccountNotFound)?;

            match account.positions.get(symbol) {
                Some(position) if position.quantity >= quantity => {}
                _ => return Err(LedgerError::InsufficientShares),
            }

            let price_cents = match price {
                Some(p) => p,
                None => {
                    let fetched = self.oracle.price_cents(symbol).await.map_err(|err| {
                        warn!(account_id, symbol, %err, "Sell aborted: oracle failure");
                        LedgerError::PriceUnavailable
                    })?;
                    price = Some(fetched);
                    fetched
                }
            };

            let proceeds = sale_amount(price_cents, quantity)
                .ok_or_else(|| LedgerError::invalid("sale amount out of range"))?;
            account.balance = account
                .balance
                .checked_add(proceeds)
                .ok_or_else(|| LedgerError::invalid("balance out of range"))?;

            let now = Utc::now();
            let remaining = match account.positions.get_mut(symbol) {
                Some(position) => {
                    position.quantity = position
                        .quantity
                        .checked_sub(quantity)
                        .ok_or(LedgerError::InsufficientShares)?;
                    position.last_action = TxKind::Sell;
                    position.updated_at = now;
                    position.quantity
                }
                None => return Err(LedgerError::InsufficientShares),
            };
            if remaining == 0 {
                account.positions.remove(symbol);
            }

            account
                .transactions
                .push(Transaction::new(TxKind::Sell, symbol, proceeds, quantity));

            match self.store.save(&account, version).await? {
                SaveOutcome::Saved => {
                    info!(
                        account_id,
                        symbol,
                        quantity,
                        proceeds,
                        balance = account.balance,
                        "Sell committed"
                    );
                    return Ok(account);
                }
                SaveOutcome::Conflict => {
                    debug!(account_id, attempt, "Sell hit a version conflict, reloading");
                }
            }
        }

        Err(LedgerError::Storage(anyhow!(
            "sell on {} gave up after {} version conflicts",
            account_id,
            MAX_SAVE_ATTEMPTS
        )))
    }

    /// Read-only projection of the current ledger: no mutation, no oracle.
    pub async fn snapshot(&self, account_id: &str) -> Result<Account, LedgerError> {
        self.store
            .load(account_id)
            .await?
            .map(|(account, _)| account)
            .ok_or(LedgerError::AccountNotFound)
    }
}

fn validate_symbol(symbol: &str) -> Result<(), LedgerError> {
    if symbol.trim().is_empty() {
        return Err(LedgerError::invalid("symbol must not be empty"));
    }
    Ok(())
}
