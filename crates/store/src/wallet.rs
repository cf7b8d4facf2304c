//! Ad wallet ledger — per-establishment balance with an append-only
//! entry log. The debit is the one failure-atomic primitive the
//! impression biller depends on: either the balance moves and an
//! entry is written, or nothing happens.

use adserve_core::types::{LedgerEntry, LedgerEntryType};
use adserve_core::{AdserveError, AdserveResult};
use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory wallet ledger.
pub struct WalletLedger {
    /// establishment_id -> balance in cents
    balances: DashMap<Uuid, i64>,
    /// establishment_id -> ledger entries
    entries: DashMap<Uuid, Vec<LedgerEntry>>,
}

impl WalletLedger {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            entries: DashMap::new(),
        }
    }

    /// Open a wallet (idempotent) and credit it.
    pub fn credit(&self, establishment_id: Uuid, cents: i64, description: &str) -> LedgerEntry {
        *self.balances.entry(establishment_id).or_insert(0) += cents;
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            establishment_id,
            amount_cents: cents,
            entry_type: LedgerEntryType::Credit,
            reference_id: None,
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.entries
            .entry(establishment_id)
            .or_default()
            .push(entry.clone());
        entry
    }

    /// Atomically debit an establishment's wallet. Fails without any
    /// state change on an unknown wallet or insufficient balance.
    pub fn debit(
        &self,
        establishment_id: Uuid,
        cents: i64,
        entry_type: LedgerEntryType,
        reference_id: Option<Uuid>,
        description: &str,
    ) -> AdserveResult<LedgerEntry> {
        if cents <= 0 {
            return Err(AdserveError::Validation(format!(
                "debit amount must be positive, got {cents}"
            )));
        }

        // The map entry guard holds the balance lock across the
        // check-and-decrement.
        let mut balance = self.balances.get_mut(&establishment_id).ok_or_else(|| {
            AdserveError::Wallet(format!("no wallet for establishment {establishment_id}"))
        })?;
        if *balance < cents {
            return Err(AdserveError::Wallet(format!(
                "insufficient balance: {} cents available, {} requested",
                *balance, cents
            )));
        }
        *balance -= cents;
        drop(balance);

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            establishment_id,
            amount_cents: -cents,
            entry_type,
            reference_id,
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.entries
            .entry(establishment_id)
            .or_default()
            .push(entry.clone());

        info!(
            establishment_id = %establishment_id,
            cents,
            ?entry_type,
            "wallet debited"
        );
        Ok(entry)
    }

    pub fn balance(&self, establishment_id: Uuid) -> Option<i64> {
        self.balances.get(&establishment_id).map(|b| *b)
    }

    pub fn entries(&self, establishment_id: Uuid) -> Vec<LedgerEntry> {
        self.entries
            .get(&establishment_id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Default for WalletLedger {
    fn default() -> Self {
        Self::new()
    }
}
