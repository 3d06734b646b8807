//! The ledger: the ordered collection of all recorded transactions.
//!
//! The ledger is loaded once from a `BlobStore`, mutated only through `add` and `remove`, and
//! written back in full after every mutation. Summary figures are recomputed from scratch on every
//! call.

use crate::clock::Clock;
use crate::error::Res;
use crate::model::{Amount, NewTransaction, Transaction, TransactionType};
use crate::store::BlobStore;
use anyhow::Context;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// The store key that holds the serialized transaction list.
pub const TRANSACTIONS_KEY: &str = "transactions";

/// The description given to the synthetic opening-balance entry.
pub const OPENING_BALANCE_DESCRIPTION: &str = "Initial Balance";

/// The category given to the synthetic opening-balance entry.
pub const OPENING_BALANCE_CATEGORY: &str = "Other";

/// How the ledger keeps its entries ordered after an insert.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Re-sort the whole collection newest-first by date, so back-dated entries land in place.
    #[default]
    ByDate,
    /// Prepend and trust insertion order.
    Insertion,
}

serde_plain::derive_display_from_serialize!(SortPolicy);
serde_plain::derive_fromstr_from_deserialize!(SortPolicy);

/// The account state before tracking began.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct OpeningBalance {
    amount: Amount,
    date: NaiveDateTime,
}

impl OpeningBalance {
    pub fn new(amount: Amount, date: NaiveDateTime) -> Self {
        Self { amount, date }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    fn seed(&self) -> NewTransaction {
        NewTransaction::from_amount(
            OPENING_BALANCE_DESCRIPTION,
            self.amount,
            OPENING_BALANCE_CATEGORY,
            TransactionType::Income,
            self.date,
        )
    }
}

/// The choices that differ between deployments of the ledger.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct LedgerPolicy {
    /// When set, an empty ledger is seeded with this balance on load.
    pub opening_balance: Option<OpeningBalance>,
    pub sort: SortPolicy,
}

/// Totals derived from the whole ledger.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
}

impl Summary {
    /// Sums every transaction. `balance` is always `income - expenses`.
    ///
    /// The arithmetic saturates at `Decimal::MAX` rather than overflowing.
    pub fn of(transactions: &[Transaction]) -> Self {
        let total = |kind: TransactionType| {
            transactions
                .iter()
                .filter(|t| t.transaction_type() == kind)
                .map(|t| t.amount().value())
                .fold(Decimal::ZERO, Decimal::saturating_add)
        };
        let income = total(TransactionType::Income);
        let expenses = total(TransactionType::Expense);
        Self {
            income,
            expenses,
            balance: income.saturating_sub(expenses),
        }
    }
}

/// The ordered collection of transactions, newest first, backed by a `BlobStore`.
#[derive(Debug)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    policy: LedgerPolicy,
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    last_id: i64,
    persisted: bool,
}

impl Ledger {
    /// Loads the ledger from `store`.
    ///
    /// A missing blob, a store that cannot be read, and a blob that cannot be parsed all produce an
    /// empty collection; the failure is logged but never returned. If the collection is empty and
    /// the policy carries an opening balance, a single "Initial Balance" income entry is seeded.
    /// Seeding does not write to the store.
    pub async fn load(
        store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        policy: LedgerPolicy,
    ) -> Self {
        let transactions = read_transactions(store.as_ref()).await;
        let last_id = transactions.iter().map(Transaction::id).max().unwrap_or(0);
        let mut ledger = Self {
            transactions,
            policy,
            store,
            clock,
            last_id,
            persisted: true,
        };

        if ledger.transactions.is_empty() {
            if let Some(opening) = ledger.policy.opening_balance {
                let id = ledger.next_id();
                debug!("Seeding an empty ledger with an opening balance of {}", opening.amount);
                ledger.transactions.push(Transaction::new(id, opening.seed()));
            }
        }
        debug!("Loaded {} transactions", ledger.transactions.len());
        ledger
    }

    /// Records a new transaction and persists the whole collection.
    ///
    /// The entry is placed at the front; under `SortPolicy::ByDate` the collection is then
    /// re-sorted newest-first (stable, so an entry sharing its date with older ones stays ahead of
    /// them). A failed write is logged and reflected in `is_persisted`; the entry stays recorded.
    pub async fn add(&mut self, details: NewTransaction) -> Transaction {
        let transaction = Transaction::new(self.next_id(), details);
        debug!(
            "Adding {} {} of {} dated {}",
            transaction.transaction_type(),
            transaction.id(),
            transaction.amount(),
            transaction.date()
        );
        self.transactions.insert(0, transaction.clone());
        if self.policy.sort == SortPolicy::ByDate {
            self.transactions.sort_by(|a, b| b.date().cmp(&a.date()));
        }
        self.persist().await;
        transaction
    }

    /// Removes the transaction with `id` and persists the whole collection. Returns whether an
    /// entry was removed; an unknown `id` changes nothing.
    pub async fn remove(&mut self, id: i64) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id() != id);
        let removed = self.transactions.len() < before;
        debug!("Remove {id}: {}", if removed { "removed" } else { "not found" });
        self.persist().await;
        removed
    }

    /// Income, expenses and balance over the whole collection.
    pub fn summary(&self) -> Summary {
        Summary::of(&self.transactions)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: i64) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// False if the most recent write to the store failed.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Overwrites the stored blob with the full collection.
    async fn persist(&mut self) {
        match write_transactions(self.store.as_ref(), &self.transactions).await {
            Ok(()) => self.persisted = true,
            Err(e) => {
                warn!("Unable to save transactions, changes are kept in memory only: {e:#}");
                self.persisted = false;
            }
        }
    }

    /// Ids are creation timestamps in milliseconds, bumped past the newest id seen so that two
    /// entries created in the same millisecond (or after the clock stepped back) stay unique.
    fn next_id(&mut self) -> i64 {
        let millis = self.clock.now().timestamp_millis();
        let id = millis.max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }
}

async fn read_transactions(store: &dyn BlobStore) -> Vec<Transaction> {
    let blob = match store.get(TRANSACTIONS_KEY).await {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            debug!("No stored transactions found");
            return Vec::new();
        }
        Err(e) => {
            warn!("Unable to read stored transactions, starting empty: {e:#}");
            return Vec::new();
        }
    };
    match serde_json::from_str(&blob) {
        Ok(transactions) => transactions,
        Err(e) => {
            warn!("Stored transactions could not be parsed, starting empty: {e}");
            Vec::new()
        }
    }
}

async fn write_transactions(store: &dyn BlobStore, transactions: &[Transaction]) -> Res<()> {
    let json = serde_json::to_string(transactions).context("Unable to serialize transactions")?;
    store
        .put(TRANSACTIONS_KEY, &json)
        .await
        .context("Unable to write transactions to the store")
}
