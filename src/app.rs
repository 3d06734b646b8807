//! The application context that every command runs against.

use crate::backup::{self, Backup};
use crate::clock::{Clock, SystemClock};
use crate::ledger::{Ledger, TRANSACTIONS_KEY};
use crate::model::{NewTransaction, Transaction};
use crate::render::{render, View};
use crate::store::{BlobStore, FileStore};
use crate::Config;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns the loaded `Config`, the `Ledger` and the `Clock` for the life of the process.
///
/// The first mutation in a session copies the stored blob into the backups directory before it is
/// overwritten.
#[derive(Debug)]
pub struct App {
    config: Config,
    ledger: Ledger,
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    backup: Backup,
    backup_taken: bool,
}

impl App {
    /// Loads the ledger from `$BUDGET_HOME/store` using the system clock.
    pub async fn load(config: Config) -> Self {
        let store = Arc::new(FileStore::new(config.store_dir()));
        Self::load_with(config, store, Arc::new(SystemClock)).await
    }

    /// Loads the ledger from `store`, taking the time from `clock`.
    pub async fn load_with(
        config: Config,
        store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = Ledger::load(store.clone(), clock.clone(), config.ledger_policy()).await;
        let backup = config.backup();
        Self {
            config,
            ledger,
            store,
            clock,
            backup,
            backup_taken: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// The current local time, truncated to seconds.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.naive_now()
    }

    /// Records `details` in the ledger.
    pub async fn add(&mut self, details: NewTransaction) -> Transaction {
        self.backup_once().await;
        self.ledger.add(details).await
    }

    /// Removes the transaction with `id`. Returns whether anything was removed.
    pub async fn remove(&mut self, id: i64) -> bool {
        self.backup_once().await;
        self.ledger.remove(id).await
    }

    /// The formatted ledger as of now.
    pub fn view(&self) -> View {
        render(
            &self.ledger.summary(),
            self.ledger.transactions(),
            self.now(),
        )
    }

    /// Copies the stored blob aside, once per session. Failures are logged and do not stop the
    /// mutation.
    async fn backup_once(&mut self) {
        if self.backup_taken {
            return;
        }
        self.backup_taken = true;
        let blob = match self.store.get(TRANSACTIONS_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!("Nothing stored yet, skipping the backup");
                return;
            }
            Err(e) => {
                warn!("Unable to read transactions for a backup: {e:#}");
                return;
            }
        };
        match self.backup.save_json(backup::TRANSACTIONS, &blob).await {
            Ok(path) => debug!("Backed up transactions to {}", path.display()),
            Err(e) => warn!("Unable to back up transactions: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;
    use crate::test::TestEnv;

    async fn count_backups(env: &TestEnv) -> usize {
        let mut count = 0;
        let mut dir = crate::utils::read_dir(env.config().backups()).await.unwrap();
        while dir.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }

    fn expense(app: &App, description: &str, amount: &str) -> NewTransaction {
        let kind = TransactionType::Expense;
        NewTransaction::parse(description, amount, "Food", kind, app.now()).unwrap()
    }

    #[tokio::test]
    async fn test_first_run_seeds_and_renders() {
        let env = TestEnv::new().await;
        let app = env.app().await;
        let view = app.view();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.balance, "$18,957.40");
        assert_eq!(view.rows[0].description, "Initial Balance");
    }

    #[tokio::test]
    async fn test_no_backup_when_nothing_stored() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let details = expense(&app, "Groceries", "42.50");
        app.add(details).await;
        assert_eq!(count_backups(&env).await, 0);
        assert_eq!(app.view().balance, "$18,914.90");
    }

    #[tokio::test]
    async fn test_backup_once_per_session() {
        let env = TestEnv::new().await;
        {
            let mut app = env.app().await;
            let details = expense(&app, "Groceries", "42.50");
            app.add(details).await;
        }

        let mut app = env.app().await;
        let first = expense(&app, "Coffee", "3.25");
        app.add(first).await;
        let second = expense(&app, "Bus", "2.75");
        app.add(second).await;
        assert_eq!(count_backups(&env).await, 1);
        assert_eq!(app.ledger().len(), 4);
    }

    #[tokio::test]
    async fn test_view_follows_the_clock() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let details = expense(&app, "Groceries", "42.50");
        app.add(details).await;
        assert_eq!(app.view().rows[0].date, "Today at 12:00 PM");

        env.clock().advance(chrono::TimeDelta::days(1));
        assert_eq!(app.view().rows[0].date, "Yesterday at 12:00 PM");
    }

    #[tokio::test]
    async fn test_changes_survive_reload() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let details = expense(&app, "Groceries", "42.50");
        let added = app.add(details).await;

        let reloaded = env.app().await;
        assert_eq!(reloaded.ledger().transactions(), app.ledger().transactions());

        let mut app = reloaded;
        assert!(app.remove(added.id()).await);
        assert!(!app.remove(added.id()).await);
        assert_eq!(env.app().await.ledger().len(), 1);
    }
}
