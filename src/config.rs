//! Configuration file handling for the budget tracker.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json` and contains the ledger policy
//! (opening balance and ordering), the category list, the reminder times and backup settings.

use crate::backup::Backup;
use crate::error::Res;
use crate::ledger::{LedgerPolicy, OpeningBalance, SortPolicy};
use crate::model::{Amount, DEFAULT_CATEGORIES};
use crate::reminder::DailySlot;
use crate::utils;
use anyhow::{bail, Context};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_NAME: &str = "budget";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const STORE: &str = "store";
const CONFIG_JSON: &str = "config.json";
const OPENING_BALANCE_AMOUNT: &str = "18957.40";
const OPENING_BALANCE_DATE: &str = "2026-01-06T00:00:00";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`. It provides
/// paths to the other items that are expected in a certain location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    store_dir: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its subdirectories and an initial `config.json` holding the
    /// default settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/budget`
    ///
    /// # Errors
    /// - Returns an error if `config.json` already exists in `dir`.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Res<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if utils::exists(&config_path).await? {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            )
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let store_dir = root.join(STORE);
        utils::make_dir(&store_dir).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups,
            store_dir,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `budget_home` exists and that the config file exists
    /// - load and validate the config file
    /// - validate that the backups and store directories exist
    /// - return the loaded configuration object
    pub async fn load(budget_home: impl Into<PathBuf>) -> Res<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Budget Home is missing, run 'budget init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            store_dir: root.join(STORE),
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.store_dir.is_dir() {
            bail!(
                "The store directory is missing '{}'",
                config.store_dir.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    /// The directory that `FileStore` keeps its blobs in.
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy {
            opening_balance: self.config_file.opening_balance,
            sort: self.config_file.ordering,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.config_file.categories
    }

    pub fn reminder_slots(&self) -> &[DailySlot] {
        &self.config_file.reminders
    }

    /// When false, reminders behave as if notification permission had been denied.
    pub fn notifications_enabled(&self) -> bool {
        self.config_file.notifications
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget",
///   "config_version": 1,
///   "backup_copies": 5,
///   "opening_balance": { "amount": 18957.4, "date": "2026-01-06T00:00:00" },
///   "ordering": "by_date",
///   "categories": ["Food", "Transport", "Shopping", "Bills"],
///   "reminders": [{ "hour": 14, "minute": 0 }, { "hour": 21, "minute": 0 }],
///   "notifications": true
/// }
/// ```
///
/// Everything except `app_name` and `config_version` may be left out. A missing `opening_balance`
/// means an empty ledger stays empty.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    opening_balance: Option<OpeningBalance>,

    #[serde(default)]
    ordering: SortPolicy,

    #[serde(default = "default_categories")]
    categories: Vec<String>,

    /// Daily reminder times, local time
    #[serde(default = "DailySlot::defaults")]
    reminders: Vec<DailySlot>,

    #[serde(default = "default_true")]
    notifications: bool,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_opening_balance() -> Option<OpeningBalance> {
    let amount = Amount::from_str(OPENING_BALANCE_AMOUNT).ok()?;
    let date = NaiveDateTime::parse_from_str(OPENING_BALANCE_DATE, "%Y-%m-%dT%H:%M:%S").ok()?;
    Some(OpeningBalance::new(amount, date))
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            opening_balance: default_opening_balance(),
            ordering: SortPolicy::default(),
            categories: default_categories(),
            reminders: DailySlot::defaults(),
            notifications: true,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it is not a budget config
    pub async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    #[cfg(test)]
    /// Creates a new ConfigFile with the specified settings and defaults for the rest.
    pub fn new(
        backup_copies: u32,
        opening_balance: Option<OpeningBalance>,
        ordering: SortPolicy,
        reminders: Vec<DailySlot>,
    ) -> Self {
        Self {
            backup_copies,
            opening_balance,
            ordering,
            reminders,
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl Config {
    /// Overwrites `config.json` with `config_file` and reloads.
    async fn rewrite(self, config_file: ConfigFile) -> Self {
        config_file.save(&self.config_path).await.unwrap();
        Config::load(&self.root).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    async fn write_json(path: &Path, json: &str) {
        let mut file = tokio::fs::File::create(path).await.unwrap();
        file.write_all(json.as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("budget_home");

        let config = Config::create(&home_dir).await.unwrap();

        assert!(config.backups().is_dir());
        assert!(config.store_dir().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(config.backup_copies(), 5);
        assert!(config.notifications_enabled());
        assert_eq!(config.categories().len(), 8);
        assert_eq!(config.reminder_slots(), DailySlot::defaults().as_slice());

        let policy = config.ledger_policy();
        assert_eq!(policy.sort, SortPolicy::ByDate);
        let opening = policy.opening_balance.unwrap();
        assert_eq!(opening.amount().value(), Decimal::from_str("18957.40").unwrap());
        assert_eq!(opening.date().to_string(), "2026-01-06 00:00:00");
    }

    #[tokio::test]
    async fn test_config_create_refuses_existing() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        let second = Config::create(dir.path()).await;
        assert!(second.unwrap_err().to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_config_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path()).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.config_file, loaded.config_file);
        assert_eq!(created.root(), loaded.root());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_store_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();
        tokio::fs::remove_dir(config.store_dir()).await.unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("store directory is missing"));
    }

    #[tokio::test]
    async fn test_config_rewrite_policy() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();
        let slots = vec![DailySlot::new(8, 30).unwrap()];
        let file = ConfigFile::new(2, None, SortPolicy::Insertion, slots);
        let config = config.rewrite(file).await;
        assert_eq!(config.backup_copies(), 2);
        assert_eq!(config.ledger_policy().opening_balance, None);
        assert_eq!(config.ledger_policy().sort, SortPolicy::Insertion);
        assert_eq!(config.reminder_slots()[0].label(), "8:30am");
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        write_json(
            &config_path,
            r#"{
                "app_name": "budget",
                "config_version": 1
            }"#,
        )
        .await;

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.backup_copies, 5);
        assert_eq!(config.opening_balance, None);
        assert_eq!(config.ordering, SortPolicy::ByDate);
        assert_eq!(config.reminders, DailySlot::defaults());
        assert!(config.notifications);
        assert_eq!(config.categories[0], "Food");
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        write_json(
            &config_path,
            r#"{ "app_name": "ledger", "config_version": 1 }"#,
        )
        .await;

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_reminder() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        write_json(
            &config_path,
            r#"{
                "app_name": "budget",
                "config_version": 1,
                "reminders": [{ "hour": 14, "minute": 75 }]
            }"#,
        )
        .await;

        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original = ConfigFile::new(
            7,
            default_opening_balance(),
            SortPolicy::Insertion,
            vec![DailySlot::new(21, 0).unwrap()],
        );
        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);

        let text = utils::read(&config_path).await.unwrap();
        assert!(text.contains(r#""ordering": "insertion""#));
        assert!(text.contains(r#""amount": 18957.4"#));
    }

    #[test]
    fn test_config_file_serialization_omits_missing_opening_balance() {
        let config = ConfigFile::new(5, None, SortPolicy::ByDate, DailySlot::defaults());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("opening_balance"));
    }
}
