use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its `store` and `.backups` subdirectories, and an initial
/// `config.json` holding the default settings.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of data directory, e.g. `$HOME/budget`
///
/// # Errors
/// - Returns an error if the directory already holds a `config.json`.
/// - Returns an error if any file operations fail.
pub async fn init(budget_home: &Path) -> Result<Out<()>> {
    let config = Config::create(budget_home)
        .await
        .context("Unable to create the data directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the budget directory and config at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("budget");
        let out = init(&home).await.unwrap();
        assert!(out.message().starts_with("Successfully created"));
        assert!(home.join("config.json").is_file());

        let again = init(&home).await.unwrap_err();
        assert_eq!(again.error_type(), ErrorType::Config);
    }
}
