//! Backup / restore commands

use colored::Colorize;
use std::sync::Arc;

use crate::config::get_config;
use crate::interfaces::cli::CliError;
use crate::services::BackupService;
use crate::storage::SeaOrmStorage;

fn backup_service(storage: Arc<SeaOrmStorage>) -> Result<Arc<BackupService>, CliError> {
    BackupService::from_config(&get_config().backup, storage)?.ok_or_else(|| {
        CliError::ConfigError(
            "Backup is not configured: set backup.gist_id and backup.token (or GIST_ID and GITHUB_TOKEN)"
                .to_string(),
        )
    })
}

pub async fn backup_now(storage: Arc<SeaOrmStorage>) -> Result<(), CliError> {
    let service = backup_service(storage)?;
    let size = service.upload_now().await?;

    println!(
        "{} Uploaded {} bytes to {} backup",
        "✓".bold().green(),
        size.to_string().cyan(),
        service.store_name()
    );
    Ok(())
}

pub async fn restore_now(storage: Arc<SeaOrmStorage>) -> Result<(), CliError> {
    let service = backup_service(storage.clone())?;
    let applied = service.restore().await?;
    let total = storage.count_clicks().await?;

    println!(
        "{} Applied {} statements from {} backup, {} clicks stored",
        "✓".bold().green(),
        applied.to_string().cyan(),
        service.store_name(),
        total.to_string().cyan()
    );
    Ok(())
}
