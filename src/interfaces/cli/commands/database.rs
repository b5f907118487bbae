//! Schema and dump commands

use colored::Colorize;
use std::sync::Arc;

use crate::interfaces::cli::CliError;
use crate::storage::SeaOrmStorage;

/// Storage 创建时已经跑过迁移，这里再跑一次确认幂等
pub async fn init_db(storage: Arc<SeaOrmStorage>) -> Result<(), CliError> {
    storage.ensure_schema().await?;
    let clicks = storage.count_clicks().await?;

    println!(
        "{} {} schema is ready ({} clicks)",
        "✓".bold().green(),
        storage.backend_name().to_uppercase(),
        clicks.to_string().cyan()
    );
    Ok(())
}

pub async fn dump_clicks(storage: Arc<SeaOrmStorage>, path: Option<String>) -> Result<(), CliError> {
    let dump = storage.dump_clicks_sql().await?;

    match path {
        Some(path) => {
            std::fs::write(&path, &dump).map_err(|e| {
                CliError::CommandError(format!("Failed to write dump to '{}': {}", path, e))
            })?;
            eprintln!(
                "{} Dump written to {} ({} bytes)",
                "✓".bold().green(),
                path.blue(),
                dump.len()
            );
        }
        None => print!("{}", dump),
    }
    Ok(())
}
