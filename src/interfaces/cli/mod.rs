//! CLI interface module

pub mod commands;

use std::fmt;
use std::sync::Arc;

use crate::cli::{Commands, ConfigCommands};
use crate::config::get_config;
use crate::storage::{SeaOrmStorage, StorageFactory};
use commands::{
    backup_now, config_generate, dump_clicks, init_db, list_bots, restore_now, show_dashboard,
};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ConfigError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ConfigError(msg) => format!("Config error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ConfigError(msg) => {
                format!("{} {}", "Config error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::ClicktrailError> for CliError {
    fn from(err: crate::errors::ClicktrailError) -> Self {
        use crate::errors::ClicktrailError as E;
        match err {
            E::Config(_) => CliError::ConfigError(err.message().to_string()),
            E::DatabaseConfig(_) | E::DatabaseConnection(_) | E::DatabaseOperation(_) => {
                CliError::StorageError(err.message().to_string())
            }
            _ => CliError::CommandError(err.to_string()),
        }
    }
}

async fn open_storage() -> Result<Arc<SeaOrmStorage>, CliError> {
    StorageFactory::create(&get_config().database)
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        // 不需要数据库的命令
        Commands::Config { action } => match action {
            ConfigCommands::Generate { output_path, force } => {
                config_generate(output_path, force).await
            }
            ConfigCommands::Bots => {
                list_bots();
                Ok(())
            }
        },

        Commands::Serve => Err(CliError::CommandError(
            "serve runs the HTTP server, not a one-shot command".to_string(),
        )),

        Commands::InitDb => init_db(open_storage().await?).await,

        Commands::Dashboard {
            weeks,
            no_backfill,
            geojson,
            csv,
            json,
        } => {
            let options = crate::dashboard::DashboardOptions {
                weeks,
                backfill: !no_backfill,
                geojson_path: geojson.map(Into::into),
                csv_path: csv.map(Into::into),
                json,
            };
            show_dashboard(open_storage().await?, options).await
        }

        Commands::Backup => backup_now(open_storage().await?).await,

        Commands::Restore => restore_now(open_storage().await?).await,

        Commands::Dump { path } => dump_clicks(open_storage().await?, path).await,
    }
}
