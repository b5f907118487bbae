//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// clicktrail - click tracker with a 302 redirect
#[derive(Parser)]
#[command(name = "clicktrail")]
#[command(version)]
#[command(about = "Logs visits to a tracking path and redirects them", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Create or upgrade the database schema
    InitDb,

    /// Show click and DM metrics
    Dashboard {
        /// Number of 7-day windows in the weekly table (1-520)
        #[arg(
            long,
            default_value_t = crate::dashboard::DEFAULT_WEEKS,
            value_parser = clap::value_parser!(u32).range(1..=crate::dashboard::MAX_WEEKS as i64)
        )]
        weeks: u32,

        /// Skip geolocating clicks that have no coordinates
        #[arg(long)]
        no_backfill: bool,

        /// Write located clicks as GeoJSON
        #[arg(long, value_name = "PATH")]
        geojson: Option<String>,

        /// Write all clicks as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump clicks and upload them to the configured gist now
    Backup,

    /// Download the gist backup and load it now
    Restore,

    /// Write the SQL dump of the clicks table
    Dump {
        /// Output file path (default: stdout)
        path: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

impl Commands {
    /// `config` 子命令用于生成 / 查看配置，不要求当前配置合法
    pub fn requires_valid_config(&self) -> bool {
        !matches!(self, Commands::Config { .. })
    }
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },

    /// List built-in bot signatures
    Bots,
}
