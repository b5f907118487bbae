//! CLI mode
//!
//! Delegates to the actual CLI implementation.

use crate::cli::Commands;
use crate::interfaces::cli::CliError;
use crate::runtime::lifetime;

pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    lifetime::startup::install_crypto_provider();
    crate::interfaces::cli::run_cli_command(cmd).await
}
