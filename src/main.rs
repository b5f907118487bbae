use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use clicktrail::cli::{Cli, Commands};
use clicktrail::config::{get_config, init_config, validate_config};
use clicktrail::runtime::modes::{run_cli, run_server};
use clicktrail::system::init_logging;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config(cli.config.as_deref());
    let config = get_config();

    let needs_valid_config = cli
        .command
        .as_ref()
        .is_none_or(Commands::requires_valid_config);
    if needs_valid_config && let Err(e) = validate_config(&config) {
        eprintln!("{}", e.format_colored());
        return ExitCode::FAILURE;
    }

    match cli.command {
        None | Some(Commands::Serve) => {
            let _guard = init_logging(&config.logging, false);
            match run_server().await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
                    ExitCode::FAILURE
                }
            }
        }
        Some(cmd) => {
            let _guard = init_logging(&config.logging, true);
            match run_cli(cmd).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", e.format_colored());
                    ExitCode::FAILURE
                }
            }
        }
    }
}
