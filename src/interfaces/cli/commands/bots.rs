//! List bot signatures command

use colored::Colorize;
use strum::{EnumMessage, IntoEnumIterator};

use crate::config::{BotSignature, get_config};

pub fn list_bots() {
    let config = get_config();
    let enabled = &config.tracking.bot_signatures;

    println!("{}", "Bot signatures:".bold().green());
    println!();
    for sig in BotSignature::iter() {
        let marker = if enabled.contains(&sig) {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!(
            "  {} {:<22} {:<22} {}",
            marker,
            sig.to_string().cyan(),
            format!("\"{}\"", sig.pattern()),
            sig.get_message().unwrap_or_default().dimmed()
        );
    }

    let extra = &config.tracking.extra_bot_patterns;
    if !extra.is_empty() {
        println!();
        println!("{}", "Extra patterns:".bold());
        for pattern in extra {
            println!("  {} \"{}\"", "+".yellow(), pattern);
        }
    }
}
