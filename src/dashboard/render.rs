//! 报表输出：终端表格、JSON、GeoJSON、CSV

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use colored::Colorize;

use super::metrics::{DashboardReport, geojson};
use crate::errors::{ClicktrailError, Result};
use crate::storage::ClickRecord;

/// 百分比，None 显示为 n/a
pub fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn format_ratio(ratio: Option<f64>) -> String {
    ratio
        .map(|r| format!("{:.2}", r))
        .unwrap_or_else(|| "n/a".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn metric(label: &str, value: impl std::fmt::Display) {
    println!("  {:<24} {}", label, value.to_string().green());
}

pub fn print_report(report: &DashboardReport) {
    let s = &report.summary;

    println!(
        "{} {}",
        "Click dashboard".bold().magenta(),
        format!("(generated {})", report.generated_at.format("%Y-%m-%d %H:%M UTC")).dimmed()
    );
    println!();

    println!("{}", "Clicks".bold());
    metric("Total clicks", s.total_clicks);
    metric("Clicks (7 days)", s.clicks_7d);
    metric("Unique IPs", s.unique_ips);
    metric("Located clicks", s.located_clicks);
    println!();

    println!("{}", "DMs".bold());
    metric("Total DMs", s.total_dms);
    metric("DMs sent", s.dms_sent);
    metric("DMs failed", s.dms_failed);
    metric("Success rate", format_rate(s.dm_success_rate));
    metric("DMs sent (7 days)", s.dms_sent_7d);
    metric("Click-through rate", format_rate(s.click_through_rate));
    metric("Clicks per DM (7 days)", format_ratio(s.clicks_per_dm_7d));
    println!();

    println!("{}", "Weekly".bold());
    println!(
        "  {}",
        format!("{:<12} {:<12} {:>8} {:>10}", "From", "To", "Clicks", "DMs sent").dimmed()
    );
    for row in &report.weekly {
        println!(
            "  {:<12} {:<12} {:>8} {:>10}",
            row.start.format("%Y-%m-%d"),
            row.end.format("%Y-%m-%d"),
            row.clicks.to_string().cyan(),
            row.dms_sent.to_string().cyan()
        );
    }
    println!();

    println!("{}", "Top subreddits".bold());
    if report.top_subreddits.is_empty() {
        println!("  {}", "No DMs sent yet".dimmed());
    }
    for (rank, row) in report.top_subreddits.iter().enumerate() {
        println!(
            "  {:>2}. {:<28} {}",
            rank + 1,
            truncate(&row.subreddit, 28).cyan(),
            row.dms_sent
        );
    }
    println!();

    println!("{}", "Recent clicks".bold());
    if report.recent_clicks.is_empty() {
        println!("  {}", "No clicks recorded yet".dimmed());
    }
    for click in &report.recent_clicks {
        let location = click
            .coordinates()
            .map(|(lat, lon)| format!("{:.3},{:.3}", lat, lon))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {:<39} {:<18} {}",
            click.ts.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            click.ip.yellow(),
            location,
            truncate(&click.user_agent, 48).dimmed()
        );
    }

    if let Some(backfill) = &report.backfill {
        println!();
        println!(
            "{} {} resolved, {} unresolved, {} skipped, {} rows updated",
            "ℹ Backfill:".bold().blue(),
            backfill.resolved_ips.to_string().green(),
            backfill.unresolved_ips.to_string().yellow(),
            backfill.skipped_ips,
            backfill.rows_updated
        );
    }
}

pub fn render_json(report: &DashboardReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// 写出 GeoJSON，返回 feature 数
pub fn write_geojson(path: &Path, clicks: &[ClickRecord]) -> Result<usize> {
    let collection = geojson(clicks);
    let count = collection["features"].as_array().map_or(0, Vec::len);

    let file = File::create(path).map_err(|e| {
        ClicktrailError::file_operation(format!("Failed to create {}: {}", path.display(), e))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &collection)?;
    Ok(count)
}

/// 写出全部点击为 CSV，返回行数
pub fn write_csv(path: &Path, clicks: &[ClickRecord]) -> Result<usize> {
    let file = File::create(path).map_err(|e| {
        ClicktrailError::file_operation(format!("Failed to create {}: {}", path.display(), e))
    })?;
    let mut writer = csv::WriterBuilder::new().from_writer(BufWriter::new(file));
    for click in clicks {
        writer.serialize(click)?;
    }
    writer.flush()?;
    Ok(clicks.len())
}
