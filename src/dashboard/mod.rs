//! Dashboard
//!
//! 读取 clicks 与 dm_log 两张表，回填缺失坐标，输出指标、表格和地图数据。

pub mod backfill;
pub mod metrics;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::services::GeoLocator;
use crate::storage::SeaOrmStorage;

pub use backfill::{BackfillSummary, backfill_coordinates};
pub use metrics::{
    DEFAULT_WEEKS, DashboardReport, MAX_WEEKS, Summary, SubredditRow, WeeklyRow,
};

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub weeks: u32,
    pub backfill: bool,
    pub geojson_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
    /// 输出 JSON 而不是终端表格
    pub json: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            weeks: DEFAULT_WEEKS,
            backfill: true,
            geojson_path: None,
            csv_path: None,
            json: false,
        }
    }
}

/// 生成报表（回填 → 读取 → 聚合），不做任何输出
pub async fn build_report(
    storage: &SeaOrmStorage,
    locator: Option<&Arc<dyn GeoLocator>>,
    options: &DashboardOptions,
) -> Result<DashboardReport> {
    let backfill = match (options.backfill, locator) {
        (true, Some(locator)) => Some(backfill_coordinates(storage, &**locator).await?),
        (true, None) => {
            warn!("Geolocation disabled, skipping coordinate backfill");
            None
        }
        (false, _) => None,
    };

    let clicks = storage.load_clicks().await?;
    let dms = storage.load_dm_logs().await?;
    debug!(
        "Building dashboard over {} clicks and {} DM log entries",
        clicks.len(),
        dms.len()
    );

    let report = DashboardReport::build(&clicks, &dms, Utc::now(), options.weeks.max(1));
    Ok(match backfill {
        Some(summary) => report.with_backfill(summary),
        None => report,
    })
}

/// 生成报表并按选项输出 / 导出
pub async fn run_dashboard(
    storage: &SeaOrmStorage,
    locator: Option<&Arc<dyn GeoLocator>>,
    options: &DashboardOptions,
) -> Result<DashboardReport> {
    let report = build_report(storage, locator, options).await?;

    if options.geojson_path.is_some() || options.csv_path.is_some() {
        let clicks = storage.load_clicks().await?;
        if let Some(path) = &options.geojson_path {
            let features = render::write_geojson(path, &clicks)?;
            eprintln!("Wrote {} map points to {}", features, path.display());
        }
        if let Some(path) = &options.csv_path {
            let rows = render::write_csv(path, &clicks)?;
            eprintln!("Wrote {} clicks to {}", rows, path.display());
        }
    }

    if options.json {
        println!("{}", render::render_json(&report)?);
    } else {
        render::print_report(&report);
    }

    Ok(report)
}
