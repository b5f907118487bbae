//! 坐标回填
//!
//! 对缺少坐标的每个去重 IP 做一次地理定位，成功后写回该 IP 的所有记录。

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::Result;
use crate::services::GeoLocator;
use crate::storage::SeaOrmStorage;
use crate::utils::ip::is_routable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    /// 缺坐标的去重 IP 数
    pub candidates: usize,
    pub resolved_ips: usize,
    pub unresolved_ips: usize,
    /// 私有 / 无法解析的 IP
    pub skipped_ips: usize,
    pub rows_updated: u64,
}

pub async fn backfill_coordinates(
    storage: &SeaOrmStorage,
    locator: &dyn GeoLocator,
) -> Result<BackfillSummary> {
    let ips = storage.ips_missing_coordinates().await?;
    let mut summary = BackfillSummary {
        candidates: ips.len(),
        ..Default::default()
    };

    for ip in &ips {
        if !is_routable(ip) {
            summary.skipped_ips += 1;
            continue;
        }

        match locator.locate(ip).await.point() {
            Some(point) => {
                summary.rows_updated += storage
                    .set_coordinates_for_ip(ip, point.latitude, point.longitude)
                    .await?;
                summary.resolved_ips += 1;
            }
            None => {
                debug!("Backfill: {} still unresolved", ip);
                summary.unresolved_ips += 1;
            }
        }
    }

    info!(
        "Backfill finished: {} resolved, {} unresolved, {} skipped ({} rows updated)",
        summary.resolved_ips, summary.unresolved_ips, summary.skipped_ips, summary.rows_updated
    );
    Ok(summary)
}
