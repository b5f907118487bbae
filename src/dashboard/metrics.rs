//! 报表聚合
//!
//! 纯函数：输入已加载的点击和 DM 记录以及当前时间，输出报表结构。

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use super::backfill::BackfillSummary;
use crate::storage::{ClickRecord, DmLogRecord};

/// "最近" 窗口长度（天）
pub const RECENT_WINDOW_DAYS: i64 = 7;
/// 默认周数
pub const DEFAULT_WEEKS: u32 = 8;
/// 周表上限（约十年）
pub const MAX_WEEKS: u32 = 520;
pub const TOP_SUBREDDITS: usize = 10;
pub const RECENT_CLICKS: usize = 20;

const UNKNOWN_SUBREDDIT: &str = "(unknown)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_clicks: usize,
    pub clicks_7d: usize,
    pub unique_ips: usize,
    pub located_clicks: usize,
    pub total_dms: usize,
    pub dms_sent: usize,
    pub dms_failed: usize,
    /// sent / total，没有 DM 时为 None
    pub dm_success_rate: Option<f64>,
    pub dms_sent_7d: usize,
    /// clicks / sent DMs，没有发送成功的 DM 时为 None
    pub click_through_rate: Option<f64>,
    pub clicks_per_dm_7d: Option<f64>,
}

/// 一个 7 天窗口 `(start, end]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyRow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub clicks: usize,
    pub dms_sent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubredditRow {
    pub subreddit: String,
    pub dms_sent: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    /// 由旧到新
    pub weekly: Vec<WeeklyRow>,
    pub top_subreddits: Vec<SubredditRow>,
    /// 由新到旧
    pub recent_clicks: Vec<ClickRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backfill: Option<BackfillSummary>,
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

fn in_window(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    ts > start && ts <= end
}

impl Summary {
    pub fn build(clicks: &[ClickRecord], dms: &[DmLogRecord], now: DateTime<Utc>) -> Self {
        let since = now - Duration::days(RECENT_WINDOW_DAYS);

        let clicks_7d = clicks.iter().filter(|c| in_window(c.ts, since, now)).count();
        let unique_ips = clicks
            .iter()
            .map(|c| c.ip.as_str())
            .collect::<HashSet<_>>()
            .len();
        let located_clicks = clicks.iter().filter(|c| c.coordinates().is_some()).count();

        let dms_sent = dms.iter().filter(|d| d.is_sent()).count();
        let dms_failed = dms.iter().filter(|d| d.is_failed()).count();
        let dms_sent_7d = dms
            .iter()
            .filter(|d| d.is_sent() && in_window(d.ts, since, now))
            .count();

        Self {
            total_clicks: clicks.len(),
            clicks_7d,
            unique_ips,
            located_clicks,
            total_dms: dms.len(),
            dms_sent,
            dms_failed,
            dm_success_rate: ratio(dms_sent, dms.len()),
            dms_sent_7d,
            click_through_rate: ratio(clicks.len(), dms_sent),
            clicks_per_dm_7d: ratio(clicks_7d, dms_sent_7d),
        }
    }
}

/// 最近 `weeks` 个 7 天窗口，最后一个窗口截止于 `now`，最多 `MAX_WEEKS` 个
pub fn weekly_rows(
    clicks: &[ClickRecord],
    dms: &[DmLogRecord],
    now: DateTime<Utc>,
    weeks: u32,
) -> Vec<WeeklyRow> {
    (0..weeks.min(MAX_WEEKS) as i64)
        .rev()
        .map(|i| {
            let end = now - Duration::days(RECENT_WINDOW_DAYS * i);
            let start = end - Duration::days(RECENT_WINDOW_DAYS);
            WeeklyRow {
                start,
                end,
                clicks: clicks.iter().filter(|c| in_window(c.ts, start, end)).count(),
                dms_sent: dms
                    .iter()
                    .filter(|d| d.is_sent() && in_window(d.ts, start, end))
                    .count(),
            }
        })
        .collect()
}

/// 按发送成功数排序的 subreddit
pub fn top_subreddits(dms: &[DmLogRecord], limit: usize) -> Vec<SubredditRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for dm in dms.iter().filter(|d| d.is_sent()) {
        let name = dm
            .subreddit
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SUBREDDIT);
        *counts.entry(name).or_default() += 1;
    }

    let mut rows: Vec<SubredditRow> = counts
        .into_iter()
        .map(|(subreddit, dms_sent)| SubredditRow {
            subreddit: subreddit.to_string(),
            dms_sent,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.dms_sent
            .cmp(&a.dms_sent)
            .then_with(|| a.subreddit.cmp(&b.subreddit))
    });
    rows.truncate(limit);
    rows
}

/// 最新的 `limit` 条点击
pub fn recent_clicks(clicks: &[ClickRecord], limit: usize) -> Vec<ClickRecord> {
    let mut sorted: Vec<&ClickRecord> = clicks.iter().collect();
    sorted.sort_by(|a, b| b.ts.cmp(&a.ts).then_with(|| b.id.cmp(&a.id)));
    sorted.into_iter().take(limit).cloned().collect()
}

/// 已定位点击的 GeoJSON FeatureCollection（坐标顺序为 `[lon, lat]`）
pub fn geojson(clicks: &[ClickRecord]) -> Value {
    let features: Vec<Value> = clicks
        .iter()
        .filter_map(|c| c.coordinates().map(|coords| (c, coords)))
        .map(|(c, (lat, lon))| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [lon, lat] },
                "properties": { "id": c.id, "ts": c.ts.to_rfc3339(), "ip": c.ip },
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features })
}

impl DashboardReport {
    pub fn build(
        clicks: &[ClickRecord],
        dms: &[DmLogRecord],
        now: DateTime<Utc>,
        weeks: u32,
    ) -> Self {
        Self {
            generated_at: now,
            summary: Summary::build(clicks, dms, now),
            weekly: weekly_rows(clicks, dms, now, weeks),
            top_subreddits: top_subreddits(dms, TOP_SUBREDDITS),
            recent_clicks: recent_clicks(clicks, RECENT_CLICKS),
            backfill: None,
        }
    }

    pub fn with_backfill(mut self, summary: BackfillSummary) -> Self {
        self.backfill = Some(summary);
        self
    }
}
