//! 点击记录流水线
//!
//! 过滤（爬虫 / 去重 cookie） → 地理定位 → 写库 → 后台备份。
//! HTTP 层只负责提取请求信息和组装响应。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, trace};

use crate::config::TrackingConfig;
use crate::errors::Result;
use crate::services::backup::BackupService;
use crate::services::bot_filter::BotFilter;
use crate::services::geoip::{GeoLocator, GeoResolution};
use crate::storage::{ClickRecord, NewClick, SeaOrmStorage};
use crate::utils::ip::is_routable;

/// 是否记录本次访问
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitDecision {
    Record,
    /// 已带去重 cookie
    SkipCookie,
    /// User-Agent 命中爬虫子串
    SkipBot(String),
}

impl VisitDecision {
    pub fn should_record(&self) -> bool {
        matches!(self, VisitDecision::Record)
    }
}

impl std::fmt::Display for VisitDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisitDecision::Record => write!(f, "record"),
            VisitDecision::SkipCookie => write!(f, "skip (cookie present)"),
            VisitDecision::SkipBot(pattern) => write!(f, "skip (bot: {})", pattern),
        }
    }
}

pub struct ClickTracker {
    storage: Arc<SeaOrmStorage>,
    geoip: Option<Arc<dyn GeoLocator>>,
    backup: Option<Arc<BackupService>>,
    bot_filter: BotFilter,
    settings: TrackingConfig,
}

impl ClickTracker {
    pub fn new(storage: Arc<SeaOrmStorage>, settings: TrackingConfig) -> Self {
        Self {
            storage,
            geoip: None,
            backup: None,
            bot_filter: BotFilter::from_config(&settings),
            settings,
        }
    }

    pub fn with_geoip(mut self, locator: Arc<dyn GeoLocator>) -> Self {
        self.geoip = Some(locator);
        self
    }

    pub fn with_backup(mut self, backup: Arc<BackupService>) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn settings(&self) -> &TrackingConfig {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    /// 爬虫判断优先于 cookie
    pub fn decide(&self, user_agent: &str, has_cookie: bool) -> VisitDecision {
        if let Some(pattern) = self.bot_filter.matches(user_agent) {
            return VisitDecision::SkipBot(pattern.to_string());
        }
        if has_cookie {
            return VisitDecision::SkipCookie;
        }
        VisitDecision::Record
    }

    /// 地理定位；未启用或 IP 不可路由时返回 `None`
    pub async fn locate(&self, ip: &str) -> Option<GeoResolution> {
        let locator = self.geoip.as_ref()?;
        if !is_routable(ip) {
            trace!("Skipping geolocation for non-routable IP {}", ip);
            return None;
        }
        Some(locator.locate(ip).await)
    }

    /// 写入一条访问记录，地理定位失败时坐标留空
    pub async fn record(&self, ip: String, user_agent: String) -> Result<ClickRecord> {
        let geo = self.locate(&ip).await;
        if let Some(outcome) = &geo
            && !outcome.is_resolved()
        {
            debug!("Geolocation for {} not resolved: {}", ip, outcome);
        }

        let point = geo.as_ref().and_then(GeoResolution::point);
        let click = self
            .storage
            .insert_click(NewClick {
                ts: Utc::now(),
                ip,
                user_agent,
                latitude: point.map(|p| p.latitude),
                longitude: point.map(|p| p.longitude),
            })
            .await?;

        info!(
            "Click #{} logged from {} ({})",
            click.id,
            click.ip,
            geo.as_ref().map(GeoResolution::label).unwrap_or("not located")
        );

        if let Some(backup) = &self.backup {
            backup.schedule_upload();
        }

        Ok(click)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::services::geoip::GeoPoint;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingLocator {
        outcome: GeoResolution,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeoLocator for CountingLocator {
        async fn locate(&self, _ip: &str) -> GeoResolution {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    async fn tracker_with(
        dir: &TempDir,
        outcome: GeoResolution,
    ) -> (ClickTracker, Arc<CountingLocator>) {
        let config = DatabaseConfig {
            database_url: dir.path().join("tracker.db").to_string_lossy().to_string(),
            ..Default::default()
        };
        let storage = Arc::new(SeaOrmStorage::new(&config).await.unwrap());
        let locator = Arc::new(CountingLocator {
            outcome,
            calls: AtomicUsize::new(0),
        });
        let tracker = ClickTracker::new(storage, TrackingConfig::default())
            .with_geoip(locator.clone() as Arc<dyn GeoLocator>);
        (tracker, locator)
    }

    #[tokio::test]
    async fn test_decide_order() {
        let dir = TempDir::new().unwrap();
        let (tracker, _) = tracker_with(&dir, GeoResolution::TimedOut).await;

        assert_eq!(tracker.decide("Mozilla/5.0", false), VisitDecision::Record);
        assert_eq!(tracker.decide("Mozilla/5.0", true), VisitDecision::SkipCookie);
        assert_eq!(
            tracker.decide("curl/7.64", true),
            VisitDecision::SkipBot("curl".to_string())
        );
    }

    #[tokio::test]
    async fn test_record_with_coordinates() {
        let dir = TempDir::new().unwrap();
        let point = GeoPoint::new(48.8566, 2.3522).unwrap();
        let (tracker, locator) = tracker_with(&dir, GeoResolution::Resolved(point)).await;

        let click = tracker
            .record("203.0.113.5".to_string(), "Mozilla/5.0".to_string())
            .await
            .unwrap();

        assert_eq!(click.coordinates(), Some((48.8566, 2.3522)));
        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_geolocation_leaves_nulls() {
        let dir = TempDir::new().unwrap();
        let (tracker, _) = tracker_with(&dir, GeoResolution::TimedOut).await;

        let click = tracker
            .record("203.0.113.5".to_string(), "Mozilla/5.0".to_string())
            .await
            .unwrap();

        assert_eq!(click.coordinates(), None);
        assert_eq!(tracker.storage().count_clicks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_private_ip_not_located() {
        let dir = TempDir::new().unwrap();
        let point = GeoPoint::new(1.0, 1.0).unwrap();
        let (tracker, locator) = tracker_with(&dir, GeoResolution::Resolved(point)).await;

        assert!(tracker.locate("192.168.0.10").await.is_none());
        assert!(tracker.locate("unknown").await.is_none());
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }
}
