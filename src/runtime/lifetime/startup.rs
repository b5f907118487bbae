use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::StaticConfig;
use crate::services::{BackupService, ClickTracker, GeoIpProvider};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub tracker: Arc<ClickTracker>,
    pub backup: Option<Arc<BackupService>>,
}

/// 安装 rustls 默认加密实现（ureq / sqlx 共用）
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 准备服务器启动的上下文
///
/// 顺序：存储（含 schema 初始化） → 远程备份恢复 → GeoIP → 点击流水线
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    install_crypto_provider();

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {}",
        storage.get_backend_config().storage_type
    );

    let backup = BackupService::from_config(&config.backup, storage.clone())
        .context("Failed to configure backup")?;
    match &backup {
        Some(service) => service.restore_on_startup().await,
        None => info!("Backup is disabled (backup.gist_id / backup.token not set)"),
    }

    let mut tracker = ClickTracker::new(storage.clone(), config.tracking.clone());
    if config.geoip.enabled {
        tracker = tracker.with_geoip(Arc::new(GeoIpProvider::new(&config.geoip)));
    } else {
        warn!("Geolocation is disabled, clicks will be stored without coordinates");
    }
    if let Some(service) = &backup {
        tracker = tracker.with_backup(service.clone());
    }

    info!(
        "Tracking {} -> {}",
        crate::api::services::TRACKING_PATH,
        config.tracking.redirect_url
    );
    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        tracker: Arc::new(tracker),
        backup,
    })
}
