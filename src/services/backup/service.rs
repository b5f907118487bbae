//! 备份调度

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{BackupStore, GistBackupStore};
use crate::config::BackupConfig;
use crate::errors::Result;
use crate::storage::SeaOrmStorage;

pub struct BackupService {
    store: Arc<dyn BackupStore>,
    storage: Arc<SeaOrmStorage>,
    /// 保证同一时间只有一个上传在进行
    upload_lock: Mutex<()>,
}

impl BackupService {
    pub fn new(store: Arc<dyn BackupStore>, storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            store,
            storage,
            upload_lock: Mutex::new(()),
        }
    }

    /// 未配置 gist_id / token 时返回 `Ok(None)`
    pub fn from_config(
        config: &BackupConfig,
        storage: Arc<SeaOrmStorage>,
    ) -> Result<Option<Arc<Self>>> {
        if !config.is_enabled() {
            debug!("Backup disabled (gist_id or token missing)");
            return Ok(None);
        }

        let store = GistBackupStore::new(config)?;
        info!("Backup enabled: {}", store.gist_url());
        Ok(Some(Arc::new(Self::new(Arc::new(store), storage))))
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// 拉取远端备份并导入，返回执行的语句数
    pub async fn restore(&self) -> Result<usize> {
        let Some(dump) = self.store.fetch().await? else {
            info!("No remote backup found on {}", self.store.name());
            return Ok(0);
        };

        if dump.trim().is_empty() {
            info!("Remote backup on {} is empty", self.store.name());
            return Ok(0);
        }

        let applied = self.storage.restore_clicks_sql(&dump).await?;
        info!(
            "Restored {} statements from {} backup",
            applied,
            self.store.name()
        );
        Ok(applied)
    }

    /// 启动时恢复，失败只记录日志
    pub async fn restore_on_startup(&self) {
        if let Err(e) = self.restore().await {
            warn!("Backup restore failed, continuing with local data: {}", e);
        }
    }

    /// 立即导出并上传，返回上传的字节数
    pub async fn upload_now(&self) -> Result<usize> {
        let _guard = self.upload_lock.lock().await;

        let dump = self.storage.dump_clicks_sql().await?;
        let size = dump.len();
        self.store.store(dump).await?;

        debug!("Uploaded {} bytes to {} backup", size, self.store.name());
        Ok(size)
    }

    /// 后台上传，失败只记录日志
    pub fn schedule_upload(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.upload_now().await {
                warn!("Background backup upload failed: {}", e);
            }
        });
    }
}
