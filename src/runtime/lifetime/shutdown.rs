use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::services::BackupService;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

pub async fn listen_for_shutdown(db: &DatabaseConnection, backup: Option<Arc<BackupService>>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, finishing pending work...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    perform_shutdown_tasks(db, backup).await;
}

/// 执行所有关闭任务
async fn perform_shutdown_tasks(db: &DatabaseConnection, backup: Option<Arc<BackupService>>) {
    // 最后一次上传，覆盖可能仍在进行中的后台上传
    if let Some(service) = backup {
        match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), service.upload_now()).await {
            Ok(Ok(size)) => info!("Final backup uploaded ({} bytes)", size),
            Ok(Err(e)) => warn!("Final backup upload failed: {}", e),
            Err(_) => error!(
                "Final backup upload timed out after {} seconds",
                TASK_TIMEOUT_SECS
            ),
        }
    }

    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), db.clone().close()).await {
        Ok(Ok(())) => info!("Database pool closed"),
        Ok(Err(e)) => error!("Failed to close database pool: {}", e),
        Err(_) => error!("Closing database pool timed out"),
    }
}
