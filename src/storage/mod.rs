use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::{ClickRecord, DmLogRecord, NewClick, StorageConfig};

pub struct StorageFactory;

impl StorageFactory {
    /// 按配置创建存储（自动推断后端类型并初始化 schema）
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let storage = SeaOrmStorage::new(config).await?;
        Ok(Arc::new(storage))
    }
}
