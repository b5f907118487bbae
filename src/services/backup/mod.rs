//! 远程备份
//!
//! 整个 clicks 表导出为 SQL 文本，保存到远端文档（GitHub Gist）。
//! 启动时拉取并导入，每次记录点击后在后台重新上传。

mod gist;
mod service;

pub use gist::GistBackupStore;
pub use service::BackupService;

use async_trait::async_trait;

use crate::errors::Result;

/// 远端备份存储
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// 读取备份内容，不存在时返回 `None`
    async fn fetch(&self) -> Result<Option<String>>;

    /// 覆盖写入备份内容
    async fn store(&self, content: String) -> Result<()>;

    fn name(&self) -> &'static str;
}
