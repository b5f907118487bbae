//! SeaORM storage backend
//!
//! Click and DM-log persistence over SQLite, MySQL/MariaDB or PostgreSQL.
//! `DatabaseConnection` is a pool: every operation borrows a connection
//! for its own duration.

mod clicks;
mod connection;
mod dump;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::errors::{ClicktrailError, Result};
use crate::storage::models::StorageConfig;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use dump::{render_click_insert, split_statements};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ClicktrailError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStorage {
    /// 连接数据库并执行 schema 初始化
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if config.database_url.trim().is_empty() {
            return Err(ClicktrailError::database_config("database_url 未设置"));
        }

        let backend_name = infer_backend_from_url(&config.database_url)?;

        let db = if backend_name == "sqlite" {
            connect_sqlite(&config.database_url).await?
        } else {
            connect_generic(config, &backend_name).await?
        };

        let storage = SeaOrmStorage { db, backend_name };
        storage.ensure_schema().await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 幂等地建表 / 补列
    pub async fn ensure_schema(&self) -> Result<()> {
        run_migrations(&self.db).await
    }

    pub fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: self.backend_name.clone(),
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接池
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
