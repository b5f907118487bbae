//! 点击记录表
//!
//! 每次有效访问写入一行：时间戳、IP、User-Agent。
//! 坐标列由后续迁移追加。
//!
//! 最早的部署只有 `clicks(ts REAL, ip TEXT, user_agent TEXT)`，没有 id，
//! ts 为 Unix 秒。遇到这种表时先改名，建新表后把旧行拷回来。

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DbBackend};

const CLICKS_TABLE: &str = "clicks";
const LEGACY_TABLE: &str = "clicks_legacy";

/// 旧表的 ts 可能是 REAL / INTEGER 秒，也可能已经是文本
const COPY_LEGACY_ROWS: &str = "INSERT INTO clicks (ts, ip, user_agent) \
     SELECT \
       CASE \
         WHEN typeof(ts) IN ('real', 'integer') \
           THEN strftime('%Y-%m-%dT%H:%M:%fZ', ts, 'unixepoch') \
         WHEN ts IS NULL THEN '1970-01-01T00:00:00Z' \
         ELSE ts \
       END, \
       COALESCE(ip, ''), \
       COALESCE(user_agent, '') \
     FROM clicks_legacy \
     ORDER BY rowid";

/// 旧表存在且没有 id 列时改名，返回是否需要拷贝
async fn stash_legacy_table(manager: &SchemaManager<'_>) -> Result<bool, DbErr> {
    if !manager.has_table(CLICKS_TABLE).await? || manager.has_column(CLICKS_TABLE, "id").await? {
        return Ok(false);
    }

    let db = manager.get_connection();
    if db.get_database_backend() != DbBackend::Sqlite {
        return Err(DbErr::Migration(
            "table `clicks` has no `id` column; automatic upgrade is only supported on SQLite, \
             add an auto-increment `id` primary key manually"
                .to_string(),
        ));
    }

    db.execute_unprepared(&format!(
        "ALTER TABLE {} RENAME TO {}",
        CLICKS_TABLE, LEGACY_TABLE
    ))
    .await?;
    Ok(true)
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let has_legacy_rows = stash_legacy_table(manager).await?;

        manager
            .create_table(
                Table::create()
                    .table(Clicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clicks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Clicks::Ts)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Clicks::Ip).string_len(64).not_null())
                    .col(ColumnDef::new(Clicks::UserAgent).text().not_null())
                    .to_owned(),
            )
            .await?;

        // 时间窗口统计（过去 7 天等）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clicks_ts")
                    .table(Clicks::Table)
                    .col(Clicks::Ts)
                    .to_owned(),
            )
            .await?;

        if has_legacy_rows {
            let db = manager.get_connection();
            db.execute_unprepared(COPY_LEGACY_ROWS).await?;
            manager
                .drop_table(Table::drop().table(Alias::new(LEGACY_TABLE)).to_owned())
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_clicks_ts").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Clicks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clicks {
    #[sea_orm(iden = "clicks")]
    Table,
    Id,
    Ts,
    Ip,
    UserAgent,
}
