//! DM 发送日志表
//!
//! 由外部的 Reddit DM 机器人写入，本服务只负责建表和读取。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DmLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DmLog::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DmLog::Ts)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DmLog::PostId).string_len(32).null())
                    .col(ColumnDef::new(DmLog::Username).string_len(64).null())
                    .col(ColumnDef::new(DmLog::Subreddit).string_len(64).null())
                    .col(ColumnDef::new(DmLog::Status).string_len(32).not_null())
                    .col(ColumnDef::new(DmLog::Error).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_dm_log_ts")
                    .table(DmLog::Table)
                    .col(DmLog::Ts)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_dm_log_ts").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(DmLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DmLog {
    #[sea_orm(iden = "dm_log")]
    Table,
    Id,
    Ts,
    PostId,
    Username,
    Subreddit,
    Status,
    Error,
}
