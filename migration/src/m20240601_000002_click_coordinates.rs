//! 点击坐标字段
//!
//! 为 clicks 表追加可空的 latitude / longitude。
//! 只在列不存在时添加，早期部署可能已经手动加过。

use sea_orm_migration::prelude::*;

const CLICKS_TABLE: &str = "clicks";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column(CLICKS_TABLE, "latitude").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Clicks::Table)
                        .add_column(ColumnDef::new(Clicks::Latitude).double().null())
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_column(CLICKS_TABLE, "longitude").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Clicks::Table)
                        .add_column(ColumnDef::new(Clicks::Longitude).double().null())
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite 每次 ALTER 只能删一列
        manager
            .alter_table(
                Table::alter()
                    .table(Clicks::Table)
                    .drop_column(Clicks::Longitude)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Clicks::Table)
                    .drop_column(Clicks::Latitude)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Clicks {
    #[sea_orm(iden = "clicks")]
    Table,
    Latitude,
    Longitude,
}
