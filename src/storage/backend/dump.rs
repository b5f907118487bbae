//! SQL text dump / restore of the clicks table
//!
//! Dump format: a comment header followed by one `INSERT` per line.
//! Every statement carries the row id and ignores id conflicts, so loading
//! the same dump twice leaves the table unchanged.

use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use sea_orm::sea_query::{
    MysqlQueryBuilder, OnConflict, PostgresQueryBuilder, Query, QueryStatementWriter,
    SqliteQueryBuilder,
};
use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, QueryOrder, TransactionTrait};
use tracing::{debug, info};

use super::SeaOrmStorage;
use crate::errors::Result;

use migration::entities::click;

const DUMP_HEADER: &str = "-- clicktrail clicks dump";

/// 渲染单行点击为对应后端方言的 INSERT 语句（不含结尾分号）
pub fn render_click_insert(backend: DbBackend, row: &click::Model) -> String {
    let mut on_conflict = OnConflict::column(click::Column::Id);
    match backend {
        DbBackend::MySql => on_conflict.do_nothing_on([click::Column::Id]),
        _ => on_conflict.do_nothing(),
    };

    let stmt = Query::insert()
        .into_table(click::Entity)
        .columns([
            click::Column::Id,
            click::Column::Ts,
            click::Column::Ip,
            click::Column::UserAgent,
            click::Column::Latitude,
            click::Column::Longitude,
        ])
        .values_panic([
            row.id.into(),
            // RFC3339 文本三种后端都能解析回 timestamptz
            row.ts
                .to_rfc3339_opts(SecondsFormat::Micros, true)
                .into(),
            row.ip.clone().into(),
            row.user_agent.clone().into(),
            row.latitude.into(),
            row.longitude.into(),
        ])
        .on_conflict(on_conflict)
        .to_owned();

    #[allow(unreachable_patterns)]
    match backend {
        DbBackend::MySql => stmt.to_string(MysqlQueryBuilder),
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(SqliteQueryBuilder),
    }
}

/// 把 dump 文本拆成可执行语句：跳过空行和 `--` 注释，去掉结尾分号
pub fn split_statements(dump: &str) -> Vec<&str> {
    dump.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .map(|line| line.trim_end_matches(';').trim_end())
        .filter(|stmt| !stmt.is_empty())
        .collect()
}

impl SeaOrmStorage {
    /// 导出整张 clicks 表为 SQL 文本
    pub async fn dump_clicks_sql(&self) -> Result<String> {
        let rows = click::Entity::find()
            .order_by_asc(click::Column::Id)
            .all(&self.db)
            .await?;

        let backend = self.db.get_database_backend();
        let mut out = String::with_capacity(64 + rows.len() * 160);
        let _ = writeln!(
            out,
            "{} ({} rows, {}, generated {})",
            DUMP_HEADER,
            rows.len(),
            self.backend_name,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        for row in &rows {
            out.push_str(&render_click_insert(backend, row));
            out.push_str(";\n");
        }

        debug!("Dumped {} clicks to SQL text", rows.len());
        Ok(out)
    }

    /// 在一个事务里执行 dump 文本，返回执行的语句数
    pub async fn restore_clicks_sql(&self, dump: &str) -> Result<usize> {
        let statements = split_statements(dump);
        if statements.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        for stmt in &statements {
            txn.execute_unprepared(stmt).await?;
        }
        txn.commit().await?;

        // 显式写入 id 后需要把 PostgreSQL 序列推到最大值之后
        if self.db.get_database_backend() == DbBackend::Postgres {
            self.db
                .execute_unprepared(
                    "SELECT setval(pg_get_serial_sequence('clicks', 'id'), \
                     COALESCE((SELECT MAX(id) FROM clicks), 0) + 1, false)",
                )
                .await?;
        }

        info!("Restored {} statements into clicks", statements.len());
        Ok(statements.len())
    }
}
