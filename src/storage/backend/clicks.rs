//! Click / DM-log operations for SeaOrmStorage

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use tracing::{debug, trace};

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::{ClickRecord, DmLogRecord, NewClick};

use migration::entities::{click, dm_log};

/// 经度或纬度缺失
fn missing_coordinates() -> Condition {
    Condition::any()
        .add(click::Column::Latitude.is_null())
        .add(click::Column::Longitude.is_null())
}

impl SeaOrmStorage {
    /// 写入一条点击记录
    pub async fn insert_click(&self, new_click: NewClick) -> Result<ClickRecord> {
        let model = click::ActiveModel {
            ts: Set(new_click.ts),
            ip: Set(new_click.ip),
            user_agent: Set(new_click.user_agent),
            latitude: Set(new_click.latitude),
            longitude: Set(new_click.longitude),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        trace!("Click #{} stored for {}", model.id, model.ip);
        Ok(model.into())
    }

    pub async fn count_clicks(&self) -> Result<u64> {
        Ok(click::Entity::find().count(&self.db).await?)
    }

    /// 读取全部点击（按时间升序）
    pub async fn load_clicks(&self) -> Result<Vec<ClickRecord>> {
        let models = click::Entity::find()
            .order_by_asc(click::Column::Ts)
            .order_by_asc(click::Column::Id)
            .all(&self.db)
            .await?;

        debug!("Loaded {} clicks", models.len());
        Ok(models.into_iter().map(ClickRecord::from).collect())
    }

    /// 尚未定位的去重 IP 列表
    pub async fn ips_missing_coordinates(&self) -> Result<Vec<String>> {
        let ips = click::Entity::find()
            .select_only()
            .column(click::Column::Ip)
            .filter(missing_coordinates())
            .distinct()
            .order_by_asc(click::Column::Ip)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(ips)
    }

    /// 为某个 IP 的所有未定位记录回填坐标，返回更新行数
    pub async fn set_coordinates_for_ip(
        &self,
        ip: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<u64> {
        let result = click::Entity::update_many()
            .col_expr(click::Column::Latitude, Expr::value(latitude))
            .col_expr(click::Column::Longitude, Expr::value(longitude))
            .filter(click::Column::Ip.eq(ip))
            .filter(missing_coordinates())
            .exec(&self.db)
            .await?;

        trace!(
            "Backfilled coordinates for {} ({} rows)",
            ip, result.rows_affected
        );
        Ok(result.rows_affected)
    }

    /// 读取 DM 发送日志（按时间升序）
    pub async fn load_dm_logs(&self) -> Result<Vec<DmLogRecord>> {
        let models = dm_log::Entity::find()
            .order_by_asc(dm_log::Column::Ts)
            .order_by_asc(dm_log::Column::Id)
            .all(&self.db)
            .await?;

        debug!("Loaded {} DM log entries", models.len());
        Ok(models.into_iter().map(DmLogRecord::from).collect())
    }
}
