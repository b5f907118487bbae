use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use migration::entities::{click, dm_log};

/// 一次被记录的访问
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickRecord {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub ip: String,
    pub user_agent: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ClickRecord {
    /// 经纬度都有值时返回 `(lat, lon)`
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// 待写入的访问
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub ts: DateTime<Utc>,
    pub ip: String,
    pub user_agent: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// DM 机器人的发送记录（只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmLogRecord {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub post_id: Option<String>,
    pub username: Option<String>,
    pub subreddit: Option<String>,
    pub status: String,
    pub error: Option<String>,
}

impl DmLogRecord {
    /// status 为 `sent`（不区分大小写）视为发送成功
    pub fn is_sent(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("sent")
    }

    /// 明确失败，或未发送成功且带有错误信息
    pub fn is_failed(&self) -> bool {
        let status = self.status.trim();
        status.eq_ignore_ascii_case("failed")
            || status.eq_ignore_ascii_case("error")
            || (!self.is_sent() && self.error.as_deref().is_some_and(|e| !e.trim().is_empty()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}

impl From<click::Model> for ClickRecord {
    fn from(model: click::Model) -> Self {
        Self {
            id: model.id,
            ts: model.ts,
            ip: model.ip,
            user_agent: model.user_agent,
            latitude: model.latitude,
            longitude: model.longitude,
        }
    }
}

impl From<dm_log::Model> for DmLogRecord {
    fn from(model: dm_log::Model) -> Self {
        Self {
            id: model.id,
            ts: model.ts,
            post_id: model.post_id,
            username: model.username,
            subreddit: model.subreddit,
            status: model.status,
            error: model.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dm(status: &str) -> DmLogRecord {
        DmLogRecord {
            id: 1,
            ts: Utc::now(),
            post_id: None,
            username: None,
            subreddit: None,
            status: status.to_string(),
            error: None,
        }
    }

    #[test]
    fn test_dm_sent_status_is_case_insensitive() {
        assert!(dm("sent").is_sent());
        assert!(dm(" SENT ").is_sent());
        assert!(!dm("failed").is_sent());
        assert!(!dm("skipped").is_sent());
    }

    #[test]
    fn test_dm_failed_status() {
        assert!(dm("failed").is_failed());
        assert!(dm("Error").is_failed());
        assert!(!dm("skipped").is_failed());
        assert!(!dm("sent").is_failed());

        let mut rejected = dm("rejected");
        rejected.error = Some("USER_BLOCKED".to_string());
        assert!(rejected.is_failed());
    }

    #[test]
    fn test_click_coordinates_require_both() {
        let mut click = ClickRecord {
            id: 1,
            ts: Utc::now(),
            ip: "1.2.3.4".into(),
            user_agent: String::new(),
            latitude: Some(1.0),
            longitude: None,
        };
        assert_eq!(click.coordinates(), None);
        click.longitude = Some(2.0);
        assert_eq!(click.coordinates(), Some((1.0, 2.0)));
    }
}
