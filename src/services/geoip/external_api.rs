//! 外部 HTTP GeoIP 接口
//!
//! 两种调用形态：
//! - text：响应体为 `lat,lon`（如 ipapi.co 的 `/latlong/`）
//! - json：响应体为包含 lat/lon 的对象（如 ip-api.com）

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoLocator, GeoPoint, GeoResolution};
use crate::config::GeoProviderKind;

/// 单个外部接口
pub struct HttpLocator {
    kind: GeoProviderKind,
    api_url_template: String,
    agent: Agent,
}

impl HttpLocator {
    /// `api_url_template` 使用 `{ip}` 作为占位符
    pub fn new(kind: GeoProviderKind, api_url_template: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            kind,
            api_url_template: api_url_template.to_string(),
            agent,
        }
    }

    /// 同步请求（在 spawn_blocking 中调用）
    fn fetch_sync(agent: Agent, kind: GeoProviderKind, url: String) -> GeoResolution {
        let resp = match agent.get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                warn!("GeoIP API request to \"{}\" failed: {}", url, e);
                return classify_error(&e);
            }
        };

        let body = match resp.into_body().read_to_string() {
            Ok(b) => b,
            Err(e) => {
                warn!("GeoIP API response from \"{}\" unreadable: {}", url, e);
                return classify_error(&e);
            }
        };

        let outcome = match kind {
            GeoProviderKind::Text => parse_latlong_text(&body),
            GeoProviderKind::Json => parse_json_body(&body),
        };
        trace!("GeoIP {} response from \"{}\": {}", kind, url, outcome);
        outcome
    }
}

#[async_trait]
impl GeoLocator for HttpLocator {
    async fn locate(&self, ip: &str) -> GeoResolution {
        let url = self.api_url_template.replace("{ip}", ip);
        let agent = self.agent.clone();
        let kind = self.kind;

        tokio::task::spawn_blocking(move || Self::fetch_sync(agent, kind, url))
            .await
            .unwrap_or_else(|e| {
                warn!("GeoIP spawn_blocking failed: {}", e);
                GeoResolution::Failed(format!("lookup task failed: {}", e))
            })
    }

    fn name(&self) -> &'static str {
        match self.kind {
            GeoProviderKind::Text => "text",
            GeoProviderKind::Json => "json",
        }
    }
}

/// 区分超时和其它失败
pub fn classify_error(err: &ureq::Error) -> GeoResolution {
    match err {
        ureq::Error::Timeout(_) => GeoResolution::TimedOut,
        ureq::Error::Io(io) if io.kind() == ErrorKind::TimedOut => GeoResolution::TimedOut,
        ureq::Error::StatusCode(code) => GeoResolution::Failed(format!("HTTP status {}", code)),
        other => GeoResolution::Failed(other.to_string()),
    }
}

/// 解析 `lat,lon` 文本
pub fn parse_latlong_text(body: &str) -> GeoResolution {
    let trimmed = body.trim();
    let Some((lat, lon)) = trimmed.split_once(',') else {
        return GeoResolution::Failed(format!("unexpected text response: {:?}", truncate(trimmed)));
    };

    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => match GeoPoint::new(lat, lon) {
            Some(point) => GeoResolution::Resolved(point),
            None => GeoResolution::Failed(format!("coordinates out of range: {},{}", lat, lon)),
        },
        _ => GeoResolution::Failed(format!("unexpected text response: {:?}", truncate(trimmed))),
    }
}

/// 解析 JSON 响应
///
/// 支持 ip-api.com 的 `lat`/`lon` 和 ipapi.co 的 `latitude`/`longitude`，
/// `status: "fail"` 或 `error: true` 视为失败。
pub fn parse_json_body(body: &str) -> GeoResolution {
    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(j) => j,
        Err(e) => return GeoResolution::Failed(format!("invalid JSON response: {}", e)),
    };

    if json["status"].as_str() == Some("fail") || json["error"].as_bool() == Some(true) {
        let reason = json["message"]
            .as_str()
            .or_else(|| json["reason"].as_str())
            .unwrap_or("lookup refused");
        return GeoResolution::Failed(reason.to_string());
    }

    let lat = json["lat"].as_f64().or_else(|| json["latitude"].as_f64());
    let lon = json["lon"].as_f64().or_else(|| json["longitude"].as_f64());

    match lat.zip(lon) {
        Some((lat, lon)) => match GeoPoint::new(lat, lon) {
            Some(point) => GeoResolution::Resolved(point),
            None => GeoResolution::Failed(format!("coordinates out of range: {},{}", lat, lon)),
        },
        None => GeoResolution::Failed("response has no coordinates".to_string()),
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latlong_text() {
        assert_eq!(
            parse_latlong_text("37.386,-122.0838\n"),
            GeoResolution::Resolved(GeoPoint::new(37.386, -122.0838).unwrap())
        );
        assert_eq!(
            parse_latlong_text(" 51.5 , -0.12 "),
            GeoResolution::Resolved(GeoPoint::new(51.5, -0.12).unwrap())
        );
    }

    #[test]
    fn test_parse_latlong_text_rejects_garbage() {
        assert_eq!(parse_latlong_text("Undefined,Undefined").label(), "failed");
        assert_eq!(parse_latlong_text("").label(), "failed");
        assert_eq!(parse_latlong_text("RateLimited").label(), "failed");
        assert_eq!(parse_latlong_text("95.0,10.0").label(), "failed");
    }

    #[test]
    fn test_parse_json_ip_api_shape() {
        let body = r#"{"status":"success","lat":35.6895,"lon":139.6917}"#;
        assert_eq!(
            parse_json_body(body).point(),
            GeoPoint::new(35.6895, 139.6917)
        );
    }

    #[test]
    fn test_parse_json_ipapi_co_shape() {
        let body = r#"{"ip":"8.8.8.8","latitude":37.751,"longitude":-97.822}"#;
        assert_eq!(parse_json_body(body).point(), GeoPoint::new(37.751, -97.822));
    }

    #[test]
    fn test_parse_json_fail_status() {
        let body = r#"{"status":"fail","message":"private range"}"#;
        assert_eq!(
            parse_json_body(body),
            GeoResolution::Failed("private range".to_string())
        );

        let body = r#"{"error":true,"reason":"Reserved IP Address"}"#;
        assert_eq!(
            parse_json_body(body),
            GeoResolution::Failed("Reserved IP Address".to_string())
        );
    }

    #[test]
    fn test_parse_json_missing_fields() {
        assert_eq!(parse_json_body(r#"{"status":"success"}"#).label(), "failed");
        assert_eq!(parse_json_body("<html>").label(), "failed");
    }

    #[test]
    fn test_classify_timeout() {
        let io = std::io::Error::new(ErrorKind::TimedOut, "timed out");
        assert_eq!(classify_error(&ureq::Error::Io(io)), GeoResolution::TimedOut);
        assert_eq!(
            classify_error(&ureq::Error::StatusCode(429)),
            GeoResolution::Failed("HTTP status 429".to_string())
        );
    }

    /// 依赖外部网络服务，CI 环境可能失败
    #[tokio::test]
    #[ignore]
    async fn test_json_locator_real() {
        let locator = HttpLocator::new(
            GeoProviderKind::Json,
            "http://ip-api.com/json/{ip}?fields=status,message,lat,lon",
            Duration::from_secs(2),
        );
        assert!(locator.locate("8.8.8.8").await.is_resolved());
    }

    /// 不可路由地址，应在超时内返回
    #[tokio::test]
    #[ignore]
    async fn test_unroutable_host_times_out() {
        let locator = HttpLocator::new(
            GeoProviderKind::Text,
            "http://192.0.2.1/{ip}",
            Duration::from_millis(300),
        );
        assert!(!locator.locate("8.8.8.8").await.is_resolved());
    }
}
