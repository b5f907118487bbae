//! 启动时的配置校验

use url::Url;

use super::StaticConfig;
use crate::errors::{ClicktrailError, Result};

/// 校验静态配置，失败时返回第一条错误
pub fn validate_config(config: &StaticConfig) -> Result<()> {
    validate_redirect_url(&config.tracking.redirect_url)?;

    if config.tracking.cookie_name.trim().is_empty() {
        return Err(ClicktrailError::config("tracking.cookie_name must not be empty"));
    }
    if config.tracking.cookie_max_age_secs <= 0 {
        return Err(ClicktrailError::config(
            "tracking.cookie_max_age_secs must be positive",
        ));
    }
    if config
        .tracking
        .extra_bot_patterns
        .iter()
        .any(|p| p.is_empty())
    {
        // 空子串会匹配所有 User-Agent
        return Err(ClicktrailError::config(
            "tracking.extra_bot_patterns must not contain empty strings",
        ));
    }

    if config.geoip.enabled {
        if config.geoip.providers.is_empty() {
            return Err(ClicktrailError::config(
                "geoip.providers must list at least one provider when geoip is enabled",
            ));
        }
        if config.geoip.timeout_ms == 0 {
            return Err(ClicktrailError::config("geoip.timeout_ms must be positive"));
        }
        for template in [&config.geoip.text_api_url, &config.geoip.json_api_url] {
            if !template.contains("{ip}") {
                return Err(ClicktrailError::config(format!(
                    "GeoIP URL template '{}' is missing the {{ip}} placeholder",
                    template
                )));
            }
        }
    }

    if config.database.database_url.trim().is_empty() {
        return Err(ClicktrailError::database_config("database_url is empty"));
    }

    Ok(())
}

/// 跳转目标必须是 http(s) 绝对地址
pub fn validate_redirect_url(redirect_url: &str) -> Result<()> {
    let parsed = Url::parse(redirect_url).map_err(|e| {
        ClicktrailError::config(format!("Invalid redirect_url '{}': {}", redirect_url, e))
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ClicktrailError::config(format!(
            "redirect_url must use http or https, got '{}'",
            other
        ))),
    }
}
