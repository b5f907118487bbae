use serde::{Deserialize, Serialize};

use super::types::{BotSignature, GeoProviderKind};

/// 环境变量前缀（`CT__TRACKING__REDIRECT_URL=...`）
pub const ENV_PREFIX: &str = "CT";

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML + 环境变量加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量
/// - database: 数据库连接
/// - tracking: 跳转目标、去重 cookie、爬虫过滤
/// - geoip: IP 地理定位
/// - backup: Gist 远程备份
/// - logging: 日志
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：旧式环境变量 > CT__ 环境变量 > 配置文件 > 默认值
    /// 示例：CT__SERVER__PORT=9999
    pub fn load(path: Option<&str>) -> Self {
        use config::{Config, Environment, File};

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        };

        config.apply_legacy_env(|key| std::env::var(key).ok());
        config
    }

    /// 兼容早期部署使用的无前缀环境变量
    ///
    /// `lookup` 便于测试时注入，不必修改真实进程环境。
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("DATABASE_URL") {
            self.database.database_url = url;
        }
        if let Some(url) = non_empty("REDIRECT_URL") {
            self.tracking.redirect_url = url;
        }
        if let Some(port) = non_empty("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => eprintln!("[WARN] Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(gist_id) = non_empty("GIST_ID") {
            self.backup.gist_id = Some(gist_id);
        }
        if let Some(token) = non_empty("GITHUB_TOKEN") {
            self.backup.token = Some(token);
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 连接 / 获取连接超时（秒）
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
}

/// 点击跟踪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// 302 跳转目标
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
    /// 去重 cookie 名称
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 去重 cookie 有效期（秒）
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: i64,
    /// 启用的爬虫签名
    #[serde(default = "BotSignature::all")]
    pub bot_signatures: Vec<BotSignature>,
    /// 额外的 User-Agent 子串（区分大小写）
    #[serde(default)]
    pub extra_bot_patterns: Vec<String>,
    /// 是否允许 `?debug=1` 诊断输出
    #[serde(default = "default_enable_debug")]
    pub enable_debug: bool,
}

/// 地理定位配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    #[serde(default = "default_geoip_enabled")]
    pub enabled: bool,
    /// 按顺序尝试的接口形态，前一个失败才会调用下一个
    #[serde(default = "default_geoip_providers")]
    pub providers: Vec<GeoProviderKind>,
    /// 纯文本接口 URL，`{ip}` 为占位符
    #[serde(default = "default_text_api_url")]
    pub text_api_url: String,
    /// JSON 接口 URL，`{ip}` 为占位符
    #[serde(default = "default_json_api_url")]
    pub json_api_url: String,
    /// 单次请求超时（毫秒）
    #[serde(default = "default_geoip_timeout_ms")]
    pub timeout_ms: u64,
}

/// Gist 远程备份配置
///
/// gist_id 和 token 同时设置时才启用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub gist_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_backup_filename")]
    pub filename: String,
    #[serde(default = "default_backup_api_base")]
    pub api_base: String,
}

impl BackupConfig {
    pub fn is_enabled(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.gist_id) && set(&self.token)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "click_log.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    8
}

fn default_redirect_url() -> String {
    "https://www.youtube.com/watch?v=c-L7akD6cMQ&t=3198s".to_string()
}

fn default_cookie_name() -> String {
    "hfc_clicked".to_string()
}

fn default_cookie_max_age_secs() -> i64 {
    3600
}

fn default_enable_debug() -> bool {
    true
}

fn default_geoip_enabled() -> bool {
    true
}

fn default_geoip_providers() -> Vec<GeoProviderKind> {
    vec![GeoProviderKind::Text, GeoProviderKind::Json]
}

fn default_text_api_url() -> String {
    "https://ipapi.co/{ip}/latlong/".to_string()
}

fn default_json_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,message,lat,lon".to_string()
}

fn default_geoip_timeout_ms() -> u64 {
    2000
}

fn default_backup_filename() -> String {
    "clicks_backup.sql".to_string()
}

fn default_backup_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            redirect_url: default_redirect_url(),
            cookie_name: default_cookie_name(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
            bot_signatures: BotSignature::all(),
            extra_bot_patterns: Vec::new(),
            enable_debug: default_enable_debug(),
        }
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: default_geoip_enabled(),
            providers: default_geoip_providers(),
            text_api_url: default_text_api_url(),
            json_api_url: default_json_api_url(),
            timeout_ms: default_geoip_timeout_ms(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            gist_id: None,
            token: None,
            filename: default_backup_filename(),
            api_base: default_backup_api_base(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_legacy_behavior() {
        let config = StaticConfig::default();
        assert_eq!(config.tracking.cookie_name, "hfc_clicked");
        assert_eq!(config.tracking.cookie_max_age_secs, 3600);
        assert_eq!(config.geoip.timeout_ms, 2000);
        assert_eq!(
            config.geoip.providers,
            vec![GeoProviderKind::Text, GeoProviderKind::Json]
        );
        assert!(!config.backup.is_enabled());
    }

    #[test]
    fn test_legacy_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://u:p@localhost/clicks"),
            ("REDIRECT_URL", "https://example.com/landing"),
            ("PORT", "8081"),
            ("GIST_ID", "abc123"),
            ("GITHUB_TOKEN", "ghp_test"),
        ]
        .into_iter()
        .collect();

        let mut config = StaticConfig::default();
        config.apply_legacy_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.database.database_url,
            "postgres://u:p@localhost/clicks"
        );
        assert_eq!(config.tracking.redirect_url, "https://example.com/landing");
        assert_eq!(config.server.port, 8081);
        assert!(config.backup.is_enabled());
    }

    #[test]
    fn test_legacy_env_ignores_bad_port_and_blank_values() {
        let mut config = StaticConfig::default();
        config.apply_legacy_env(|k| match k {
            "PORT" => Some("not-a-port".to_string()),
            "GIST_ID" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.server.port, 5000);
        assert!(config.backup.gist_id.is_none());
    }

    #[test]
    fn test_backup_requires_both_id_and_token() {
        let backup = BackupConfig {
            gist_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(!backup.is_enabled());
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.tracking.redirect_url, default_redirect_url());
        assert_eq!(parsed.tracking.bot_signatures.len(), BotSignature::all().len());
    }
}
