//! GeoIP Provider 抽象层
//!
//! 查询结果是显式的三态 `GeoResolution`，调用方自己决定失败时怎么处理，
//! 而不是在这里静默吞掉变成空坐标。
//!
//! `GeoIpProvider` 按配置顺序串联多个接口：前一个没解析出来才调用下一个。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, info, trace};

use super::external_api::HttpLocator;
use crate::config::GeoIpConfig;

/// 解析成功结果的缓存 TTL（15 分钟）
const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
/// 缓存最大容量
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;

/// 经纬度坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// 坐标越界或非有限值时返回 None
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// 一次地理定位的结果
#[derive(Debug, Clone, PartialEq)]
pub enum GeoResolution {
    /// 解析出坐标
    Resolved(GeoPoint),
    /// 请求超时
    TimedOut,
    /// 请求失败或响应无法解析
    Failed(String),
}

impl GeoResolution {
    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            Self::Resolved(point) => Some(*point),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// 简短标签，用于日志和诊断输出
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolved(_) => "resolved",
            Self::TimedOut => "timeout",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for GeoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(p) => write!(f, "resolved ({:.4}, {:.4})", p.latitude, p.longitude),
            Self::TimedOut => write!(f, "not resolved (timeout)"),
            Self::Failed(reason) => write!(f, "not resolved ({})", reason),
        }
    }
}

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// 查询 IP 地址的坐标
    async fn locate(&self, ip: &str) -> GeoResolution;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 统一 GeoIP Provider：有序回退链 + 成功结果缓存
pub struct GeoIpProvider {
    chain: Vec<Arc<dyn GeoLocator>>,
    cache: Cache<String, GeoPoint>,
}

impl GeoIpProvider {
    /// 根据配置构造回退链
    pub fn new(config: &GeoIpConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        let chain: Vec<Arc<dyn GeoLocator>> = config
            .providers
            .iter()
            .map(|kind| {
                let template = match kind {
                    crate::config::GeoProviderKind::Text => &config.text_api_url,
                    crate::config::GeoProviderKind::Json => &config.json_api_url,
                };
                Arc::new(HttpLocator::new(*kind, template, timeout)) as Arc<dyn GeoLocator>
            })
            .collect();

        let provider = Self::with_locators(chain);
        info!(
            "GeoIP: Initialized with chain [{}], timeout {} ms",
            provider.provider_names().join(" -> "),
            config.timeout_ms
        );
        provider
    }

    /// 使用给定的查询实现构造（测试或自定义接口）
    pub fn with_locators(chain: Vec<Arc<dyn GeoLocator>>) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        Self { chain, cache }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|l| l.name()).collect()
    }
}

#[async_trait]
impl GeoLocator for GeoIpProvider {
    /// 依次尝试链上的每个接口
    ///
    /// - 缓存命中：直接返回
    /// - 第一个 Resolved 写入缓存并返回
    /// - 全部失败：返回最后一个失败结果（不缓存）
    async fn locate(&self, ip: &str) -> GeoResolution {
        if let Some(point) = self.cache.get(ip).await {
            trace!("GeoIP cache hit for {}", ip);
            return GeoResolution::Resolved(point);
        }

        let mut last = GeoResolution::Failed("no geolocation provider configured".to_string());
        for locator in &self.chain {
            let outcome = locator.locate(ip).await;
            if let GeoResolution::Resolved(point) = outcome {
                self.cache.insert(ip.to_string(), point).await;
                return outcome;
            }
            debug!("GeoIP {} lookup for {}: {}", locator.name(), ip, outcome);
            last = outcome;
        }
        last
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
