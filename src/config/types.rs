//! 配置枚举类型
//!
//! 可选项以枚举形式暴露，配置文件里写名字即可，
//! 避免在代码里散落硬编码的字符串列表。

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumMessage, IntoEnumIterator};

/// 已知的爬虫 / 链接预览抓取器
///
/// 每个签名对应一个 User-Agent 子串（区分大小写）。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    AsRefStr,
    EnumMessage,
)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum BotSignature {
    #[strum(message = "curl command line client")]
    Curl,
    #[strum(message = "GNU Wget")]
    Wget,
    #[strum(message = "Python requests library")]
    PythonRequests,
    #[strum(message = "Google search crawler")]
    Googlebot,
    #[strum(message = "Bing search crawler")]
    Bingbot,
    #[strum(message = "Apple search crawler")]
    Applebot,
    #[strum(message = "Facebook / Messenger link preview")]
    FacebookExternalHit,
    #[strum(message = "Facebook crawler")]
    Facebot,
    #[strum(message = "Twitter / X card fetcher")]
    Twitterbot,
    #[strum(message = "Slack unfurler")]
    Slackbot,
    #[strum(message = "Discord embed fetcher")]
    Discordbot,
    #[strum(message = "Telegram link preview")]
    TelegramBot,
    #[strum(message = "WhatsApp link preview")]
    WhatsApp,
    #[strum(message = "LinkedIn link preview")]
    LinkedInBot,
    #[strum(message = "Reddit link preview")]
    Redditbot,
    #[strum(message = "Embedly card service")]
    Embedly,
    #[strum(message = "Skype link preview")]
    SkypeUriPreview,
    #[strum(message = "Headless Chrome automation")]
    HeadlessChrome,
    #[strum(message = "Generic lowercase 'bot' marker")]
    GenericBot,
    #[strum(message = "Generic 'spider' marker")]
    Spider,
    #[strum(message = "Generic 'crawler' marker")]
    Crawler,
}

impl BotSignature {
    /// 在 User-Agent 中匹配的子串
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::Curl => "curl",
            Self::Wget => "Wget",
            Self::PythonRequests => "python-requests",
            Self::Googlebot => "Googlebot",
            Self::Bingbot => "bingbot",
            Self::Applebot => "Applebot",
            Self::FacebookExternalHit => "facebookexternalhit",
            Self::Facebot => "Facebot",
            Self::Twitterbot => "Twitterbot",
            Self::Slackbot => "Slackbot",
            Self::Discordbot => "Discordbot",
            Self::TelegramBot => "TelegramBot",
            Self::WhatsApp => "WhatsApp",
            Self::LinkedInBot => "LinkedInBot",
            Self::Redditbot => "redditbot",
            Self::Embedly => "Embedly",
            Self::SkypeUriPreview => "SkypeUriPreview",
            Self::HeadlessChrome => "HeadlessChrome",
            Self::GenericBot => "bot",
            Self::Spider => "spider",
            Self::Crawler => "crawler",
        }
    }

    /// 全部签名（默认配置）
    pub fn all() -> Vec<BotSignature> {
        Self::iter().collect()
    }
}

impl std::fmt::Display for BotSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// 地理定位接口形态
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, AsRefStr, EnumMessage,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GeoProviderKind {
    /// 纯文本接口，响应体为 `lat,lon`
    #[strum(message = "Plain-text endpoint answering `lat,lon`")]
    Text,
    /// JSON 接口，响应体包含 lat/lon 字段
    #[strum(message = "JSON endpoint answering an object with lat/lon")]
    Json,
}

impl std::fmt::Display for GeoProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for GeoProviderKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid geo provider: '{}'. Valid: text, json", s)),
        }
    }
}
