//! 爬虫 / 链接预览过滤
//!
//! User-Agent 只要包含任一配置的子串即视为机器人（区分大小写）。

use std::collections::HashSet;

use crate::config::{BotSignature, TrackingConfig};

#[derive(Debug, Clone, Default)]
pub struct BotFilter {
    patterns: Vec<String>,
}

impl BotFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // 去重并保留首次出现的顺序，命中结果取决于顺序
        let mut seen = HashSet::new();
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();
        Self { patterns }
    }

    /// 启用的签名 + `extra_bot_patterns`
    pub fn from_config(config: &TrackingConfig) -> Self {
        let builtin = config
            .bot_signatures
            .iter()
            .map(|sig: &BotSignature| sig.pattern().to_string());
        let extra = config
            .extra_bot_patterns
            .iter()
            .map(|p| p.trim().to_string());
        Self::new(builtin.chain(extra))
    }

    /// 返回第一个命中的子串
    pub fn matches(&self, user_agent: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| user_agent.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn is_bot(&self, user_agent: &str) -> bool {
        self.matches(user_agent).is_some()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
