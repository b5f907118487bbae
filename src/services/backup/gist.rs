//! GitHub Gist 备份存储

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, trace};
use ureq::Agent;

use super::BackupStore;
use crate::config::BackupConfig;
use crate::errors::{ClicktrailError, Result};

const USER_AGENT: &str = concat!("clicktrail/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct GistBackupStore {
    agent: Agent,
    gist_url: String,
    filename: String,
    token: String,
}

impl GistBackupStore {
    pub fn new(config: &BackupConfig) -> Result<Self> {
        let gist_id = config
            .gist_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClicktrailError::config("backup.gist_id 未设置"))?;
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClicktrailError::config("backup.token 未设置"))?;

        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();

        Ok(Self {
            agent,
            gist_url: format!("{}/gists/{}", config.api_base.trim_end_matches('/'), gist_id),
            filename: config.filename.clone(),
            token: token.to_string(),
        })
    }

    pub fn gist_url(&self) -> &str {
        &self.gist_url
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn fetch_sync(&self) -> Result<Option<String>> {
        let gist: Value = self
            .agent
            .get(&self.gist_url)
            .header("Authorization", self.auth_header())
            .header("Accept", GITHUB_ACCEPT)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| ClicktrailError::backup(format!("GET {} failed: {}", self.gist_url, e)))?
            .body_mut()
            .read_json()
            .map_err(|e| ClicktrailError::backup(format!("Invalid gist response: {}", e)))?;

        let Some(file) = gist["files"].get(&self.filename) else {
            debug!("Gist has no file named {}", self.filename);
            return Ok(None);
        };

        // 大文件的 content 会被截断，需要走 raw_url
        if file["truncated"].as_bool() == Some(true)
            && let Some(raw_url) = file["raw_url"].as_str()
        {
            trace!("Gist file truncated, fetching {}", raw_url);
            let content = self
                .agent
                .get(raw_url)
                .header("Authorization", self.auth_header())
                .header("User-Agent", USER_AGENT)
                .call()
                .map_err(|e| ClicktrailError::backup(format!("GET {} failed: {}", raw_url, e)))?
                .body_mut()
                .read_to_string()
                .map_err(|e| ClicktrailError::backup(format!("Invalid raw gist body: {}", e)))?;
            return Ok(Some(content));
        }

        Ok(file["content"].as_str().map(str::to_string))
    }

    fn store_sync(&self, content: String) -> Result<()> {
        let payload = patch_payload(&self.filename, content);

        self.agent
            .patch(&self.gist_url)
            .header("Authorization", self.auth_header())
            .header("Accept", GITHUB_ACCEPT)
            .header("User-Agent", USER_AGENT)
            .send_json(&payload)
            .map_err(|e| {
                ClicktrailError::backup(format!("PATCH {} failed: {}", self.gist_url, e))
            })?;

        Ok(())
    }
}

/// `PATCH /gists/{id}` 请求体
pub(crate) fn patch_payload(filename: &str, content: String) -> Value {
    json!({ "files": { filename: { "content": content } } })
}

#[async_trait]
impl BackupStore for GistBackupStore {
    async fn fetch(&self) -> Result<Option<String>> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.fetch_sync())
            .await
            .map_err(|e| ClicktrailError::backup(format!("Backup task failed: {}", e)))?
    }

    async fn store(&self, content: String) -> Result<()> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.store_sync(content))
            .await
            .map_err(|e| ClicktrailError::backup(format!("Backup task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "gist"
    }
}
