//! Build requests from command-line flags and YAML request files
//!
//! ```yaml
//! - service: orders
//!   tag: v1.4.0
//! - service: payments
//!   tags: [v2, stable]
//!   enforce: true
//! ```

use crate::RequestArgs;
use anyhow::{Context, bail};
use imagewright_core::BuildRequest;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestEntry {
    service: String,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    enforce: bool,
}

impl RequestEntry {
    fn into_requests(self) -> anyhow::Result<Vec<BuildRequest>> {
        let tags: Vec<String> = self.tag.into_iter().chain(self.tags).collect();
        if tags.is_empty() {
            bail!("サービス '{}' にタグが指定されていません", self.service);
        }
        Ok(tags
            .into_iter()
            .map(|tag| BuildRequest::new(self.service.clone(), tag, self.enforce))
            .collect())
    }
}

/// `SERVICE:TAG`
pub fn parse_request(value: &str, enforce: bool) -> anyhow::Result<BuildRequest> {
    let Some((service, tag)) = value.split_once(':') else {
        bail!("要求の形式が不正です: '{}' (SERVICE:TAG で指定してください)", value);
    };
    let (service, tag) = (service.trim(), tag.trim());
    if service.is_empty() || tag.is_empty() {
        bail!("要求の形式が不正です: '{}' (SERVICE:TAG で指定してください)", value);
    }
    Ok(BuildRequest::new(service, tag, enforce))
}

pub fn parse_request_file(content: &str) -> anyhow::Result<Vec<BuildRequest>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<RequestEntry> = serde_yaml::from_str(content)?;
    let mut requests = Vec::new();
    for entry in entries {
        requests.extend(entry.into_requests()?);
    }
    Ok(requests)
}

pub fn load_request_file(path: &Path) -> anyhow::Result<Vec<BuildRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("要求ファイルを読み込めません: {}", path.display()))?;
    parse_request_file(&content)
        .with_context(|| format!("要求ファイルの解析に失敗しました: {}", path.display()))
}

/// Collect every request given on the command line. At least one is required.
pub fn collect(args: &RequestArgs) -> anyhow::Result<Vec<BuildRequest>> {
    let mut requests = Vec::new();
    for value in &args.requests {
        requests.push(parse_request(value, false)?);
    }
    for value in &args.enforced {
        requests.push(parse_request(value, true)?);
    }
    for path in &args.files {
        requests.extend(load_request_file(path)?);
    }

    if requests.is_empty() {
        bail!("要求がありません。-r SERVICE:TAG または -f FILE で指定してください");
    }
    Ok(requests)
}
