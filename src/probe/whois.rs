use async_trait::async_trait;
use tracing::debug;

use crate::external::runner::run_capture;
use crate::models::WhoisInfo;

#[derive(Debug, thiserror::Error)]
pub enum WhoisError {
    #[error("could not run whois: {0}")]
    Spawn(String),
    #[error("whois returned no attributes")]
    Empty,
}

/// WHOIS collaborator, dispatched through the worker pool.
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn query(&self, domain: &str) -> Result<WhoisInfo, WhoisError>;
}

pub struct WhoisCommand {
    bin: String,
}

impl WhoisCommand {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl WhoisLookup for WhoisCommand {
    async fn query(&self, domain: &str) -> Result<WhoisInfo, WhoisError> {
        // whois exits non-zero for some registries even with a usable answer
        let out = run_capture(&self.bin, &[domain.to_string()]).await.map_err(|e| WhoisError::Spawn(e.to_string()))?;
        let info = parse_whois(&out.stdout);
        if info.is_empty() {
            return Err(WhoisError::Empty);
        }
        Ok(info)
    }
}

/// Collects `Key: value` lines. Keys are lower-cased with spaces as underscores;
/// repeated keys accumulate, duplicate values are dropped. Long keys are legal notices.
pub fn parse_whois(text: &str) -> WhoisInfo {
    let mut info = WhoisInfo::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>") {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else { continue };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() || key.len() > 40 {
            continue;
        }
        let key = key.to_lowercase().replace(' ', "_");
        let values = info.entry(key).or_default();
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    info
}

/// Empty map on any failure.
pub async fn search_whois(whois: &dyn WhoisLookup, domain: &str) -> WhoisInfo {
    match whois.query(domain).await {
        Ok(info) => {
            debug!(domain, attributes = info.len(), "WHOIS information retrieved");
            info
        }
        Err(e) => {
            debug!(domain, error = %e, "WHOIS search failed");
            WhoisInfo::new()
        }
    }
}
