use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TLDS: &[&str] = &["com", "org", "net", "fr", "de", "uk", "cn", "ru", "jp", "br"];

pub const DEFAULT_SUBDOMAINS: &[&str] = &[
    "www", "mail", "ftp", "webmail", "smtp", "remote", "secure", "ns1", "ns2",
];

/// The ten most common TCP ports.
pub const DEFAULT_PORTS: &[u16] = &[21, 22, 23, 25, 80, 110, 139, 443, 445, 3389];

pub const DEFAULT_WORKERS: usize = 100;
pub const DEFAULT_HTTP_CONCURRENCY: usize = 100;

pub const DEFAULT_TLD_LIST: &str = "lists/tlds.txt";
pub const DEFAULT_WORDLIST: &str = "lists/seclist_top1million_5000.txt";

/// Where a run takes its list of names from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    BuiltIn,
    File(PathBuf),
}

/// Tuning knobs for the probe collaborators. Loadable from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub dns_timeout_secs: u64,
    pub dns_attempts: usize,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub ports: Vec<u16>,
    pub nmap_bin: String,
    pub nmap_args: Vec<String>,
    pub whois_bin: String,
    pub gowitness_bin: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            dns_timeout_secs: 5,
            dns_attempts: 2,
            http_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            ports: DEFAULT_PORTS.to_vec(),
            nmap_bin: "nmap".to_string(),
            nmap_args: vec!["-sV".to_string()],
            whois_bin: "whois".to_string(),
            gowitness_bin: "gowitness".to_string(),
        }
    }
}

impl ProbeSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading probe settings {}", path.display()))?;
        let settings = serde_json::from_str(&data)
            .with_context(|| format!("parsing probe settings {}", path.display()))?;
        Ok(settings)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct ReconConfig {
    pub name: String,
    pub tlds: ListSource,
    pub subdomains: ListSource,
    pub workers: usize,
    pub http_concurrency: usize,
    pub screenshot_dir: PathBuf,
    pub output: PathBuf,
    pub jsonl: Option<PathBuf>,
    /// `%Y%m%d_%H%M%S` stamp shared by the report and screenshot names of one run.
    pub timestamp: String,
    pub probes: ProbeSettings,
}

impl ReconConfig {
    pub fn new(name: impl Into<String>, timestamp: impl Into<String>) -> Self {
        let name = name.into();
        let timestamp = timestamp.into();
        let output = default_output_path(&name, &timestamp);
        Self {
            name,
            tlds: ListSource::BuiltIn,
            subdomains: ListSource::BuiltIn,
            workers: DEFAULT_WORKERS,
            http_concurrency: DEFAULT_HTTP_CONCURRENCY,
            screenshot_dir: PathBuf::from("screenshots"),
            output,
            jsonl: None,
            timestamp,
            probes: ProbeSettings::default(),
        }
    }

    /// Resolves both name lists. A missing list file aborts the run here, before any probe.
    pub fn load_lists(&self) -> anyhow::Result<(Vec<String>, Vec<String>)> {
        let tlds = match &self.tlds {
            ListSource::BuiltIn => DEFAULT_TLDS.iter().map(|s| s.to_string()).collect(),
            ListSource::File(path) => read_list(path)?
                .into_iter()
                .map(|tld| tld.trim_start_matches('.').to_lowercase())
                .collect(),
        };
        let subdomains = match &self.subdomains {
            ListSource::BuiltIn => DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
            ListSource::File(path) => read_list(path)?,
        };
        Ok((tlds, subdomains))
    }
}

pub fn default_output_path(name: &str, timestamp: &str) -> PathBuf {
    PathBuf::from("results").join(format!("{}_{}.csv", crate::utils::sanitize_file_component(name), timestamp))
}

/// Newline-separated list; blank lines and `#` comments are skipped.
pub fn read_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("list file not found: {}", path.display()))?;
    Ok(parse_list(&data))
}

pub fn parse_list(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
