use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::{debug, error, info};
use which::which;

use crate::config::ProbeSettings;

/// An external binary the run relies on, with a hint shown when it is missing.
#[derive(Debug, Clone)]
pub struct RequiredTool {
    pub bin: String,
    pub purpose: &'static str,
    pub hint: &'static str,
}

pub fn required_tools(settings: &ProbeSettings) -> Vec<RequiredTool> {
    vec![
        RequiredTool {
            bin: settings.nmap_bin.clone(),
            purpose: "port scanning",
            hint: "Install Nmap (https://nmap.org/download) and make sure it is in PATH.",
        },
        RequiredTool {
            bin: settings.whois_bin.clone(),
            purpose: "WHOIS lookups",
            hint: "Install the 'whois' command-line client.",
        },
        RequiredTool {
            bin: settings.gowitness_bin.clone(),
            purpose: "screenshots",
            hint: "Install Gowitness (go install github.com/sensepost/gowitness@latest).",
        },
    ]
}

pub fn locate(bin: &str) -> Option<PathBuf> {
    which(bin).ok()
}

/// Fails when any required tool is missing, after logging every missing one.
pub fn check_dependencies(settings: &ProbeSettings) -> Result<()> {
    let mut missing = Vec::new();
    for tool in required_tools(settings) {
        match locate(&tool.bin) {
            Some(path) => debug!(tool = %tool.bin, path = %path.display(), "Found dependency"),
            None => {
                error!(tool = %tool.bin, "{} is not installed or not in PATH (needed for {})", tool.bin, tool.purpose);
                info!("{}", tool.hint);
                missing.push(tool.bin);
            }
        }
    }
    if !missing.is_empty() {
        bail!("missing required tools: {}", missing.join(", "));
    }
    Ok(())
}
