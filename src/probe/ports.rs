use async_trait::async_trait;
use std::net::Ipv4Addr;
use tracing::debug;

use crate::external::runner::run_capture;
use crate::models::{OpenPorts, PortScan, PortService};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("could not run port scanner: {0}")]
    Spawn(String),
    #[error("port scanner exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Port-scan collaborator, dispatched through the worker pool.
/// `Ok(None)` means the host never answered, which is not the same as every port closed.
#[async_trait]
pub trait PortScanner: Send + Sync {
    async fn scan(&self, ip: Ipv4Addr, ports: &[u16]) -> Result<Option<PortScan>, ScanError>;
}

/// Shells out to nmap and reads its greppable (`-oG -`) output.
pub struct NmapScanner {
    bin: String,
    extra_args: Vec<String>,
}

impl NmapScanner {
    pub fn new(bin: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self { bin: bin.into(), extra_args }
    }
}

#[async_trait]
impl PortScanner for NmapScanner {
    async fn scan(&self, ip: Ipv4Addr, ports: &[u16]) -> Result<Option<PortScan>, ScanError> {
        let port_list = ports.iter().map(u16::to_string).collect::<Vec<_>>().join(",");
        let mut args = self.extra_args.clone();
        args.extend(["-p".to_string(), port_list, "-oG".to_string(), "-".to_string(), ip.to_string()]);

        let out = run_capture(&self.bin, &args).await.map_err(|e| ScanError::Spawn(e.to_string()))?;
        if !out.success {
            return Err(ScanError::Failed { code: out.code, stderr: out.stderr.trim().to_string() });
        }
        Ok(parse_greppable(&out.stdout, ip))
    }
}

/// Parses nmap greppable output for one host.
/// Returns `None` when the host is absent or reported down.
pub fn parse_greppable(output: &str, ip: Ipv4Addr) -> Option<PortScan> {
    let host_prefix = format!("Host: {} ", ip);
    let mut seen_up = false;
    let mut scan = PortScan::default();

    for line in output.lines().filter(|l| l.starts_with(&host_prefix)) {
        for section in line.split('\t') {
            if let Some(status) = section.strip_prefix("Status: ") {
                seen_up |= status.trim() == "Up";
            } else if let Some(ports) = section.strip_prefix("Ports: ") {
                seen_up = true;
                for entry in split_port_entries(ports) {
                    if let Some((port, service)) = parse_port_entry(&entry) {
                        scan.ports.insert(port, service);
                    }
                }
            } else if section.starts_with("Ignored State: ") {
                seen_up = true;
            }
        }
    }

    seen_up.then_some(scan)
}

// Entries are ", "-separated, but version strings may contain ", " too.
fn split_port_entries(ports: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for piece in ports.split(", ") {
        let starts_entry = piece
            .split('/')
            .next()
            .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
        match entries.last_mut() {
            Some(last) if !starts_entry => {
                last.push_str(", ");
                last.push_str(piece);
            }
            _ => entries.push(piece.to_string()),
        }
    }
    entries
}

// port/state/protocol/owner/service/rpc_info/version/
fn parse_port_entry(entry: &str) -> Option<(u16, PortService)> {
    let fields: Vec<&str> = entry.trim().split('/').collect();
    if fields.len() < 5 {
        return None;
    }
    let port = fields[0].parse().ok()?;
    Some((
        port,
        PortService {
            name: fields[4].to_string(),
            state: fields[1].to_string(),
        },
    ))
}

/// Scans one IP and keeps only open ports. `None` if the host did not respond or the scanner failed.
pub async fn scan_ports(scanner: &dyn PortScanner, ip: Ipv4Addr, ports: &[u16]) -> Option<OpenPorts> {
    match scanner.scan(ip, ports).await {
        Ok(Some(scan)) => {
            let open = scan.open_ports();
            debug!(%ip, open = ?open.keys().collect::<Vec<_>>(), "Scanned ports");
            Some(open)
        }
        Ok(None) => {
            debug!(%ip, "Host did not respond to port scan");
            None
        }
        Err(e) => {
            debug!(%ip, error = %e, "Port scan failed");
            None
        }
    }
}
