use futures::future::join_all;
use std::future::Future;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::concurrent::{ConcurrentProbe, WorkerPool};
use crate::config::{ProbeSettings, ReconConfig};
use crate::discover::subdomain::SubdomainEnumerator;
use crate::http_client::create_probe_client;
use crate::models::{prune_empty, DomainData, HostRecord, OpenPorts};
use crate::output::Report;
use crate::probe::screenshot::screenshot_path;
use crate::probe::{
    capture_screenshot, existence, fetch_dns_records, resolve_addresses, scan_ports, search_whois,
    DnsLookup, Gowitness, HickoryLookup, LivenessCheck, NmapScanner, PortScanner, ReqwestLiveness,
    ScreenshotCapture, WhoisCommand, WhoisLookup,
};

/// The external capabilities a run is built on.
#[derive(Clone)]
pub struct Collaborators {
    pub dns: Arc<dyn DnsLookup>,
    pub http: Arc<dyn LivenessCheck>,
    pub scanner: Arc<dyn PortScanner>,
    pub whois: Arc<dyn WhoisLookup>,
    pub screenshots: Arc<dyn ScreenshotCapture>,
}

impl Collaborators {
    /// hickory for DNS, reqwest for HTTP, and the nmap / whois / gowitness binaries.
    pub fn system(settings: &ProbeSettings, http_concurrency: usize) -> anyhow::Result<Self> {
        let client = create_probe_client(settings, http_concurrency)?;
        Ok(Self {
            dns: Arc::new(HickoryLookup::new(settings)),
            http: Arc::new(ReqwestLiveness::new(client)),
            scanner: Arc::new(NmapScanner::new(settings.nmap_bin.clone(), settings.nmap_args.clone())),
            whois: Arc::new(WhoisCommand::new(settings.whois_bin.clone())),
            screenshots: Arc::new(Gowitness::new(settings.gowitness_bin.clone())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Stopped by the shutdown signal. The report holds only domains that finished before it.
    Interrupted,
}

#[derive(Debug)]
pub struct RunResult {
    pub outcome: RunOutcome,
    pub report: Report,
    pub domains_checked: usize,
    pub domains_found: usize,
    pub elapsed: Duration,
}

/// Drives the per-domain pipeline over every TLD.
///
/// TLDs are processed one after another. Within a domain the stages run strictly in order:
/// existence, then resolve + DNS records + WHOIS, then subdomain discovery and merge,
/// then port scans, then screenshot dispatch and row emission.
pub struct Recon {
    config: ReconConfig,
    tools: Collaborators,
    tlds: Vec<String>,
    subdomains: SubdomainEnumerator,
    pool: WorkerPool,
    probes: ConcurrentProbe,
    ports: Arc<Vec<u16>>,
}

impl Recon {
    /// Loads the TLD list and wordlist named by `config`; a missing file fails here.
    pub fn new(config: ReconConfig, tools: Collaborators) -> anyhow::Result<Self> {
        let (tlds, words) = config.load_lists()?;
        Ok(Self::with_lists(config, tools, tlds, words))
    }

    pub fn with_lists(config: ReconConfig, tools: Collaborators, tlds: Vec<String>, words: Vec<String>) -> Self {
        let subdomains = SubdomainEnumerator::new(tools.http.clone(), words);
        let pool = WorkerPool::new(config.workers);
        let probes = ConcurrentProbe::new(config.http_concurrency);
        let ports = Arc::new(config.probes.ports.clone());
        Self { config, tools, tlds, subdomains, pool, probes, ports }
    }

    pub fn tlds(&self) -> &[String] {
        &self.tlds
    }

    pub async fn run(&self) -> RunResult {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs until every TLD is done or `shutdown` resolves, whichever comes first.
    /// On shutdown the in-flight domain and all pending pool work are discarded.
    pub async fn run_until<F>(&self, shutdown: F) -> RunResult
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let started = Instant::now();
        let mut report = Report::new();
        let mut captures: JoinSet<Option<()>> = JoinSet::new();
        let mut domains_checked = 0;
        let mut domains_found = 0;

        info!(name = %self.config.name, tlds = self.tlds.len(), workers = self.pool.workers(), "Starting recon");

        let mut outcome = RunOutcome::Completed;
        for tld in &self.tlds {
            let domain = format!("{}.{}", self.config.name, tld);
            let finished = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                records = self.recon_domain(&domain, &mut captures) => Some(records),
            };
            match finished {
                None => {
                    warn!(domain = %domain, "Interrupted, discarding in-flight domain");
                    outcome = RunOutcome::Interrupted;
                    break;
                }
                Some(records) => {
                    domains_checked += 1;
                    if let Some(records) = records {
                        domains_found += 1;
                        report.extend(records);
                    }
                }
            }
        }

        if outcome == RunOutcome::Completed {
            debug!(pending = captures.len(), "Waiting for screenshot captures");
            loop {
                let next = tokio::select! {
                    biased;
                    _ = &mut shutdown => None,
                    joined = captures.join_next() => Some(joined.is_some()),
                };
                match next {
                    Some(true) => continue,
                    Some(false) => break,
                    None => {
                        outcome = RunOutcome::Interrupted;
                        break;
                    }
                }
            }
        }
        captures.abort_all();

        RunResult {
            outcome,
            report,
            domains_checked,
            domains_found,
            elapsed: started.elapsed(),
        }
    }

    /// Full pipeline for one domain. `None` when the domain does not exist.
    pub async fn recon_domain(
        &self,
        domain: &str,
        captures: &mut JoinSet<Option<()>>,
    ) -> Option<Vec<HostRecord>> {
        if !existence(self.tools.dns.as_ref(), domain).await {
            return None;
        }

        let mut data = self.gather(domain).await;

        let live = self.subdomains.enumerate(&self.probes, domain).await;
        for (ips, records) in join_all(live.iter().map(|sub| self.resolve_and_fetch(sub))).await {
            data.merge_subdomain(ips, records);
        }

        let ips: Vec<Ipv4Addr> = data.distinct_ips().into_iter().collect();
        let scans = self.scan_all(&ips).await;

        let dns_records = prune_empty(&data.dns_records);
        let records = ips
            .into_iter()
            .zip(scans)
            .map(|(ip, open_ports)| {
                let screenshots = match &open_ports {
                    Some(ports) => self.dispatch_screenshots(domain, ip, ports, captures),
                    None => Vec::new(),
                };
                HostRecord {
                    domain: domain.to_string(),
                    ip,
                    open_ports: open_ports.unwrap_or_default(),
                    dns_records: dns_records.clone(),
                    whois: data.whois.clone(),
                    screenshots,
                }
            })
            .collect::<Vec<_>>();

        info!(domain, rows = records.len(), subdomains = live.len(), "Domain done");
        Some(records)
    }

    // Resolve, DNS record sets and WHOIS run side by side; WHOIS goes through the pool.
    async fn gather(&self, domain: &str) -> DomainData {
        let whois = self.tools.whois.clone();
        let whois_domain = domain.to_string();
        let whois_job = self
            .pool
            .run(async move { search_whois(whois.as_ref(), &whois_domain).await });

        let ((ips, dns_records), whois) = tokio::join!(self.resolve_and_fetch(domain), whois_job);

        DomainData {
            ips,
            dns_records,
            whois: whois.unwrap_or_default(),
        }
    }

    async fn resolve_and_fetch(&self, name: &str) -> (Vec<Ipv4Addr>, crate::models::DnsRecordMap) {
        tokio::join!(
            resolve_addresses(self.tools.dns.as_ref(), name),
            fetch_dns_records(self.tools.dns.clone(), &self.probes, name),
        )
    }

    /// One scan per IP through the pool; waits for all. Output order matches `ips`.
    /// Dropping the returned future aborts every scan still queued or running.
    async fn scan_all(&self, ips: &[Ipv4Addr]) -> Vec<Option<OpenPorts>> {
        let jobs: Vec<_> = ips
            .iter()
            .map(|&ip| {
                let scanner = self.tools.scanner.clone();
                let ports = self.ports.clone();
                async move { scan_ports(scanner.as_ref(), ip, &ports).await }
            })
            .collect();
        self.pool
            .run_all(jobs)
            .await
            .into_iter()
            .map(Option::flatten)
            .collect()
    }

    /// Queues a capture for each web port open on `ip`, without waiting for it.
    fn dispatch_screenshots(
        &self,
        domain: &str,
        ip: Ipv4Addr,
        open_ports: &OpenPorts,
        captures: &mut JoinSet<Option<()>>,
    ) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for (port, scheme) in [(80u16, "http"), (443u16, "https")] {
            if !open_ports.contains_key(&port) {
                continue;
            }
            let path = screenshot_path(
                &self.config.screenshot_dir,
                domain,
                &ip.to_string(),
                &self.config.timestamp,
                scheme,
            );
            let url = format!("{}://{}", scheme, domain);
            let capture = self.tools.screenshots.clone();
            let dest = path.clone();
            self.pool.submit_into(captures, async move {
                capture_screenshot(capture.as_ref(), &url, &dest).await
            });
            paths.push(path);
        }
        paths
    }
}
