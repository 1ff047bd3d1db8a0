#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use recon::config::ReconConfig;
use recon::models::{PortScan, PortService, WhoisInfo};
use recon::pipeline::{Collaborators, Recon};
use recon::probe::ports::ScanError;
use recon::probe::screenshot::CaptureError;
use recon::probe::whois::WhoisError;
use recon::probe::{DnsLookup, LivenessCheck, LookupFailure, PortScanner, ScreenshotCapture, WhoisLookup};

pub const STAMP: &str = "20240101_000000";

#[derive(Default)]
pub struct FakeDns {
    answers: HashMap<(String, String), Result<Vec<String>, LookupFailure>>,
    nxdomain: HashSet<String>,
    slow: HashMap<String, Duration>,
}

impl FakeDns {
    pub fn record(mut self, name: &str, record_type: &str, values: &[&str]) -> Self {
        self.answers.insert(
            (name.into(), record_type.into()),
            Ok(values.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn fail(mut self, name: &str, record_type: &str, failure: LookupFailure) -> Self {
        self.answers.insert((name.into(), record_type.into()), Err(failure));
        self
    }

    pub fn nxdomain(mut self, name: &str) -> Self {
        self.nxdomain.insert(name.into());
        self
    }

    pub fn slow(mut self, name: &str, delay: Duration) -> Self {
        self.slow.insert(name.into(), delay);
        self
    }
}

#[async_trait]
impl DnsLookup for FakeDns {
    async fn lookup(&self, name: &str, record_type: &str) -> Result<Vec<String>, LookupFailure> {
        if let Some(delay) = self.slow.get(name) {
            tokio::time::sleep(*delay).await;
        }
        if self.nxdomain.contains(name) {
            return Err(LookupFailure::Negative);
        }
        self.answers
            .get(&(name.to_string(), record_type.to_string()))
            .cloned()
            .unwrap_or(Err(LookupFailure::NoAnswer))
    }
}

#[derive(Default)]
pub struct FakeHttp {
    live: HashSet<String>,
}

impl FakeHttp {
    pub fn live(hosts: &[&str]) -> Self {
        Self { live: hosts.iter().map(|h| h.to_string()).collect() }
    }
}

#[async_trait]
impl LivenessCheck for FakeHttp {
    async fn get_status(&self, url: &str) -> anyhow::Result<u16> {
        let host = url.trim_start_matches("http://");
        if self.live.contains(host) {
            Ok(200)
        } else {
            anyhow::bail!("connection refused")
        }
    }
}

#[derive(Default)]
pub struct FakeScanner {
    hosts: HashMap<Ipv4Addr, Vec<(u16, &'static str, &'static str)>>,
    delay: Option<Duration>,
    pub scanned: Mutex<Vec<Ipv4Addr>>,
    pub finished: Mutex<Vec<Ipv4Addr>>,
}

impl FakeScanner {
    pub fn host(mut self, ip: Ipv4Addr, ports: &[(u16, &'static str, &'static str)]) -> Self {
        self.hosts.insert(ip, ports.to_vec());
        self
    }

    /// Every scan takes `delay`, like nmap service detection on a slow host.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PortScanner for FakeScanner {
    async fn scan(&self, ip: Ipv4Addr, _ports: &[u16]) -> Result<Option<PortScan>, ScanError> {
        self.scanned.lock().unwrap().push(ip);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.finished.lock().unwrap().push(ip);
        Ok(self.hosts.get(&ip).map(|ports| PortScan {
            ports: ports
                .iter()
                .map(|(port, name, state)| (*port, PortService { name: name.to_string(), state: state.to_string() }))
                .collect(),
        }))
    }
}

pub struct FakeWhois;

#[async_trait]
impl WhoisLookup for FakeWhois {
    async fn query(&self, domain: &str) -> Result<WhoisInfo, WhoisError> {
        let mut info = WhoisInfo::new();
        info.insert("domain_name".into(), vec![domain.to_uppercase()]);
        info.insert("registrar".into(), vec!["Example Registrar, Inc.".into()]);
        Ok(info)
    }
}

#[derive(Default)]
pub struct FakeShots {
    pub taken: Mutex<Vec<(String, PathBuf)>>,
}

#[async_trait]
impl ScreenshotCapture for FakeShots {
    async fn capture(&self, url: &str, destination: &Path) -> Result<(), CaptureError> {
        self.taken.lock().unwrap().push((url.to_string(), destination.to_path_buf()));
        Ok(())
    }
}

pub struct Harness {
    pub scanner: Arc<FakeScanner>,
    pub shots: Arc<FakeShots>,
    pub recon: Recon,
}

pub fn harness(name: &str, tlds: &[&str], dns: FakeDns, http: FakeHttp, scanner: FakeScanner) -> Harness {
    harness_with_workers(name, tlds, dns, http, scanner, 4)
}

pub fn harness_with_workers(
    name: &str,
    tlds: &[&str],
    dns: FakeDns,
    http: FakeHttp,
    scanner: FakeScanner,
    workers: usize,
) -> Harness {
    let scanner = Arc::new(scanner);
    let shots = Arc::new(FakeShots::default());
    let tools = Collaborators {
        dns: Arc::new(dns),
        http: Arc::new(http),
        scanner: scanner.clone(),
        whois: Arc::new(FakeWhois),
        screenshots: shots.clone(),
    };
    let mut config = ReconConfig::new(name, STAMP);
    config.screenshot_dir = PathBuf::from("shots");
    config.workers = workers;
    let words = recon::config::DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect();
    let recon = Recon::with_lists(config, tools, tlds.iter().map(|s| s.to_string()).collect(), words);
    Harness { scanner, shots, recon }
}

pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("recon-test-{}-{}", std::process::id(), name))
}
