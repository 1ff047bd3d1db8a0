pub mod dns;
pub mod http_probe;
pub mod ports;
pub mod screenshot;
pub mod whois;

pub use dns::{existence, fetch_dns_records, resolve_addresses, DnsLookup, HickoryLookup, LookupFailure};
pub use http_probe::{probe_subdomain_liveness, LivenessCheck, ReqwestLiveness};
pub use ports::{scan_ports, NmapScanner, PortScanner};
pub use screenshot::{capture_screenshot, Gowitness, ScreenshotCapture};
pub use whois::{search_whois, WhoisCommand, WhoisLookup};
