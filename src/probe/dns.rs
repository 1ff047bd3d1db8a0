use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{Record, RecordType};
use hickory_resolver::TokioAsyncResolver;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::concurrent::ConcurrentProbe;
use crate::config::ProbeSettings;
use crate::models::DnsRecordMap;

/// Record types fetched for every domain, with their IANA type codes.
/// Codes are used so that types the resolver has no name for can still be queried.
pub const DNS_RECORD_TYPES: &[(&str, u16)] = &[
    ("A", 1), ("AAAA", 28), ("AFSDB", 18), ("APL", 42), ("CAA", 257),
    ("CDNSKEY", 60), ("CDS", 59), ("CERT", 37), ("CNAME", 5), ("CSYNC", 62),
    ("DHCID", 49), ("DLV", 32769), ("DNAME", 39), ("DNSKEY", 48), ("DS", 43),
    ("EUI48", 108), ("EUI64", 109), ("HINFO", 13), ("HIP", 55), ("HTTPS", 65),
    ("IPSECKEY", 45), ("KEY", 25), ("KX", 36), ("LOC", 29), ("MX", 15),
    ("NAPTR", 35), ("NS", 2), ("NSEC", 47), ("NSEC3", 50), ("NSEC3PARAM", 51),
    ("OPENPGPKEY", 61), ("PTR", 12), ("RP", 17), ("RRSIG", 46), ("SIG", 24),
    ("SMIMEA", 53), ("SOA", 6), ("SRV", 33), ("SSHFP", 44), ("SVCB", 64),
    ("TA", 32768), ("TKEY", 249), ("TLSA", 52), ("TSIG", 250), ("TXT", 16),
    ("URI", 256), ("ZONEMD", 63),
];

/// Types tried, in order, when checking whether a domain exists.
pub const EXISTENCE_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX"];

/// Why a single lookup produced no records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupFailure {
    /// Authoritative NXDOMAIN: the name does not exist at all.
    #[error("domain does not exist (NXDOMAIN)")]
    Negative,
    #[error("no records of this type")]
    NoAnswer,
    #[error("lookup timed out")]
    Timeout,
    #[error("lookup failed: {0}")]
    Other(String),
}

impl From<ResolveError> for LookupFailure {
    fn from(e: ResolveError) -> Self {
        match e.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                if *response_code == ResponseCode::NXDomain {
                    LookupFailure::Negative
                } else {
                    LookupFailure::NoAnswer
                }
            }
            ResolveErrorKind::Timeout => LookupFailure::Timeout,
            _ => LookupFailure::Other(e.to_string()),
        }
    }
}

/// Resolver collaborator: (name, record type) to record text.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup(&self, name: &str, record_type: &str) -> Result<Vec<String>, LookupFailure>;
}

/// Resolver backed by hickory, using the system configuration when available.
pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryLookup {
    pub fn new(settings: &ProbeSettings) -> Self {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf()
            .unwrap_or_else(|_| (ResolverConfig::default(), ResolverOpts::default()));
        opts.timeout = settings.dns_timeout();
        opts.attempts = settings.dns_attempts;
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

fn record_type_code(label: &str) -> Option<u16> {
    DNS_RECORD_TYPES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, code)| *code)
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    async fn lookup(&self, name: &str, record_type: &str) -> Result<Vec<String>, LookupFailure> {
        let code = record_type_code(record_type)
            .ok_or_else(|| LookupFailure::Other(format!("unknown record type {record_type}")))?;
        // Fully qualified so the system search list is never appended.
        let fqdn = format!("{}.", name.trim_end_matches('.'));
        let record_type = RecordType::from(code);
        let lookup = self.resolver.lookup(fqdn, record_type).await?;
        let records = answer_values(lookup.records(), record_type);
        if records.is_empty() {
            return Err(LookupFailure::NoAnswer);
        }
        Ok(records)
    }
}

/// Text of the answers of `record_type` only. A lookup also carries the CNAME chain
/// it followed and any glue the server added; those belong to other types.
fn answer_values(records: &[Record], record_type: RecordType) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.record_type() == record_type)
        .filter_map(|r| r.data())
        .map(ToString::to_string)
        .collect()
}

/// Checks A, AAAA, CNAME then MX, stopping at the first answer.
/// NXDOMAIN ends the check at once; a missing type or a timeout moves on to the next type.
pub async fn existence(dns: &dyn DnsLookup, domain: &str) -> bool {
    for record_type in EXISTENCE_TYPES {
        match dns.lookup(domain, record_type).await {
            Ok(answers) => {
                info!(domain, record_type, first = %answers.first().map(String::as_str).unwrap_or(""), "Domain exists");
                return true;
            }
            Err(LookupFailure::Negative) => {
                debug!(domain, "Domain does not exist (NXDOMAIN)");
                return false;
            }
            Err(e) => {
                debug!(domain, record_type, error = %e, "No answer, trying next record type");
            }
        }
    }
    debug!(domain, "Domain has no A, AAAA, CNAME or MX records");
    false
}

/// IPv4 addresses from the A records. Any failure is an empty list.
pub async fn resolve_addresses(dns: &dyn DnsLookup, domain: &str) -> Vec<Ipv4Addr> {
    match dns.lookup(domain, "A").await {
        Ok(records) => {
            let ips: Vec<Ipv4Addr> = records.iter().filter_map(|r| r.trim().parse().ok()).collect();
            debug!(domain, ?ips, "Resolved domain");
            ips
        }
        Err(e) => {
            debug!(domain, error = %e, "Failed to resolve domain");
            Vec::new()
        }
    }
}

/// One concurrent lookup per known record type. Each type fails on its own into an
/// empty list; the map always holds every type once all lookups have finished.
pub async fn fetch_dns_records(
    dns: Arc<dyn DnsLookup>,
    probe: &ConcurrentProbe,
    domain: &str,
) -> DnsRecordMap {
    let tasks: Vec<&'static str> = DNS_RECORD_TYPES.iter().map(|(name, _)| *name).collect();
    let domain_owned = domain.to_string();
    let results = probe
        .execute(tasks, move |record_type| {
            let dns = dns.clone();
            let domain = domain_owned.clone();
            async move {
                let values = match dns.lookup(&domain, record_type).await {
                    Ok(values) => {
                        debug!(domain = %domain, record_type, ?values, "Retrieved records");
                        values
                    }
                    Err(_) => Vec::new(),
                };
                (record_type, values)
            }
        })
        .await;

    let mut records: DnsRecordMap = DNS_RECORD_TYPES
        .iter()
        .map(|(name, _)| (name.to_string(), Vec::new()))
        .collect();
    for (record_type, values) in results.into_iter().flatten() {
        records.insert(record_type.to_string(), values);
    }
    records
}
