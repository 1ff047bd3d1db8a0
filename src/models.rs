use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Record-type label (e.g. "TXT") to raw record text, in resolver order.
pub type DnsRecordMap = BTreeMap<String, Vec<String>>;

/// WHOIS attribute name to its values. Registries repeat some keys (name servers, status).
pub type WhoisInfo = BTreeMap<String, Vec<String>>;

/// Open ports only, keyed by port number.
pub type OpenPorts = BTreeMap<u16, PortService>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortService {
    pub name: String,
    pub state: String,
}

impl PortService {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

/// Raw port-scan outcome for one host, every scanned port included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortScan {
    pub ports: BTreeMap<u16, PortService>,
}

impl PortScan {
    pub fn open_ports(&self) -> OpenPorts {
        self.ports
            .iter()
            .filter(|(_, svc)| svc.is_open())
            .map(|(port, svc)| (*port, svc.clone()))
            .collect()
    }
}

/// Everything gathered about one existing domain before port scanning.
#[derive(Debug, Clone, Default)]
pub struct DomainData {
    pub ips: Vec<Ipv4Addr>,
    pub dns_records: DnsRecordMap,
    pub whois: WhoisInfo,
}

impl DomainData {
    /// Folds a live subdomain's addresses and records into this (parent) domain.
    /// Parent values stay first; duplicates are kept until `distinct_ips`.
    pub fn merge_subdomain(&mut self, ips: Vec<Ipv4Addr>, records: DnsRecordMap) {
        self.ips.extend(ips);
        for (record_type, values) in records {
            self.dns_records.entry(record_type).or_default().extend(values);
        }
    }

    pub fn distinct_ips(&self) -> BTreeSet<Ipv4Addr> {
        self.ips.iter().copied().collect()
    }
}

/// Drops record types that came back with no values.
pub fn prune_empty(records: &DnsRecordMap) -> DnsRecordMap {
    records
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(record_type, values)| (record_type.clone(), values.clone()))
        .collect()
}

/// One report row: a single (domain, IP) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub domain: String,
    pub ip: Ipv4Addr,
    pub open_ports: OpenPorts,
    pub dns_records: DnsRecordMap,
    pub whois: WhoisInfo,
    pub screenshots: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(pairs: &[(&str, &[&str])]) -> DnsRecordMap {
        pairs
            .iter()
            .map(|(t, v)| (t.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn merge_appends_subdomain_values_after_parent() {
        let mut data = DomainData {
            ips: vec![Ipv4Addr::new(10, 0, 0, 1)],
            dns_records: records(&[("A", &["10.0.0.1"]), ("MX", &[])]),
            whois: WhoisInfo::new(),
        };
        data.merge_subdomain(
            vec![Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 1)],
            records(&[("A", &["10.0.0.5"]), ("TXT", &["v=spf1 -all"])]),
        );

        assert_eq!(data.dns_records["A"], vec!["10.0.0.1", "10.0.0.5"]);
        assert_eq!(data.dns_records["TXT"], vec!["v=spf1 -all"]);
        assert_eq!(data.ips.len(), 3);
        let distinct: Vec<_> = data.distinct_ips().into_iter().collect();
        assert_eq!(distinct, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 5)]);
    }

    #[test]
    fn prune_removes_only_empty_entries() {
        let pruned = prune_empty(&records(&[("A", &["1.2.3.4"]), ("AAAA", &[]), ("TXT", &["x"])]));
        assert_eq!(pruned.len(), 2);
        assert!(pruned.values().all(|v| !v.is_empty()));
    }

    #[test]
    fn open_ports_filters_by_state() {
        let mut scan = PortScan::default();
        scan.ports.insert(80, PortService { name: "http".into(), state: "open".into() });
        scan.ports.insert(22, PortService { name: "ssh".into(), state: "filtered".into() });
        let open = scan.open_ports();
        assert_eq!(open.keys().copied().collect::<Vec<_>>(), vec![80]);
    }
}
