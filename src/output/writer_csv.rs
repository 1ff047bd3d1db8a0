use anyhow::Context;
use csv::{Reader, Writer};
use std::fs::File;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use crate::models::{DnsRecordMap, HostRecord, OpenPorts, PortService, WhoisInfo};

pub const HEADER: [&str; 6] = ["FQDN", "IP Address", "Open Ports", "DNS Records", "WHOIS Info", "Screenshot"];

/// Separator between items of a multi-valued cell.
pub const ITEM_SEP: &str = ",\n";
/// Separator between record-type blocks in the DNS cell.
pub const BLOCK_SEP: &str = ",\n\n";

/// `80:http,\n443:https`
pub fn encode_ports(ports: &OpenPorts) -> String {
    ports
        .iter()
        .map(|(port, svc)| format!("{}:{}", port, svc.name))
        .collect::<Vec<_>>()
        .join(ITEM_SEP)
}

/// `A:1.2.3.4,\n5.6.7.8,\n\nTXT:"v=spf1 -all"`
pub fn encode_dns(records: &DnsRecordMap) -> String {
    records
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(record_type, values)| format!("{}:{}", record_type, values.join(ITEM_SEP)))
        .collect::<Vec<_>>()
        .join(BLOCK_SEP)
}

/// One `key:value` item per value, so repeated keys stay separate items.
pub fn encode_whois(whois: &WhoisInfo) -> String {
    whois
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |v| format!("{}:{}", key, v)))
        .collect::<Vec<_>>()
        .join(ITEM_SEP)
}

pub fn encode_screenshots(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(ITEM_SEP)
}

pub fn decode_ports(cell: &str) -> anyhow::Result<OpenPorts> {
    let mut ports = OpenPorts::new();
    for item in cell.split(ITEM_SEP).filter(|s| !s.is_empty()) {
        let (port, name) = item
            .split_once(':')
            .with_context(|| format!("malformed port item {:?}", item))?;
        let port = port.trim().parse().with_context(|| format!("bad port number {:?}", port))?;
        ports.insert(port, PortService { name: name.to_string(), state: "open".to_string() });
    }
    Ok(ports)
}

pub fn decode_dns(cell: &str) -> anyhow::Result<DnsRecordMap> {
    let mut records = DnsRecordMap::new();
    for block in cell.split(BLOCK_SEP).filter(|s| !s.is_empty()) {
        let (record_type, values) = block
            .split_once(':')
            .with_context(|| format!("malformed DNS block {:?}", block))?;
        records
            .entry(record_type.to_string())
            .or_default()
            .extend(values.split(ITEM_SEP).map(str::to_string));
    }
    Ok(records)
}

pub fn decode_whois(cell: &str) -> anyhow::Result<WhoisInfo> {
    let mut whois = WhoisInfo::new();
    for item in cell.split(ITEM_SEP).filter(|s| !s.is_empty()) {
        let (key, value) = item
            .split_once(':')
            .with_context(|| format!("malformed WHOIS item {:?}", item))?;
        whois.entry(key.to_string()).or_default().push(value.to_string());
    }
    Ok(whois)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes the whole report, then renames it into place so readers never see a partial file.
pub fn write_report(path: &Path, records: &[HostRecord]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        crate::utils::ensure_dir(dir)?;
    }
    let tmp = temp_sibling(path);
    {
        let f = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        let mut w = Writer::from_writer(f);
        w.write_record(HEADER)?;
        for record in records {
            w.write_record(&[
                record.domain.clone(),
                record.ip.to_string(),
                encode_ports(&record.open_ports),
                encode_dns(&record.dns_records),
                encode_whois(&record.whois),
                encode_screenshots(&record.screenshots),
            ])?;
        }
        w.flush()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("moving report into {}", path.display()))?;
    Ok(())
}

/// Reads a report written by `write_report` back into host records.
pub fn read_report(path: &Path) -> anyhow::Result<Vec<HostRecord>> {
    let mut reader = Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or_default();
        let ip: Ipv4Addr = field(1).parse().with_context(|| format!("bad IP address {:?}", field(1)))?;
        records.push(HostRecord {
            domain: field(0).to_string(),
            ip,
            open_ports: decode_ports(field(2))?,
            dns_records: decode_dns(field(3))?,
            whois: decode_whois(field(4))?,
            screenshots: field(5)
                .split(ITEM_SEP)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
        });
    }
    Ok(records)
}
