use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::HostRecord;

/// One JSON object per host record, one per line.
pub fn write_jsonl(path: &Path, records: &[HostRecord]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        crate::utils::ensure_dir(dir)?;
    }
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for record in records {
        serde_json::to_writer(&mut w, record)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_jsonl(path: &Path) -> anyhow::Result<Vec<HostRecord>> {
    let data = std::fs::read_to_string(path)?;
    let mut out = Vec::new();
    for line in data.lines() {
        if line.trim().is_empty() { continue; }
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}
