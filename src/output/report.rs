use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::models::HostRecord;
use crate::output::{write_jsonl, write_report};

/// Host records collected over a run, in the order their domains finished.
/// Only the orchestrator appends to it.
#[derive(Debug, Default, Clone)]
pub struct Report {
    records: Vec<HostRecord>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = HostRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[HostRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct domains with at least one row.
    pub fn domains(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.domain.as_str()).collect()
    }

    pub fn save_csv(&self, path: &Path) -> anyhow::Result<()> {
        write_report(path, &self.records)?;
        info!(path = %path.display(), rows = self.records.len(), "Results saved");
        Ok(())
    }

    pub fn save_jsonl(&self, path: &Path) -> anyhow::Result<()> {
        write_jsonl(path, &self.records)?;
        info!(path = %path.display(), rows = self.records.len(), "JSON lines saved");
        Ok(())
    }
}
