//! Storage collaborators the engine talks to.

use crate::fallback::scan_records;
use crate::index::{Record, SourceType};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Bulk record fetch for the indexed (primary) partition.
#[async_trait]
pub trait PrimaryCatalog: Send + Sync {
    async fn fetch_primary_catalog(&self, max_count: usize) -> anyhow::Result<Vec<Record>>;
}

/// Direct substring search against a partition that is not indexed.
#[async_trait]
pub trait SecondarySource: Send + Sync {
    async fn search_substring(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<Record>>;
}

/// Records held in memory. Serves as either collaborator; `replace` stands in for a content edit.
pub struct MemoryCatalog {
    source_type: SourceType,
    records: RwLock<Vec<Record>>,
}

impl MemoryCatalog {
    pub fn new(source_type: SourceType, records: Vec<Record>) -> Self {
        let records = records.into_iter().map(|r| Record { source_type, ..r }).collect();
        MemoryCatalog { source_type, records: RwLock::new(records) }
    }

    pub fn replace(&self, records: Vec<Record>) {
        let source_type = self.source_type;
        *self.records.write() = records.into_iter().map(|r| Record { source_type, ..r }).collect();
    }

    pub fn is_empty(&self) -> bool { self.records.read().is_empty() }
}

#[async_trait]
impl PrimaryCatalog for MemoryCatalog {
    async fn fetch_primary_catalog(&self, max_count: usize) -> anyhow::Result<Vec<Record>> {
        Ok(self.records.read().iter().take(max_count).cloned().collect())
    }
}

#[async_trait]
impl SecondarySource for MemoryCatalog {
    async fn search_substring(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<Record>> {
        let records = self.records.read();
        Ok(scan_records(&records, pattern, limit).into_iter().cloned().collect())
    }
}
