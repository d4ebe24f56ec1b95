//! Fan a query out to every catalog partition and combine the answers.
//!
//! Only the primary partition is ranked. Licensed works and e-books come back in storage
//! order, and the combined list is primary, then licensed, then ebook, with no score
//! normalization across partitions.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fallback::scan_records;
use crate::index::{Record, RecordId, SourceType};
use crate::manager::IndexManager;
use crate::query::query;
use crate::source::{PrimaryCatalog, SecondarySource};
use crate::suggest::suggest;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// One search result, tagged with the partition it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub record_id: RecordId,
    pub source_type: SourceType,
    /// Relevance score; only present for indexed primary hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// 1-based position within its own source.
    pub rank: usize,
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub purchase_links: Vec<String>,
}

impl Hit {
    fn from_record(record: &Record, source_type: SourceType, score: Option<f32>, rank: usize) -> Self {
        Hit {
            record_id: record.id.clone(),
            source_type,
            score,
            rank,
            title: record.title.clone(),
            author: record.author.clone(),
            genres: record.genres.clone(),
            purchase_links: record.purchase_links.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    pub primary_hits: Vec<Hit>,
    pub licensed_hits: Vec<Hit>,
    pub ebook_hits: Vec<Hit>,
    pub combined_hits: Vec<Hit>,
    /// Primary hits came from the linear scan rather than the index.
    pub degraded: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
    pub degraded: bool,
}

/// Concatenate per-source lists in argument order, dropping repeated `(source, id)` pairs.
pub fn combine(sources: &[&[Hit]]) -> Vec<Hit> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .flat_map(|hits| hits.iter())
        .filter(|h| seen.insert((h.source_type, h.record_id.clone())))
        .cloned()
        .collect()
}

/// Search entry point wiring the index manager to the three partitions.
pub struct CatalogSearch {
    manager: Arc<IndexManager>,
    primary: Arc<dyn PrimaryCatalog>,
    licensed: Arc<dyn SecondarySource>,
    ebooks: Arc<dyn SecondarySource>,
    config: EngineConfig,
}

impl CatalogSearch {
    pub fn new(
        primary: Arc<dyn PrimaryCatalog>,
        licensed: Arc<dyn SecondarySource>,
        ebooks: Arc<dyn SecondarySource>,
        config: EngineConfig,
    ) -> Self {
        let manager = Arc::new(IndexManager::new(primary.clone(), config.clone()));
        CatalogSearch { manager, primary, licensed, ebooks, config }
    }

    pub fn manager(&self) -> &Arc<IndexManager> { &self.manager }
    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Search with the configured per-source limits.
    pub async fn search(&self, query_text: &str) -> SearchOutcome {
        self.merged_search(query_text, self.config.primary_limit, self.config.secondary_limit).await
    }

    /// Search with one limit applied to every source.
    pub async fn search_with_limit(&self, query_text: &str, limit_per_source: usize) -> SearchOutcome {
        let limit = self.config.clamp_limit(limit_per_source);
        self.merged_search(query_text, limit, limit).await
    }

    async fn merged_search(&self, query_text: &str, primary_limit: usize, secondary_limit: usize) -> SearchOutcome {
        if query_text.trim().is_empty() {
            return SearchOutcome::default();
        }
        let ((primary_hits, degraded), licensed_hits, ebook_hits) = tokio::join!(
            self.primary_hits(query_text, primary_limit),
            self.secondary_hits(self.licensed.as_ref(), SourceType::Licensed, query_text, secondary_limit),
            self.secondary_hits(self.ebooks.as_ref(), SourceType::Ebook, query_text, secondary_limit),
        );
        let combined_hits = combine(&[primary_hits.as_slice(), licensed_hits.as_slice(), ebook_hits.as_slice()]);
        tracing::debug!(
            primary = primary_hits.len(),
            licensed = licensed_hits.len(),
            ebook = ebook_hits.len(),
            degraded,
            "merged search"
        );
        SearchOutcome { primary_hits, licensed_hits, ebook_hits, combined_hits, degraded }
    }

    async fn primary_hits(&self, query_text: &str, limit: usize) -> (Vec<Hit>, bool) {
        match self.manager.snapshot().await {
            Ok(snapshot) => {
                let hits = query(&snapshot, query_text, limit)
                    .into_iter()
                    .filter_map(|s| snapshot.record(&s.record_id).map(|r| (r, s.score)))
                    .enumerate()
                    .map(|(i, (r, score))| Hit::from_record(r, SourceType::Primary, Some(score), i + 1))
                    .collect();
                (hits, false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "index unavailable, scanning primary catalog");
                (self.scan_primary(query_text, limit).await, true)
            }
        }
    }

    async fn scan_primary(&self, query_text: &str, limit: usize) -> Vec<Hit> {
        let fetch = self.primary.fetch_primary_catalog(self.config.fetch_limit);
        let records = match tokio::time::timeout(self.config.source_timeout(), fetch).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                tracing::warn!(error = %format!("{e:#}"), "primary catalog unavailable for fallback scan");
                return Vec::new();
            }
            Err(_) => {
                tracing::warn!("primary catalog fetch timed out during fallback scan");
                return Vec::new();
            }
        };
        scan_records(&records, query_text, limit)
            .into_iter()
            .enumerate()
            .map(|(i, r)| Hit::from_record(r, SourceType::Primary, None, i + 1))
            .collect()
    }

    async fn secondary_hits(&self, source: &dyn SecondarySource, source_type: SourceType, query_text: &str, limit: usize) -> Vec<Hit> {
        let outcome = match tokio::time::timeout(self.config.source_timeout(), source.search_substring(query_text, limit)).await {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(e)) => Err(EngineError::SourceUnavailable { source_type, reason: format!("{e:#}") }),
            Err(_) => Err(EngineError::SourceUnavailable { source_type, reason: "timed out".into() }),
        };
        match outcome {
            Ok(records) => {
                let mut seen = HashSet::new();
                records
                    .iter()
                    .filter(|r| seen.insert(&r.id))
                    .take(limit)
                    .enumerate()
                    .map(|(i, r)| Hit::from_record(r, source_type, None, i + 1))
                    .collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "omitting source from merged results");
                Vec::new()
            }
        }
    }

    /// Title completions from the primary index. Empty while the index cannot be built.
    pub async fn suggest(&self, prefix_text: &str, limit: usize) -> Suggestions {
        if prefix_text.trim().is_empty() {
            return Suggestions::default();
        }
        let limit = self.config.clamp_limit(limit);
        match self.manager.snapshot().await {
            Ok(snapshot) => Suggestions { suggestions: suggest(&snapshot, prefix_text, limit), degraded: false },
            Err(e) => {
                tracing::warn!(error = %e, "index unavailable, no suggestions");
                Suggestions { suggestions: Vec::new(), degraded: true }
            }
        }
    }
}
