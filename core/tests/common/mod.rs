#![allow(dead_code)]

use async_trait::async_trait;
use catalog_core::{PrimaryCatalog, Record, SecondarySource, SourceType};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn primary_records() -> Vec<Record> {
    vec![
        Record::new(1u64, "Dragon Sky", "An", &["fantasy"], SourceType::Primary),
        Record::new(2u64, "Dragon Moon", "Bao", &["fantasy", "romance"], SourceType::Primary),
        Record::new(3u64, "Rohan's Journey", "Mai", &["adventure"], SourceType::Primary),
    ]
}

/// Primary catalog that counts fetches, can stall, and fails its first `fail_first` calls
/// or while `failing` is set.
pub struct ScriptedCatalog {
    records: Vec<Record>,
    delay: Duration,
    fail_first: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn new(records: Vec<Record>) -> Self {
        ScriptedCatalog {
            records,
            delay: Duration::ZERO,
            fail_first: 0,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl PrimaryCatalog for ScriptedCatalog {
    async fn fetch_primary_catalog(&self, max_count: usize) -> anyhow::Result<Vec<Record>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if call < self.fail_first || self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("storage offline (call {call})");
        }
        Ok(self.records.iter().take(max_count).cloned().collect())
    }
}

/// Secondary source that always errors.
pub struct BrokenSource;

#[async_trait]
impl SecondarySource for BrokenSource {
    async fn search_substring(&self, _pattern: &str, _limit: usize) -> anyhow::Result<Vec<Record>> {
        anyhow::bail!("connection refused")
    }
}

/// Secondary source that answers from `inner`, but only after `delay`.
pub struct SlowSource<S> {
    inner: S,
    delay: Duration,
}

impl<S> SlowSource<S> {
    pub fn new(inner: S, delay: Duration) -> Self { SlowSource { inner, delay } }
}

#[async_trait]
impl<S: SecondarySource> SecondarySource for SlowSource<S> {
    async fn search_substring(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<Record>> {
        tokio::time::sleep(self.delay).await;
        self.inner.search_substring(pattern, limit).await
    }
}
