//! Process-wide owner of the current index snapshot.
//!
//! Policy: a caller only waits when there is nothing to serve. With no snapshot, callers
//! queue on the build gate; the first one builds and the rest reuse its outcome. Once a
//! snapshot exists nobody waits: after `invalidate`, the caller that wins the gate rebuilds
//! and everyone else keeps reading the stale snapshot until the swap.

use crate::builder::build;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::index::{IndexSnapshot, IndexStats};
use crate::source::PrimaryCatalog;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Uninitialized,
    Building,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub state: IndexState,
    pub stale: bool,
    pub builds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<IndexStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Default)]
struct Slot {
    snapshot: Option<Arc<IndexSnapshot>>,
    stale: bool,
    building: bool,
    last_error: Option<String>,
}

pub struct IndexManager {
    catalog: Arc<dyn PrimaryCatalog>,
    config: EngineConfig,
    slot: RwLock<Slot>,
    gate: Mutex<()>,
    attempts: AtomicU64,
}

/// Clears `building` even if the build future is dropped mid-await.
struct BuildingFlag<'a>(&'a RwLock<Slot>);

impl<'a> BuildingFlag<'a> {
    fn raise(slot: &'a RwLock<Slot>) -> Self {
        slot.write().building = true;
        BuildingFlag(slot)
    }
}

impl Drop for BuildingFlag<'_> {
    fn drop(&mut self) { self.0.write().building = false; }
}

impl IndexManager {
    pub fn new(catalog: Arc<dyn PrimaryCatalog>, config: EngineConfig) -> Self {
        IndexManager {
            catalog,
            config,
            slot: RwLock::new(Slot::default()),
            gate: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> IndexState {
        let slot = self.slot.read();
        if slot.building {
            IndexState::Building
        } else if slot.snapshot.is_some() {
            IndexState::Ready
        } else if slot.last_error.is_some() {
            IndexState::Failed
        } else {
            IndexState::Uninitialized
        }
    }

    pub fn status(&self) -> IndexStatus {
        let state = self.state();
        let slot = self.slot.read();
        IndexStatus {
            state,
            stale: slot.stale,
            builds: self.attempts.load(Ordering::Acquire),
            snapshot: slot.snapshot.as_ref().map(|s| s.stats()),
            last_error: slot.last_error.clone(),
        }
    }

    /// The published snapshot, if any, without triggering a build.
    pub fn current(&self) -> Option<Arc<IndexSnapshot>> { self.slot.read().snapshot.clone() }

    /// Mark the published snapshot stale. It keeps serving until a rebuild swaps it out.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write();
        if slot.snapshot.is_some() {
            slot.stale = true;
        }
        tracing::info!("index invalidated");
    }

    /// Return a usable snapshot, building it first if none has been published.
    ///
    /// Errors only when no snapshot exists and the build failed; callers then fall back to
    /// a linear scan for this request.
    pub async fn snapshot(&self) -> Result<Arc<IndexSnapshot>> {
        let (current, stale) = {
            let slot = self.slot.read();
            (slot.snapshot.clone(), slot.stale)
        };

        if let Some(current) = current {
            if !stale {
                return Ok(current);
            }
            let Ok(_guard) = self.gate.try_lock() else {
                return Ok(current);
            };
            if let Some(fresh) = self.fresh() {
                return Ok(fresh);
            }
            return Ok(self.build_locked().await.unwrap_or(current));
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let _guard = self.gate.lock().await;
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            // a build ran and failed while we waited; don't pile another one on
            let reason = self.slot.read().last_error.clone().unwrap_or_default();
            return Err(EngineError::BuildFailure(reason));
        }
        self.build_locked().await
    }

    /// Build and publish a new snapshot now, waiting for any in-flight build first.
    ///
    /// On failure the previous snapshot, if any, stays published.
    pub async fn rebuild(&self) -> Result<Arc<IndexSnapshot>> {
        let _guard = self.gate.lock().await;
        self.build_locked().await
    }

    fn fresh(&self) -> Option<Arc<IndexSnapshot>> {
        let slot = self.slot.read();
        match &slot.snapshot {
            Some(s) if !slot.stale => Some(s.clone()),
            _ => None,
        }
    }

    // Caller must hold `gate`.
    async fn build_locked(&self) -> Result<Arc<IndexSnapshot>> {
        let _flag = BuildingFlag::raise(&self.slot);
        self.attempts.fetch_add(1, Ordering::AcqRel);
        let start = Instant::now();
        let timeout = self.config.build_timeout();

        let fetched = tokio::time::timeout(timeout, self.catalog.fetch_primary_catalog(self.config.fetch_limit)).await;
        let built = match fetched {
            Err(_) => Err(EngineError::BuildTimeout(timeout)),
            Ok(Err(e)) => Err(EngineError::BuildFailure(format!("{e:#}"))),
            Ok(Ok(records)) => Ok(Arc::new(build(records))),
        };

        let mut slot = self.slot.write();
        match built {
            Ok(snapshot) => {
                slot.snapshot = Some(snapshot.clone());
                slot.stale = false;
                slot.last_error = None;
                tracing::info!(
                    records = snapshot.record_count(),
                    terms = snapshot.term_count(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "index built"
                );
                Ok(snapshot)
            }
            Err(e) => {
                slot.last_error = Some(e.to_string());
                tracing::warn!(error = %e, serving_stale = slot.snapshot.is_some(), "index build failed");
                Err(e)
            }
        }
    }
}
