use serde::Deserialize;
use std::time::Duration;

/// Engine limits and timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `max_count` handed to the primary catalog fetch when building.
    pub fetch_limit: usize,
    pub build_timeout_ms: u64,
    /// Bound on each secondary source call and on the fallback fetch.
    pub source_timeout_ms: u64,
    pub primary_limit: usize,
    pub secondary_limit: usize,
    pub suggest_limit: usize,
    pub max_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fetch_limit: 5000,
            build_timeout_ms: 5000,
            source_timeout_ms: 3000,
            primary_limit: 20,
            secondary_limit: 20,
            suggest_limit: 8,
            max_limit: 100,
        }
    }
}

impl EngineConfig {
    pub fn build_timeout(&self) -> Duration { Duration::from_millis(self.build_timeout_ms) }
    pub fn source_timeout(&self) -> Duration { Duration::from_millis(self.source_timeout_ms) }

    /// Clamp a caller-supplied limit into `1..=max_limit`.
    pub fn clamp_limit(&self, limit: usize) -> usize { limit.max(1).min(self.max_limit.max(1)) }
}
