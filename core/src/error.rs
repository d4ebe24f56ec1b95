use crate::index::SourceType;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("index build failed: {0}")]
    BuildFailure(String),

    #[error("index build timed out after {0:?}")]
    BuildTimeout(Duration),

    #[error("{source_type} source unavailable: {reason}")]
    SourceUnavailable { source_type: SourceType, reason: String },

    #[error("failed to read {path}: {err}")]
    Io { path: PathBuf, err: std::io::Error },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl EngineError {
    /// True for errors that leave the index unbuilt; the next caller retries.
    pub fn is_build_failure(&self) -> bool {
        matches!(self, EngineError::BuildFailure(_) | EngineError::BuildTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
