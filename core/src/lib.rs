//! Catalog search and suggestion engine.
//!
//! Builds an in-memory inverted index over the primary catalog, answers ranked queries and
//! title completions against it, and merges primary hits with substring matches from the
//! licensed-works and e-book partitions. When the index cannot be built, primary results
//! come from a linear scan and are flagged as degraded.

pub mod builder;
pub mod catalog_file;
pub mod config;
pub mod error;
pub mod fallback;
pub mod index;
pub mod manager;
pub mod merge;
pub mod query;
pub mod source;
pub mod suggest;
pub mod tokenizer;

pub use builder::build;
pub use catalog_file::FileCatalog;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use index::{Field, IndexSnapshot, IndexStats, Posting, Record, RecordId, SourceType};
pub use manager::{IndexManager, IndexState, IndexStatus};
pub use merge::{CatalogSearch, Hit, SearchOutcome, Suggestions};
pub use query::{query, ScoredId};
pub use source::{MemoryCatalog, PrimaryCatalog, SecondarySource};
pub use suggest::suggest;
