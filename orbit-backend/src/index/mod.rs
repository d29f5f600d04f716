//! Orbit record index
//!
//! The index is the only state shared between lookups and ingestion. It is
//! keyed by `orbit_file` and carries a secondary ordered index on
//! `(platform, validity_start)` for the lookup's range scan.
//!
//! ## Implementations
//! - `MemoryIndex`: in-process tables, used for tests and as a working set
//! - `JsonFileIndex`: a JSON table on disk shared between processes

use async_trait::async_trait;
use orbit_common::{CompactTimestamp, OrbitRecord, Platform};
use std::path::PathBuf;

mod memory;
pub use memory::MemoryIndex;

mod json_file;
pub use json_file::JsonFileIndex;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("index unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error on index table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt index table {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to serialize index table: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Range scan over the `(platform, validity_start)` secondary index.
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityQuery {
    pub platform: Platform,
    pub validity_start_from: CompactTimestamp,
    pub validity_start_to: CompactTimestamp,
}

impl ValidityQuery {
    pub fn matches(&self, record: &OrbitRecord) -> bool {
        record.platform == self.platform
            && record.validity_start >= self.validity_start_from
            && record.validity_start <= self.validity_start_to
    }
}

#[async_trait]
pub trait OrbitIndex: Send + Sync {
    /// Insert or replace the record stored under `record.orbit_file`.
    async fn put(&self, record: OrbitRecord) -> Result<(), IndexError>;

    /// Records matching the query, ordered by `(validity_start, orbit_file)`.
    async fn query(&self, query: &ValidityQuery) -> Result<Vec<OrbitRecord>, IndexError>;

    async fn get(&self, orbit_file: &str) -> Result<Option<OrbitRecord>, IndexError>;

    async fn len(&self) -> Result<usize, IndexError>;
}
