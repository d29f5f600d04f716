//! Batch ingestion of orbit file names

use std::io::BufRead;
use tracing::{error, warn};

use super::RecordBuilder;
use crate::index::OrbitIndex;

/// Outcome of one ingestion batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub indexed: usize,
    /// Names that are not valid orbit file names
    pub rejected: usize,
    /// Valid names the index could not store
    pub failed: usize,
}

impl IngestSummary {
    pub fn total(&self) -> usize {
        self.indexed + self.rejected + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }
}

/// Ingest every name in order. A bad name or a failed write does not stop
/// the batch.
pub async fn ingest_all<I, S>(builder: &RecordBuilder, index: &dyn OrbitIndex, names: I) -> IngestSummary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut summary = IngestSummary::default();
    for name in names {
        let name = name.as_ref();
        match builder.ingest(index, name).await {
            Ok(_) => summary.indexed += 1,
            Err(e) if e.is_client_error() => {
                warn!("Rejected: {}", e);
                summary.rejected += 1;
            }
            Err(e) => {
                error!("Failed to index {}: {}", name, e);
                summary.failed += 1;
            }
        }
    }
    summary
}

/// One orbit file name per line. Surrounding whitespace and blank lines are skipped.
pub fn read_orbit_file_names(reader: impl BufRead) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
