//! Data model shared by the orbit lookup service and the ingestion tool

pub mod timestamp;
pub mod types;

pub use timestamp::{CompactTimestamp, TimestampError};
pub use types::{OrbitRecord, Platform};
