//! Error taxonomy of the lookup and ingestion paths

use crate::index::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum OrbitError {
    /// Product name does not follow the Sentinel-1 naming convention
    #[error("{0} is not a valid Sentinel-1 product")]
    InvalidName(String),

    /// Orbit file name does not follow the orbit file naming convention
    #[error("{0} is not a valid orbit file name")]
    InvalidOrbitFilename(String),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// A stored record does not have the expected shape
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

impl OrbitError {
    /// Input errors are the caller's fault; everything else is a system fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidName(_) | Self::InvalidOrbitFilename(_))
    }
}

pub type Result<T> = std::result::Result<T, OrbitError>;
