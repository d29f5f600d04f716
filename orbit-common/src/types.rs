use serde::{Deserialize, Serialize};

use crate::timestamp::CompactTimestamp;

/// Sentinel-1 platform (satellite unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "S1A")]
    S1A,
    #[serde(rename = "S1B")]
    S1B,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::S1A => "S1A",
            Platform::S1B => "S1B",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S1A" => Ok(Platform::S1A),
            "S1B" => Ok(Platform::S1B),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// One orbit file as stored in the index table.
///
/// `orbit_file` is the natural key; every other field is derived from it
/// when the record is built, and records are never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitRecord {
    /// Full orbit file name, e.g. "S1A_OPER_AUX_POEORB_OPOD_..._20210102T005942.EOF"
    pub orbit_file: String,
    pub platform: Platform,
    /// Precision tier, e.g. "POEORB" or "RESORB"
    pub product_type: String,
    /// When the file was published upstream
    pub ingestion_date: CompactTimestamp,
    pub validity_start: CompactTimestamp,
    pub validity_end: CompactTimestamp,
    /// Download location of the orbit file
    pub url: String,
}

impl OrbitRecord {
    /// Whether the validity window is ordered (`validity_start <= validity_end`)
    pub fn has_ordered_window(&self) -> bool {
        self.validity_start <= self.validity_end
    }
}
