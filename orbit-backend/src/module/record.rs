//! Orbit record builder
//!
//! Derives an [`OrbitRecord`] from an orbit file name such as
//! `S1A_OPER_AUX_POEORB_OPOD_20210121T121609_V20201231T225942_20210102T005942.EOF`
//! and writes it to the index.
//!
//! Field layout (underscore separated):
//! platform, file class, category, product type, site, ingestion date,
//! `V`-prefixed validity start, validity end with file extension.
//! The short form without the file class (`S1A_AUX_POEORB_OPOD_...`) is also
//! accepted; fields after the platform are located from the end of the name.

use orbit_common::{CompactTimestamp, OrbitRecord, Platform};
use tracing::info;

use crate::error::{OrbitError, Result};
use crate::index::OrbitIndex;

const FULL_FIELD_COUNT: usize = 8;
const SHORT_FIELD_COUNT: usize = 7;

/// Offsets from the end of the field list
const PRODUCT_TYPE_FROM_END: usize = 5;
const INGESTION_FROM_END: usize = 3;
const VALIDITY_START_FROM_END: usize = 2;
const VALIDITY_END_FROM_END: usize = 1;

const VALIDITY_START_MARKER: char = 'V';

/// Builds orbit records and download URLs under a fixed storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBuilder {
    storage_root: String,
}

impl RecordBuilder {
    /// `storage_root` is the URL prefix orbit files are served from,
    /// e.g. `https://my-bucket.s3.us-west-2.amazonaws.com`.
    pub fn new(storage_root: impl Into<String>) -> Self {
        let storage_root = storage_root.into().trim_end_matches('/').to_string();
        Self { storage_root }
    }

    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    /// `<storage root>/<product type>/<orbit file>`
    pub fn download_url(&self, product_type: &str, orbit_file: &str) -> String {
        format!("{}/{}/{}", self.storage_root, product_type, orbit_file)
    }

    /// Derive the record for `orbit_file`. Pure: the same name always yields
    /// the same record.
    pub fn build(&self, orbit_file: &str) -> Result<OrbitRecord> {
        let invalid = || OrbitError::InvalidOrbitFilename(orbit_file.to_string());

        let name_ok = orbit_file
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if !name_ok {
            return Err(invalid());
        }

        let fields: Vec<&str> = orbit_file.split('_').collect();
        let n = fields.len();
        if n != FULL_FIELD_COUNT && n != SHORT_FIELD_COUNT {
            return Err(invalid());
        }

        let platform: Platform = fields[0].parse().map_err(|_| invalid())?;

        let product_type = fields[n - PRODUCT_TYPE_FROM_END];
        if product_type.is_empty() || !product_type.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid());
        }

        let ingestion_date: CompactTimestamp =
            fields[n - INGESTION_FROM_END].parse().map_err(|_| invalid())?;

        let validity_start: CompactTimestamp = fields[n - VALIDITY_START_FROM_END]
            .strip_prefix(VALIDITY_START_MARKER)
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;

        let end_field = fields[n - VALIDITY_END_FROM_END];
        let validity_end: CompactTimestamp = end_field
            .split_once('.')
            .map_or(end_field, |(stem, _extension)| stem)
            .parse()
            .map_err(|_| invalid())?;

        if validity_start > validity_end {
            return Err(invalid());
        }

        Ok(OrbitRecord {
            orbit_file: orbit_file.to_string(),
            platform,
            product_type: product_type.to_string(),
            ingestion_date,
            validity_start,
            validity_end,
            url: self.download_url(product_type, orbit_file),
        })
    }

    /// Build the record for `orbit_file` and upsert it into `index`.
    ///
    /// Invalid names are rejected before anything is written.
    pub async fn ingest(&self, index: &dyn OrbitIndex, orbit_file: &str) -> Result<OrbitRecord> {
        let record = self.build(orbit_file)?;
        index.put(record.clone()).await?;
        info!(
            "Indexed {} ({} {}, valid {}..{})",
            record.orbit_file,
            record.platform,
            record.product_type,
            record.validity_start,
            record.validity_end
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{JsonFileIndex, MemoryIndex};
    use tempfile::TempDir;

    const ROOT: &str = "https://s1-orbits.s3.us-west-2.amazonaws.com";
    const SHORT: &str = "S1A_AUX_POEORB_OPOD_20210101T120000_V20201231T225942_20210102T005942.EOF";
    const FULL: &str =
        "S1B_OPER_AUX_RESORB_OPOD_20210101T041513_V20210101T001235_20210101T033005.EOF";

    fn builder() -> RecordBuilder {
        RecordBuilder::new(ROOT)
    }

    #[test]
    fn test_build_short_form() {
        let record = builder().build(SHORT).unwrap();
        assert_eq!(record.orbit_file, SHORT);
        assert_eq!(record.platform, Platform::S1A);
        assert_eq!(record.product_type, "POEORB");
        assert_eq!(record.ingestion_date.to_string(), "20210101T120000");
        assert_eq!(record.validity_start.to_string(), "20201231T225942");
        assert_eq!(record.validity_end.to_string(), "20210102T005942");
        assert!(record.url.contains("/POEORB/"));
        assert_eq!(record.url, format!("{ROOT}/POEORB/{SHORT}"));
    }

    #[test]
    fn test_build_full_form() {
        let record = builder().build(FULL).unwrap();
        assert_eq!(record.platform, Platform::S1B);
        assert_eq!(record.product_type, "RESORB");
        assert_eq!(record.ingestion_date.to_string(), "20210101T041513");
        assert_eq!(record.validity_start.to_string(), "20210101T001235");
        assert_eq!(record.validity_end.to_string(), "20210101T033005");
        assert_eq!(record.url, format!("{ROOT}/RESORB/{FULL}"));
    }

    #[test]
    fn test_extension_stripped_at_first_dot() {
        let name = "S1A_OPER_AUX_POEORB_OPOD_20210121T121609_V20201231T225942_20210102T005942.EOF.zip";
        let record = builder().build(name).unwrap();
        assert_eq!(record.validity_end.to_string(), "20210102T005942");
        assert_eq!(record.orbit_file, name);
    }

    #[test]
    fn test_trailing_slash_in_root_is_ignored() {
        let record = RecordBuilder::new(format!("{ROOT}/")).build(SHORT).unwrap();
        assert_eq!(record.url, format!("{ROOT}/POEORB/{SHORT}"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = serde_json::to_vec(&builder().build(FULL).unwrap()).unwrap();
        let second = serde_json::to_vec(&builder().build(FULL).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_bad_names() {
        let cases = [
            // too few fields
            "S1A_POEORB_OPOD_20210101T120000_V20201231T225942_20210102T005942.EOF",
            // too many fields
            "S1A_OPER_AUX_POEORB_OPOD_X_20210101T120000_V20201231T225942_20210102T005942.EOF",
            // unknown platform
            "S1C_OPER_AUX_POEORB_OPOD_20210101T120000_V20201231T225942_20210102T005942.EOF",
            // missing validity marker
            "S1A_OPER_AUX_POEORB_OPOD_20210101T120000_20201231T225942_20210102T005942.EOF",
            // malformed ingestion date
            "S1A_OPER_AUX_POEORB_OPOD_20210101_V20201231T225942_20210102T005942.EOF",
            // malformed validity end
            "S1A_OPER_AUX_POEORB_OPOD_20210101T120000_V20201231T225942_2021010.EOF",
            // validity window inverted
            "S1A_OPER_AUX_POEORB_OPOD_20210101T120000_V20210103T000000_20210102T005942.EOF",
            // empty product type
            "S1A_OPER_AUX__OPOD_20210101T120000_V20201231T225942_20210102T005942.EOF",
            // path separator
            "S1A_OPER_AUX_POEORB_OPOD/x_20210101T120000_V20201231T225942_20210102T005942.EOF",
            "",
        ];
        for name in cases {
            match builder().build(name) {
                Err(OrbitError::InvalidOrbitFilename(offending)) => assert_eq!(offending, name),
                other => panic!("expected InvalidOrbitFilename for {name:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let index = MemoryIndex::new();
        let first = builder().ingest(&index, SHORT).await.unwrap();
        let second = builder().ingest(&index, SHORT).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(index.len().await.unwrap(), 1);
        assert_eq!(index.get(SHORT).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_ingest_rejects_before_writing() {
        let index = MemoryIndex::new();
        let err = builder().ingest(&index, "not_an_orbit_file").await.unwrap_err();
        assert!(matches!(err, OrbitError::InvalidOrbitFilename(_)));
        assert_eq!(index.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reingest_leaves_table_bytes_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orbit-records.json");
        let index = JsonFileIndex::open(&path).await.unwrap();

        builder().ingest(&index, FULL).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        builder().ingest(&index, FULL).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(index.len().await.unwrap(), 1);
    }
}
