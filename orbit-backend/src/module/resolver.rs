//! Orbit resolver
//!
//! Finds the orbit files covering a product's acquisition window.
//!
//! # Coverage
//! A record covers `(platform, start, end)` when its platform matches, its
//! `validity_start` lies in `[start - LOOKBACK_DAYS, start]` and its
//! `validity_end >= end`.
//!
//! # Ordering
//! `product_type` ascending, then `ingestion_date` descending, so the head of
//! the list is the preferred candidate. Further ties keep index order.

use orbit_common::{CompactTimestamp, OrbitRecord, Platform};
use std::sync::Arc;
use tracing::debug;

use super::product_name::parse_product_name;
use crate::error::{OrbitError, Result};
use crate::index::{OrbitIndex, ValidityQuery};

/// How far before the acquisition start an orbit file may begin
pub const LOOKBACK_DAYS: i64 = 3;

pub struct OrbitResolver {
    index: Arc<dyn OrbitIndex>,
}

impl OrbitResolver {
    pub fn new(index: Arc<dyn OrbitIndex>) -> Self {
        Self { index }
    }

    /// Parse `product_name` and resolve its covering orbit files.
    pub async fn lookup(&self, product_name: &str) -> Result<Vec<OrbitRecord>> {
        let identity = parse_product_name(product_name)?;
        self.resolve(
            identity.platform,
            identity.acquisition_start,
            identity.acquisition_end,
        )
        .await
    }

    /// All orbit files covering `[start, end]` on `platform`, best first.
    ///
    /// An empty list means nothing covers the window; it is not an error.
    pub async fn resolve(
        &self,
        platform: Platform,
        start: CompactTimestamp,
        end: CompactTimestamp,
    ) -> Result<Vec<OrbitRecord>> {
        let query = ValidityQuery {
            platform,
            validity_start_from: start.minus_days(LOOKBACK_DAYS),
            validity_start_to: start,
        };

        let candidates = self.index.query(&query).await?;
        let candidate_count = candidates.len();

        let mut covering = Vec::with_capacity(candidate_count);
        for record in candidates {
            check_integrity(&query, &record)?;
            if record.validity_end >= end {
                covering.push(record);
            }
        }

        rank(&mut covering);

        debug!(
            "Resolved {} {}..{}: {} candidates, {} covering",
            platform,
            start,
            end,
            candidate_count,
            covering.len()
        );
        Ok(covering)
    }
}

/// The index must only hand back well-formed rows inside the scanned range.
fn check_integrity(query: &ValidityQuery, record: &OrbitRecord) -> Result<()> {
    if !query.matches(record) {
        return Err(OrbitError::DataIntegrity(format!(
            "index returned {} ({} from {}) outside scan {} [{}, {}]",
            record.orbit_file,
            record.platform,
            record.validity_start,
            query.platform,
            query.validity_start_from,
            query.validity_start_to
        )));
    }
    if !record.has_ordered_window() {
        return Err(OrbitError::DataIntegrity(format!(
            "record {} has validity_start {} after validity_end {}",
            record.orbit_file, record.validity_start, record.validity_end
        )));
    }
    Ok(())
}

/// Single stable sort: `product_type` ascending, `ingestion_date` descending.
fn rank(records: &mut [OrbitRecord]) {
    records.sort_by(|a, b| {
        a.product_type
            .cmp(&b.product_type)
            .then_with(|| b.ingestion_date.cmp(&a.ingestion_date))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexError, MemoryIndex};
    use async_trait::async_trait;

    fn ts(s: &str) -> CompactTimestamp {
        s.parse().unwrap()
    }

    fn record(
        name: &str,
        product_type: &str,
        ingestion: &str,
        start: &str,
        end: &str,
    ) -> OrbitRecord {
        OrbitRecord {
            orbit_file: name.to_string(),
            platform: Platform::S1A,
            product_type: product_type.to_string(),
            ingestion_date: ts(ingestion),
            validity_start: ts(start),
            validity_end: ts(end),
            url: format!("https://example.org/{product_type}/{name}"),
        }
    }

    fn resolver(records: Vec<OrbitRecord>) -> OrbitResolver {
        OrbitResolver::new(Arc::new(MemoryIndex::with_records(records)))
    }

    fn names(records: &[OrbitRecord]) -> Vec<&str> {
        records.iter().map(|r| r.orbit_file.as_str()).collect()
    }

    /// Index double that returns a fixed result regardless of the query
    struct FixedIndex(std::result::Result<Vec<OrbitRecord>, String>);

    #[async_trait]
    impl OrbitIndex for FixedIndex {
        async fn put(&self, _record: OrbitRecord) -> std::result::Result<(), IndexError> {
            Err(IndexError::Unavailable("read-only".to_string()))
        }

        async fn query(
            &self,
            _query: &ValidityQuery,
        ) -> std::result::Result<Vec<OrbitRecord>, IndexError> {
            self.0.clone().map_err(IndexError::Unavailable)
        }

        async fn get(&self, _orbit_file: &str) -> std::result::Result<Option<OrbitRecord>, IndexError> {
            Ok(None)
        }

        async fn len(&self) -> std::result::Result<usize, IndexError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_filters_by_coverage() {
        let resolver = resolver(vec![
            // covers
            record("ok", "POEORB", "20210105T000000", "20201231T225942", "20210102T005942"),
            // ends before the acquisition ends
            record("short", "POEORB", "20210105T000000", "20201231T225942", "20210101T000010"),
            // starts after the acquisition starts
            record("late", "POEORB", "20210105T000000", "20210101T000001", "20210102T000000"),
            // starts more than three days early
            record("stale", "POEORB", "20210105T000000", "20201228T235959", "20210102T000000"),
        ]);

        let hits = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap();
        assert_eq!(names(&hits), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_end_boundary_is_inclusive() {
        let resolver = resolver(vec![record(
            "exact",
            "RESORB",
            "20210101T030000",
            "20210101T000000",
            "20210101T000020",
        )]);
        let hits = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap();
        assert_eq!(names(&hits), vec!["exact"]);
    }

    #[tokio::test]
    async fn test_lookback_boundary() {
        let resolver = resolver(vec![
            record("edge", "POEORB", "20210105T000000", "20201229T120000", "20210102T000000"),
            record("day-early", "POEORB", "20210105T000000", "20201228T120000", "20210102T000000"),
        ]);
        let hits = resolver
            .resolve(Platform::S1A, ts("20210101T120000"), ts("20210101T120025"))
            .await
            .unwrap();
        assert_eq!(names(&hits), vec!["edge"]);
    }

    #[tokio::test]
    async fn test_other_platform_is_ignored() {
        let mut other = record("s1b", "POEORB", "20210105T000000", "20201231T000000", "20210102T000000");
        other.platform = Platform::S1B;
        let resolver = resolver(vec![other]);
        let hits = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_no_coverage_is_empty_not_error() {
        let resolver = resolver(Vec::new());
        let hits = resolver
            .resolve(Platform::S1B, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_ranking_product_type_then_newest_ingestion() {
        let resolver = resolver(vec![
            record("res-old", "RESORB", "20210101T010000", "20201231T230000", "20210101T030000"),
            record("poe-old", "POEORB", "20210120T000000", "20201230T225942", "20210101T005942"),
            record("res-new", "RESORB", "20210101T040000", "20201231T233000", "20210101T033000"),
            record("poe-new", "POEORB", "20210121T000000", "20201231T225942", "20210102T005942"),
        ]);
        let hits = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap();
        assert_eq!(names(&hits), vec!["poe-new", "poe-old", "res-new", "res-old"]);

        for pair in hits.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.product_type < b.product_type
                    || (a.product_type == b.product_type && a.ingestion_date >= b.ingestion_date)
            );
        }
    }

    #[tokio::test]
    async fn test_full_ties_keep_index_order() {
        let tie = |name: &str, start: &str| {
            record(name, "POEORB", "20210105T000000", start, "20210102T000000")
        };
        // Index order is (validity_start, orbit_file)
        let resolver = resolver(vec![
            tie("c", "20201231T000000"),
            tie("a", "20201231T120000"),
            tie("b", "20201231T000000"),
        ]);
        let hits = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap();
        assert_eq!(names(&hits), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_lookup_parses_then_resolves() {
        let resolver = resolver(vec![record(
            "S1A_OPER_AUX_POEORB_OPOD_20210121T121609_V20201231T225942_20210102T005942.EOF",
            "POEORB",
            "20210121T121609",
            "20201231T225942",
            "20210102T005942",
        )]);
        let hits = resolver
            .lookup("S1A_IW_GRDH_1SDV_20210101T000000_20210101T000020_036000_0439F1_1A2B")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let err = resolver.lookup("not-a-product").await.unwrap_err();
        assert!(matches!(err, OrbitError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_index_fault_propagates() {
        let resolver = OrbitResolver::new(Arc::new(FixedIndex(Err("connection refused".to_string()))));
        let err = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrbitError::Index(IndexError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_row_is_integrity_fault() {
        let stray = record("stray", "POEORB", "20210105T000000", "20201201T000000", "20210102T000000");
        let resolver = OrbitResolver::new(Arc::new(FixedIndex(Ok(vec![stray]))));
        let err = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrbitError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_inverted_window_row_is_integrity_fault() {
        let inverted = record("inverted", "POEORB", "20210105T000000", "20201231T000000", "20201230T000000");
        let resolver = OrbitResolver::new(Arc::new(FixedIndex(Ok(vec![inverted]))));
        let err = resolver
            .resolve(Platform::S1A, ts("20210101T000000"), ts("20210101T000020"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrbitError::DataIntegrity(_)));
    }
}
