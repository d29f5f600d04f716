use async_trait::async_trait;
use orbit_common::{CompactTimestamp, OrbitRecord, Platform};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use super::{IndexError, OrbitIndex, ValidityQuery};

/// Primary table plus the `(platform, validity_start)` secondary index
#[derive(Debug, Default)]
pub(crate) struct Tables {
    by_file: HashMap<String, OrbitRecord>,
    by_platform_start: BTreeMap<(Platform, CompactTimestamp), BTreeSet<String>>,
}

impl Tables {
    pub(crate) fn from_records(records: impl IntoIterator<Item = OrbitRecord>) -> Self {
        let mut tables = Self::default();
        for record in records {
            tables.upsert(record);
        }
        tables
    }

    pub(crate) fn upsert(&mut self, record: OrbitRecord) {
        let key = (record.platform, record.validity_start);
        let name = record.orbit_file.clone();

        if let Some(old) = self.by_file.insert(name.clone(), record) {
            let old_key = (old.platform, old.validity_start);
            if old_key != key {
                self.unlink(old_key, &name);
            }
        }
        self.by_platform_start.entry(key).or_default().insert(name);
    }

    fn unlink(&mut self, key: (Platform, CompactTimestamp), name: &str) {
        if let Some(names) = self.by_platform_start.get_mut(&key) {
            names.remove(name);
            if names.is_empty() {
                self.by_platform_start.remove(&key);
            }
        }
    }

    pub(crate) fn range(&self, query: &ValidityQuery) -> Vec<OrbitRecord> {
        // BTreeMap::range panics on an inverted range
        if query.validity_start_from > query.validity_start_to {
            return Vec::new();
        }

        let from = (query.platform, query.validity_start_from);
        let to = (query.platform, query.validity_start_to);
        self.by_platform_start
            .range(from..=to)
            .flat_map(|(_, names)| names.iter())
            .filter_map(|name| self.by_file.get(name).cloned())
            .collect()
    }

    pub(crate) fn get(&self, orbit_file: &str) -> Option<OrbitRecord> {
        self.by_file.get(orbit_file).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_file.len()
    }

    /// All records ordered by `orbit_file`
    pub(crate) fn sorted_records(&self) -> Vec<&OrbitRecord> {
        let mut records: Vec<&OrbitRecord> = self.by_file.values().collect();
        records.sort_by(|a, b| a.orbit_file.cmp(&b.orbit_file));
        records
    }
}

/// In-process index
#[derive(Debug, Default)]
pub struct MemoryIndex {
    tables: RwLock<Tables>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = OrbitRecord>) -> Self {
        Self {
            tables: RwLock::new(Tables::from_records(records)),
        }
    }
}

#[async_trait]
impl OrbitIndex for MemoryIndex {
    async fn put(&self, record: OrbitRecord) -> Result<(), IndexError> {
        self.tables.write().await.upsert(record);
        Ok(())
    }

    async fn query(&self, query: &ValidityQuery) -> Result<Vec<OrbitRecord>, IndexError> {
        Ok(self.tables.read().await.range(query))
    }

    async fn get(&self, orbit_file: &str) -> Result<Option<OrbitRecord>, IndexError> {
        Ok(self.tables.read().await.get(orbit_file))
    }

    async fn len(&self) -> Result<usize, IndexError> {
        Ok(self.tables.read().await.len())
    }
}
