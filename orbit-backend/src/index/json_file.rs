//! JSON table on disk
//!
//! The table is a pretty-printed JSON array of records sorted by
//! `orbit_file`, so rewriting an unchanged table produces identical bytes.
//! The file is re-read whenever it is replaced, which lets the ingestion tool
//! and the lookup server share one table.
//!
//! Writers serialize on an advisory lock held on `<table>.lock` for the
//! whole read-modify-write cycle, and each rewrite goes through its own
//! temporary file that is renamed over the table.

use async_trait::async_trait;
use fs4::fs_std::FileExt;
use orbit_common::OrbitRecord;
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::memory::Tables;
use super::{IndexError, OrbitIndex, ValidityQuery};

/// Identity of one version of the table file.
///
/// Every rewrite renames a fresh file into place, so the inode changes even
/// when the filesystem's mtime granularity hides the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
    #[cfg(unix)]
    inode: u64,
}

impl FileStamp {
    fn of(metadata: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        use std::os::unix::fs::MetadataExt;

        Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
            #[cfg(unix)]
            inode: metadata.ino(),
        }
    }
}

#[derive(Debug)]
struct FileState {
    tables: Tables,
    /// Version of the file the tables were loaded from, `None` if it was absent
    stamp: Option<FileStamp>,
}

pub struct JsonFileIndex {
    path: PathBuf,
    lock_path: PathBuf,
    state: RwLock<FileState>,
}

impl JsonFileIndex {
    /// Open the table at `path`. A missing file is an empty table.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| IndexError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let (tables, stamp) = load_tables(&path).await?;
        info!("Opened index table {:?} with {} records", path, tables.len());

        let mut lock_path = OsString::from(path.as_os_str());
        lock_path.push(".lock");

        Ok(Self {
            path,
            lock_path: PathBuf::from(lock_path),
            state: RwLock::new(FileState { tables, stamp }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload the table if another writer replaced the file.
    async fn refresh(&self) -> Result<(), IndexError> {
        let on_disk = file_stamp(&self.path).await?;
        if self.state.read().await.stamp == on_disk {
            return Ok(());
        }

        let mut state = self.state.write().await;
        if state.stamp == on_disk {
            return Ok(());
        }
        let (tables, stamp) = load_tables(&self.path).await?;
        debug!("Reloaded index table {:?} ({} records)", self.path, tables.len());
        *state = FileState { tables, stamp };
        Ok(())
    }

    /// Block until this handle is the only writer of the table.
    /// The lock is released when the returned file is dropped.
    async fn lock_writers(&self) -> Result<std::fs::File, IndexError> {
        let lock_path = self.lock_path.clone();
        let locked = tokio::task::spawn_blocking(move || {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            FileExt::lock_exclusive(&file)?;
            Ok::<_, std::io::Error>(file)
        })
        .await
        .map_err(std::io::Error::other)
        .and_then(|locked| locked);

        locked.map_err(|source| IndexError::Io {
            path: self.lock_path.clone(),
            source,
        })
    }

    async fn persist(&self, tables: &Tables) -> Result<Option<FileStamp>, IndexError> {
        let content = serde_json::to_string_pretty(&tables.sorted_records())?;

        let path = self.path.clone();
        let written = tokio::task::spawn_blocking(move || replace_file(&path, content.as_bytes()))
            .await
            .map_err(std::io::Error::other)
            .and_then(|written| written);
        written.map_err(|source| IndexError::Io {
            path: self.path.clone(),
            source,
        })?;

        file_stamp(&self.path).await
    }
}

/// Write `content` to a uniquely named sibling of `path`, then rename it over `path`.
fn replace_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

async fn file_stamp(path: &Path) -> Result<Option<FileStamp>, IndexError> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(Some(FileStamp::of(&metadata))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(IndexError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn load_tables(path: &Path) -> Result<(Tables, Option<FileStamp>), IndexError> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Index table {:?} does not exist yet", path);
            return Ok((Tables::default(), None));
        }
        Err(source) => {
            return Err(IndexError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let stamp = FileStamp::of(&metadata);

    let content = fs::read_to_string(path).await.map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records: Vec<OrbitRecord> =
        serde_json::from_str(&content).map_err(|e| IndexError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if let Some(bad) = records.iter().find(|r| !r.has_ordered_window()) {
        return Err(IndexError::Corrupt {
            path: path.to_path_buf(),
            reason: format!(
                "record {} has validity_start {} after validity_end {}",
                bad.orbit_file, bad.validity_start, bad.validity_end
            ),
        });
    }

    Ok((Tables::from_records(records), Some(stamp)))
}

#[async_trait]
impl OrbitIndex for JsonFileIndex {
    async fn put(&self, record: OrbitRecord) -> Result<(), IndexError> {
        let mut state = self.state.write().await;
        let _writer = self.lock_writers().await?;

        // Start from the committed table, not from this handle's snapshot,
        // and only publish the candidate once it is on disk.
        let (mut tables, _) = load_tables(&self.path).await?;
        tables.upsert(record);
        let stamp = self.persist(&tables).await?;
        *state = FileState { tables, stamp };
        Ok(())
    }

    async fn query(&self, query: &ValidityQuery) -> Result<Vec<OrbitRecord>, IndexError> {
        self.refresh().await?;
        Ok(self.state.read().await.tables.range(query))
    }

    async fn get(&self, orbit_file: &str) -> Result<Option<OrbitRecord>, IndexError> {
        self.refresh().await?;
        Ok(self.state.read().await.tables.get(orbit_file))
    }

    async fn len(&self) -> Result<usize, IndexError> {
        self.refresh().await?;
        Ok(self.state.read().await.tables.len())
    }
}
