//! Durable snapshot storage, keyed and ordered by capture timestamp.
//!
//! The filesystem is the index: one `<millis>.snapshot` file per snapshot
//! under the configured directory, content is the payload verbatim. "Latest"
//! is derived by sorting the parsed filenames, so no separate index
//! structure is needed — snapshot volume is low (one per poll cycle) and
//! durability across restarts is required.
//!
//! There is no in-memory cache (every read hits the filesystem) and no
//! locking of the directory: concurrent writers are out of scope.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;

use crate::error::StorageError;
use crate::snapshot::Snapshot;

const SNAPSHOT_EXT: &str = "snapshot";

/// Keyed snapshot storage behind an interface, so the watcher logic runs
/// against the filesystem in production and in-memory in tests.
pub trait SnapshotStore {
    /// All stored capture timestamps, ascending. Empty is a valid outcome.
    fn list_timestamps(&self) -> Result<Vec<i64>, StorageError>;

    /// Snapshot stored under `timestamp`; missing key is an error.
    fn get(&self, timestamp: i64) -> Result<Snapshot, StorageError>;

    /// Persist a snapshot under its own capture timestamp.
    fn put(&self, snapshot: &Snapshot) -> Result<(), StorageError>;

    /// Snapshot with the maximum stored timestamp, if any.
    fn latest(&self) -> Result<Option<Snapshot>, StorageError> {
        match self.list_timestamps()?.last() {
            Some(&ts) => Ok(Some(self.get(ts)?)),
            None => Ok(None),
        }
    }
}

/// One file per snapshot under a local directory.
#[derive(Debug)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    /// Open the store, creating the directory if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, timestamp: i64) -> PathBuf {
        self.dir.join(format!("{timestamp}.{SNAPSHOT_EXT}"))
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn list_timestamps(&self) -> Result<Vec<i64>, StorageError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| StorageError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut timestamps = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXT) {
                debug!("skipping foreign file {}", path.display());
                continue;
            }
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i64>().ok())
            {
                Some(ts) => timestamps.push(ts),
                None => debug!("skipping unparsable snapshot name {}", path.display()),
            }
        }
        timestamps.sort_unstable();
        Ok(timestamps)
    }

    fn get(&self, timestamp: i64) -> Result<Snapshot, StorageError> {
        let path = self.file_path(timestamp);
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::MissingKey(timestamp)
            } else {
                StorageError::Io {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;
        let payload =
            String::from_utf8(bytes).map_err(|_| StorageError::BadPayload { path })?;
        Ok(Snapshot::with_timestamp(payload, timestamp))
    }

    fn put(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let path = self.file_path(snapshot.captured_at());
        let io_err = |e| StorageError::Io {
            path: path.clone(),
            source: e,
        };
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .map_err(io_err)?;
        f.write_all(snapshot.payload().as_bytes()).map_err(io_err)?;
        f.sync_all().map_err(io_err)?;
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemSnapshotStore {
    map: Mutex<BTreeMap<i64, String>>,
}

impl MemSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, BTreeMap<i64, String>> {
        self.map.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemSnapshotStore {
    fn list_timestamps(&self) -> Result<Vec<i64>, StorageError> {
        Ok(self.map().keys().copied().collect())
    }

    fn get(&self, timestamp: i64) -> Result<Snapshot, StorageError> {
        self.map()
            .get(&timestamp)
            .map(|payload| Snapshot::with_timestamp(payload.clone(), timestamp))
            .ok_or(StorageError::MissingKey(timestamp))
    }

    fn put(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.map()
            .insert(snapshot.captured_at(), snapshot.payload().to_string());
        Ok(())
    }
}
