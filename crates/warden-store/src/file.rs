//! A single-file JSON store.
//!
//! The whole map lives in one JSON object. Every mutation writes the new
//! map to a sibling `*.tmp` file, syncs it, and renames it over the
//! original. Rename is atomic on the platforms we target, so a reader
//! (including a process that crashed mid-write and restarted) sees either
//! the old map or the new one.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{BatchOp, KeyValueStore, StoreError};

type Entries = BTreeMap<String, String>;

/// A [`KeyValueStore`] persisted as one JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (without reading) the store at `path`, creating missing
    /// parent directories. The file itself is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Entries, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            StoreError::Corrupt(format!("{}: {e}", self.path.display()))
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Io(io::Error::other(e)))?;

        let tmp = self.tmp_path();
        let mut file = File::create(&tmp)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl KeyValueStore for FileStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let entries = self.read_entries()?;
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn apply(&self, batch: Vec<BatchOp>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StoreError::Corrupt(reason)) => {
                tracing::warn!(%reason, "replacing corrupt store file");
                Entries::new()
            }
            Err(e) => return Err(e),
        };

        for op in batch {
            match op {
                BatchOp::Set { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }

        self.write_entries(&entries)
    }
}
