//! File-backed document store
//!
//! Provides a `Store` that reads and writes whole JSON documents keyed by a
//! fixed set of logical names. The typed helpers (`save_routes`,
//! `load_notes`, ...) never return errors: writes report a success flag and
//! reads fall back to an empty default, logging the underlying failure.
//! List documents are decoded record by record, so one unreadable record is
//! skipped instead of emptying the whole list.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::data::{Note, PaginationSettings, Route};

/// Logical names of the stored documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Routes,
    Notes,
    Cache,
    Pagination,
}

impl StoreKey {
    pub const ALL: [StoreKey; 4] = [
        StoreKey::Routes,
        StoreKey::Notes,
        StoreKey::Cache,
        StoreKey::Pagination,
    ];

    /// Storage name of the document
    pub fn name(&self) -> &'static str {
        match self {
            StoreKey::Routes => "travel_routes",
            StoreKey::Notes => "travel_notes",
            StoreKey::Cache => "travel_cache",
            StoreKey::Pagination => "travel_pagination",
        }
    }
}

/// Errors from raw document access
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The document is not valid JSON for the expected type
    #[error("Malformed document {key}: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The value could not be serialized
    #[error("Failed to serialize {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Summary of what is stored, for debugging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageStats {
    /// Number of documents present
    pub items: usize,
    /// Approximate size of all documents in kilobytes
    pub size_kb: f64,
    pub routes: usize,
    pub notes: usize,
    pub cache_keys: usize,
}

/// Reads and writes whole JSON documents in a directory
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Creates a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.name()))
    }

    fn io_error(path: &Path, source: io::Error) -> StorageError {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Reads the raw document text, `None` if it does not exist
    pub fn read_raw(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }

    /// Replaces the raw document text
    pub fn write_raw(&self, key: StoreKey, text: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;
        let path = self.path(key);
        fs::write(&path, text).map_err(|e| Self::io_error(&path, e))
    }

    /// Deletes a document; deleting a missing document is not an error
    pub fn remove(&self, key: StoreKey) -> Result<(), StorageError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }

    /// Reads and deserializes a document, `None` if it does not exist
    pub fn load_json<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Option<T>, StorageError> {
        let Some(text) = self.read_raw(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StorageError::Malformed {
                key: key.name(),
                source,
            })
    }

    /// Serializes and writes a document
    pub fn save_json<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.name(),
            source,
        })?;
        self.write_raw(key, &json)
    }

    fn save_or_log<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> bool {
        match self.save_json(key, value) {
            Ok(()) => {
                debug!(key = key.name(), "document saved");
                true
            }
            Err(e) => {
                error!(key = key.name(), error = %e, "failed to save document");
                false
            }
        }
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: StoreKey) -> T {
        match self.load_json(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                error!(key = key.name(), error = %e, "failed to load document");
                T::default()
            }
        }
    }

    /// Loads a list document, skipping records that do not decode as `T`
    fn load_records<T: DeserializeOwned>(&self, key: StoreKey) -> Vec<T> {
        let raw: Vec<serde_json::Value> = self.load_or_default(key);
        raw.into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(key = key.name(), index, error = %e, "skipping unreadable record");
                    None
                }
            })
            .collect()
    }

    /// Saves the whole routes list
    pub fn save_routes(&self, routes: &[Route]) -> bool {
        self.save_or_log(StoreKey::Routes, routes)
    }

    /// Loads the routes list; unreadable records are dropped
    pub fn load_routes(&self) -> Vec<Route> {
        self.load_records(StoreKey::Routes)
    }

    /// Saves the whole notes list
    pub fn save_notes(&self, notes: &[Note]) -> bool {
        self.save_or_log(StoreKey::Notes, notes)
    }

    /// Loads the notes list; unreadable records are dropped
    pub fn load_notes(&self) -> Vec<Note> {
        self.load_records(StoreKey::Notes)
    }

    /// Saves the pagination snapshot
    pub fn save_settings(&self, settings: &PaginationSettings) -> bool {
        self.save_or_log(StoreKey::Pagination, settings)
    }

    /// Loads the pagination snapshot, defaults on any failure
    pub fn load_settings(&self) -> PaginationSettings {
        self.load_or_default(StoreKey::Pagination)
    }

    /// Removes every document
    pub fn clear(&self) -> bool {
        let mut ok = true;
        for key in StoreKey::ALL {
            if let Err(e) = self.remove(key) {
                error!(key = key.name(), error = %e, "failed to remove document");
                ok = false;
            }
        }
        ok
    }

    /// Checks that the directory can be written
    pub fn is_available(&self) -> bool {
        let probe = self.dir.join(".triplog_probe");
        let result = fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&probe, b"test"))
            .and_then(|_| fs::remove_file(&probe));
        if let Err(e) = result {
            debug!(dir = %self.dir.display(), error = %e, "storage probe failed");
            return false;
        }
        true
    }

    /// Counts stored documents and their contents
    pub fn stats(&self) -> StorageStats {
        let mut stats = StorageStats::default();
        let mut bytes = 0usize;
        for key in StoreKey::ALL {
            if let Ok(Some(text)) = self.read_raw(key) {
                bytes += text.len();
                stats.items += 1;
            }
        }
        stats.size_kb = bytes as f64 / 1024.0;
        stats.routes = self.load_routes().len();
        stats.notes = self.load_notes().len();
        stats.cache_keys = self
            .load_or_default::<HashMap<String, serde_json::Value>>(StoreKey::Cache)
            .len();
        stats
    }
}
