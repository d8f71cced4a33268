//! Inventory persistence.
//!
//! Records are keyed by `(site, period)` and written with replace-on-conflict
//! semantics. A batch is saved one record at a time and stops at the first
//! failure; records written before the failure stay written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extractor::InventoryRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store file '{path}' is not valid inventory JSON: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store rejected {site} {period}: {message}")]
    Rejected {
        site: String,
        period: String,
        message: String,
    },

    #[error("saving {site} {period} failed: {source}")]
    Save {
        site: String,
        period: String,
        #[source]
        source: Box<StoreError>,
    },
}

/// A stored inventory record with its import provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInventory {
    #[serde(flatten)]
    pub record: InventoryRecord,
    pub source_name: String,
    pub imported_at: DateTime<Utc>,
}

impl StoredInventory {
    pub fn new(record: InventoryRecord, source_name: &str) -> Self {
        Self {
            record,
            source_name: source_name.to_string(),
            imported_at: Utc::now(),
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.record.site.clone(), self.record.period.clone())
    }
}

pub trait InventoryStore {
    /// Inserts the entry, replacing any entry with the same `(site, period)`.
    fn upsert(&mut self, entry: StoredInventory) -> Result<(), StoreError>;

    fn get(&self, site: &str, period: &str) -> Option<&StoredInventory>;

    /// All entries ordered by site, then period.
    fn entries(&self) -> Vec<StoredInventory>;
}

/// Upserts `records` in order, stopping at the first failure.
///
/// Returns how many records were written.
pub fn save_records<S>(store: &mut S, records: &[InventoryRecord], source_name: &str) -> Result<usize, StoreError>
where
    S: InventoryStore + ?Sized,
{
    for (saved, record) in records.iter().enumerate() {
        store
            .upsert(StoredInventory::new(record.clone(), source_name))
            .map_err(|err| {
                tracing::error!(site = %record.site, period = %record.period, saved, error = %err, "inventory save aborted");
                StoreError::Save {
                    site: record.site.clone(),
                    period: record.period.clone(),
                    source: Box::new(err),
                }
            })?;
        tracing::debug!(site = %record.site, period = %record.period, "inventory record saved");
    }
    Ok(records.len())
}

#[derive(Debug, Default)]
pub struct MemoryInventoryStore {
    entries: BTreeMap<(String, String), StoredInventory>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl InventoryStore for MemoryInventoryStore {
    fn upsert(&mut self, entry: StoredInventory) -> Result<(), StoreError> {
        self.entries.insert(entry.key(), entry);
        Ok(())
    }

    fn get(&self, site: &str, period: &str) -> Option<&StoredInventory> {
        self.entries.get(&(site.to_string(), period.to_string()))
    }

    fn entries(&self) -> Vec<StoredInventory> {
        self.entries.values().cloned().collect()
    }
}

/// Keeps the whole store in memory and rewrites the JSON file after every
/// upsert.
#[derive(Debug)]
pub struct JsonFileInventoryStore {
    path: PathBuf,
    inner: MemoryInventoryStore,
}

impl JsonFileInventoryStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut inner = MemoryInventoryStore::new();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            if !content.trim().is_empty() {
                let entries: Vec<StoredInventory> =
                    serde_json::from_str(&content).map_err(|source| StoreError::Serialization {
                        path: path.display().to_string(),
                        source,
                    })?;
                for entry in entries {
                    inner.upsert(entry)?;
                }
            }
        }

        tracing::debug!(path = %path.display(), entries = inner.len(), "opened inventory store");
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = serde_json::to_string_pretty(&self.inner.entries()).map_err(|source| {
            StoreError::Serialization {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content).map_err(io_error)?;
        fs::rename(&staging, &self.path).map_err(io_error)?;
        Ok(())
    }
}

impl InventoryStore for JsonFileInventoryStore {
    fn upsert(&mut self, entry: StoredInventory) -> Result<(), StoreError> {
        self.inner.upsert(entry)?;
        self.persist()
    }

    fn get(&self, site: &str, period: &str) -> Option<&StoredInventory> {
        self.inner.get(site, period)
    }

    fn entries(&self) -> Vec<StoredInventory> {
        self.inner.entries()
    }
}
