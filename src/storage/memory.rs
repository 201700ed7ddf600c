//! In-memory record store using `DashMap`, with optional Parquet persistence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use super::{parquet, RecordStore};
use crate::record::{Record, RecordHandle, RecordMeta, Series, Slot};
use crate::{Error, Result};

/// File extension of persisted series.
const SERIES_EXTENSION: &str = "parquet";

/// In-memory record store keyed by series tag.
///
/// Each series lives in its own `DashMap` shard entry, so a reader on one series
/// is not blocked by a writer appending to another. Without a persist directory
/// [`RecordStore::persist`] is a no-op and data is lost on process exit.
///
/// # Example
///
/// ```rust,no_run
/// use trueno_vislog::storage::{MemoryRecordStore, RecordStore};
///
/// # fn main() -> trueno_vislog::Result<()> {
/// let store = MemoryRecordStore::with_persist_dir("runs/exp-1");
/// store.add_caption("train/loss", "train/loss")?;
/// store.persist()?;
///
/// let restored = MemoryRecordStore::load_dir("runs/exp-1")?;
/// assert_eq!(restored.tags(), vec!["train/loss"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    series: DashMap<String, Series, FxBuildHasher>,
    persist_dir: Option<PathBuf>,
}

impl MemoryRecordStore {
    /// Create an in-memory store with no persistence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that persists each series under `dir`.
    #[must_use]
    pub fn with_persist_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            series: DashMap::default(),
            persist_dir: Some(dir.into()),
        }
    }

    /// Load every persisted series found in `dir`.
    ///
    /// The returned store persists back into the same directory.
    ///
    /// # Errors
    /// Returns error if the directory or any series file cannot be read
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let store = Self::with_persist_dir(dir);

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SERIES_EXTENSION) {
                continue;
            }
            let series = parquet::read_series(&path)?;
            store.series.insert(series.tag().to_string(), series);
        }

        tracing::debug!(dir = %dir.display(), series = store.series.len(), "loaded record store");
        Ok(store)
    }

    /// Directory `persist` writes into, if any.
    #[must_use]
    pub fn persist_dir(&self) -> Option<&Path> {
        self.persist_dir.as_deref()
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the store holds no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Snapshot of one series.
    #[must_use]
    pub fn series(&self, tag: &str) -> Option<Series> {
        self.series.get(tag).map(|s| s.value().clone())
    }

    fn with_record<T>(&self, handle: &RecordHandle, f: impl FnOnce(&Record) -> Result<T>) -> Result<T> {
        let series = self
            .series
            .get(handle.tag())
            .ok_or_else(|| Error::UnknownSeries(handle.tag().to_string()))?;
        let record = series
            .records()
            .get(handle.offset())
            .ok_or_else(|| Error::RecordNotFound {
                tag: handle.tag().to_string(),
                offset: handle.offset(),
            })?;
        f(record)
    }
}

/// File name for a series.
///
/// Percent-escapes `%`, `/` and `\` so distinct tags never share a file; the
/// tag itself is read back from the schema metadata.
fn series_file_name(tag: &str) -> String {
    let mut stem = String::with_capacity(tag.len());
    for c in tag.chars() {
        match c {
            '%' => stem.push_str("%25"),
            '/' => stem.push_str("%2F"),
            '\\' => stem.push_str("%5C"),
            _ => stem.push(c),
        }
    }
    format!("{stem}.{SERIES_EXTENSION}")
}

impl RecordStore for MemoryRecordStore {
    fn create_record(
        &self,
        tag: &str,
        step_id: u64,
        timestamp: DateTime<Utc>,
        capacity: usize,
    ) -> Result<RecordHandle> {
        let mut series = self
            .series
            .entry(tag.to_string())
            .or_insert_with(|| Series::new(tag));
        let offset = series.push(Record::new(step_id, timestamp, capacity));
        Ok(RecordHandle::new(tag, offset))
    }

    fn write_slot(
        &self,
        handle: &RecordHandle,
        index: usize,
        payload: Vec<u8>,
        shape: Vec<u64>,
    ) -> Result<()> {
        let mut series = self
            .series
            .get_mut(handle.tag())
            .ok_or_else(|| Error::UnknownSeries(handle.tag().to_string()))?;
        let record = series
            .record_mut(handle.offset())
            .ok_or_else(|| Error::RecordNotFound {
                tag: handle.tag().to_string(),
                offset: handle.offset(),
            })?;
        let capacity = record.capacity();
        if !record.set_slot(index, Slot::new(payload, shape)) {
            return Err(Error::StorageError(format!(
                "slot {index} out of range for record with {capacity} slots"
            )));
        }
        Ok(())
    }

    fn read_slot(&self, handle: &RecordHandle, index: usize) -> Result<Option<Slot>> {
        self.with_record(handle, |record| {
            if index >= record.capacity() {
                return Err(Error::StorageError(format!(
                    "slot {index} out of range for record with {} slots",
                    record.capacity()
                )));
            }
            Ok(record.slot(index).cloned())
        })
    }

    fn record_meta(&self, handle: &RecordHandle) -> Result<RecordMeta> {
        self.with_record(handle, |record| Ok(record.meta()))
    }

    fn record_count(&self, tag: &str) -> usize {
        self.series.get(tag).map_or(0, |s| s.len())
    }

    fn add_caption(&self, tag: &str, caption: &str) -> Result<()> {
        self.series
            .entry(tag.to_string())
            .or_insert_with(|| Series::new(tag))
            .add_caption(caption);
        Ok(())
    }

    fn captions(&self, tag: &str) -> Vec<String> {
        self.series
            .get(tag)
            .map(|s| s.captions().to_vec())
            .unwrap_or_default()
    }

    fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.series.iter().map(|s| s.key().clone()).collect();
        tags.sort();
        tags
    }

    fn persist(&self) -> Result<()> {
        let Some(dir) = self.persist_dir.as_deref() else {
            tracing::debug!("no persist directory configured, keeping records in memory");
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;

        // Snapshot first so no shard guard is held during file I/O
        let snapshots: Vec<Series> = self.series.iter().map(|e| e.value().clone()).collect();

        let mut records = 0;
        for series in &snapshots {
            let path = dir.join(series_file_name(series.tag()));
            parquet::write_series(&path, series)?;
            records += series.len();
        }

        tracing::info!(
            dir = %dir.display(),
            series = snapshots.len(),
            records,
            "persisted record store"
        );
        Ok(())
    }
}
