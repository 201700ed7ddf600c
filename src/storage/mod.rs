//! Record store backends
//!
//! **Append-Only Write Pattern**:
//! - Records are appended to a series; offsets never move
//! - Slots inside a record are written in place (reservoir eviction overwrites)
//! - Persistence snapshots every series to Parquet, one file per series
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use trueno_vislog::storage::{MemoryRecordStore, RecordStore};
//!
//! # fn main() -> trueno_vislog::Result<()> {
//! let store = MemoryRecordStore::new();
//! let handle = store.create_record("train/image", 0, Utc::now(), 2)?;
//! store.write_slot(&handle, 0, vec![1, 2, 3, 4], vec![2, 2])?;
//!
//! let slot = store.read_slot(&handle, 0)?.expect("slot written");
//! assert_eq!(slot.shape(), &[2, 2]);
//! # Ok(())
//! # }
//! ```

mod memory;
pub mod parquet;

pub use memory::MemoryRecordStore;

use chrono::{DateTime, Utc};

use crate::record::{RecordHandle, RecordMeta, Slot};
use crate::Result;

/// Append-only record store consumed by the writers and readers.
///
/// Methods take `&self` so one store can be shared (`Arc`) between a writer and
/// any number of readers. Implementations are responsible for excluding
/// readers from a record while it is being written; callers keep a single
/// writer per record.
pub trait RecordStore: Send + Sync {
    /// Append a record with `capacity` empty slots to the series `tag`,
    /// creating the series if needed.
    ///
    /// # Errors
    /// Returns error if the backend cannot allocate the record
    fn create_record(
        &self,
        tag: &str,
        step_id: u64,
        timestamp: DateTime<Utc>,
        capacity: usize,
    ) -> Result<RecordHandle>;

    /// Write (or overwrite) one slot.
    ///
    /// # Errors
    /// Returns error if the handle or slot index does not exist
    fn write_slot(
        &self,
        handle: &RecordHandle,
        index: usize,
        payload: Vec<u8>,
        shape: Vec<u64>,
    ) -> Result<()>;

    /// Read one slot; `None` if the slot was reserved but never written.
    ///
    /// # Errors
    /// Returns error if the handle or slot index does not exist
    fn read_slot(&self, handle: &RecordHandle, index: usize) -> Result<Option<Slot>>;

    /// Id, timestamp and capacity of a record.
    ///
    /// # Errors
    /// Returns error if the handle does not exist
    fn record_meta(&self, handle: &RecordHandle) -> Result<RecordMeta>;

    /// Number of records in a series (0 for unknown tags).
    fn record_count(&self, tag: &str) -> usize;

    /// Handle of the record at `offset`, if any.
    fn record_at(&self, tag: &str, offset: usize) -> Option<RecordHandle> {
        (offset < self.record_count(tag)).then(|| RecordHandle::new(tag, offset))
    }

    /// Attach a caption to a series, creating the series if needed.
    ///
    /// # Errors
    /// Returns error if the backend rejects the write
    fn add_caption(&self, tag: &str, caption: &str) -> Result<()>;

    /// Captions of a series in insertion order (empty for unknown tags).
    fn captions(&self, tag: &str) -> Vec<String>;

    /// All series tags, sorted.
    fn tags(&self) -> Vec<String>;

    /// Flush every series to durable storage.
    ///
    /// # Errors
    /// Returns error if any series fails to persist; in-memory state is unchanged
    fn persist(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_memory_store_create_and_read() {
        let store = MemoryRecordStore::new();
        let handle = store.create_record("tag", 3, Utc::now(), 2).unwrap();

        assert_eq!(handle.offset(), 0);
        assert_eq!(store.record_count("tag"), 1);
        assert_eq!(store.record_meta(&handle).unwrap().id, 3);
        assert_eq!(store.record_meta(&handle).unwrap().capacity, 2);
        assert!(store.read_slot(&handle, 0).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_overwrite_slot() {
        let store = MemoryRecordStore::new();
        let handle = store.create_record("tag", 0, Utc::now(), 1).unwrap();

        store.write_slot(&handle, 0, vec![1, 2], vec![2]).unwrap();
        store.write_slot(&handle, 0, vec![7, 8, 9], vec![3]).unwrap();

        let slot = store.read_slot(&handle, 0).unwrap().unwrap();
        assert_eq!(slot.payload(), &[7, 8, 9]);
        assert_eq!(slot.shape(), &[3]);
    }

    #[test]
    fn test_memory_store_slot_out_of_range() {
        let store = MemoryRecordStore::new();
        let handle = store.create_record("tag", 0, Utc::now(), 1).unwrap();

        let err = store.write_slot(&handle, 1, vec![1], vec![1]).unwrap_err();
        assert!(matches!(err, Error::StorageError(_)));
        assert!(store.read_slot(&handle, 1).is_err());
    }

    #[test]
    fn test_memory_store_unknown_series() {
        let store = MemoryRecordStore::new();
        let handle = RecordHandle::new("missing", 0);

        assert!(matches!(
            store.read_slot(&handle, 0),
            Err(Error::UnknownSeries(_))
        ));
        assert_eq!(store.record_count("missing"), 0);
        assert!(store.record_at("missing", 0).is_none());
        assert!(store.captions("missing").is_empty());
    }

    #[test]
    fn test_memory_store_record_not_found() {
        let store = MemoryRecordStore::new();
        store.create_record("tag", 0, Utc::now(), 1).unwrap();

        let err = store.record_meta(&RecordHandle::new("tag", 5)).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { offset: 5, .. }));
    }

    #[test]
    fn test_memory_store_record_at() {
        let store = MemoryRecordStore::new();
        store.create_record("tag", 0, Utc::now(), 1).unwrap();
        store.create_record("tag", 1, Utc::now(), 1).unwrap();

        assert_eq!(store.record_at("tag", 1), Some(RecordHandle::new("tag", 1)));
        assert_eq!(store.record_at("tag", 2), None);
    }

    #[test]
    fn test_memory_store_captions_and_tags() {
        let store = MemoryRecordStore::new();
        store.add_caption("b", "first").unwrap();
        store.add_caption("b", "second").unwrap();
        store.create_record("a", 0, Utc::now(), 0).unwrap();

        assert_eq!(store.captions("b"), vec!["first", "second"]);
        assert_eq!(store.tags(), vec!["a", "b"]);
    }

    #[test]
    fn test_memory_store_persist_without_dir_is_noop() {
        let store = MemoryRecordStore::new();
        store.create_record("tag", 0, Utc::now(), 1).unwrap();
        assert!(store.persist().is_ok());
    }

    #[test]
    fn test_memory_store_concurrent_series() {
        use std::sync::Arc;

        let store = Arc::new(MemoryRecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let tag = format!("series{i}");
                    for step in 0..10 {
                        let handle = store.create_record(&tag, step, Utc::now(), 1).unwrap();
                        store.write_slot(&handle, 0, vec![1], vec![1]).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8 {
            assert_eq!(store.record_count(&format!("series{i}")), 10);
        }
    }
}
