//! Scalar writer: appends one record per value.

use std::marker::PhantomData;
use std::sync::Arc;

use super::{ScalarRecord, ScalarValue};
use crate::storage::RecordStore;
use crate::Result;

/// Appends scalar values of type `T` to one series.
#[derive(Debug)]
pub struct ScalarWriter<T, S: RecordStore> {
    store: Arc<S>,
    tag: String,
    _value: PhantomData<T>,
}

impl<T: ScalarValue, S: RecordStore> ScalarWriter<T, S> {
    /// Create a writer for the series `tag`.
    pub fn new(store: Arc<S>, tag: impl Into<String>) -> Self {
        Self {
            store,
            tag: tag.into(),
            _value: PhantomData,
        }
    }

    /// Series tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Append `value` for `id`, stamped with the current time.
    ///
    /// # Errors
    /// Returns error if the store rejects the record
    pub fn add_record(&self, id: u64, value: T) -> Result<()> {
        self.add(&ScalarRecord::new(id, value))
    }

    /// Append a prepared record.
    ///
    /// # Errors
    /// Returns error if the store rejects the record
    pub fn add(&self, record: &ScalarRecord<T>) -> Result<()> {
        let handle = self
            .store
            .create_record(&self.tag, record.id(), record.timestamp(), 1)?;
        self.store
            .write_slot(&handle, 0, record.value().to_le_vec(), vec![T::WIDTH as u64])
    }
}
