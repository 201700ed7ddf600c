//! Typed scalar accessor.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use super::ScalarValue;
use crate::series::SeriesView;
use crate::storage::RecordStore;
use crate::{Error, Result};

/// Read-only projection of a scalar series onto values of type `T`.
pub struct ScalarReader<'a, T, S: RecordStore + ?Sized> {
    series: SeriesView<'a, S>,
    _value: PhantomData<T>,
}

impl<'a, T: ScalarValue, S: RecordStore + ?Sized> ScalarReader<'a, T, S> {
    /// Create a reader over the series `tag`.
    #[must_use]
    pub fn new(store: &'a S, tag: impl Into<String>) -> Self {
        Self {
            series: SeriesView::new(store, tag),
            _value: PhantomData,
        }
    }

    /// Series tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.series.tag()
    }

    /// Values in storage order.
    ///
    /// # Errors
    /// - `EmptySlot` if a record holds no value
    /// - `ShapeMismatch` if a stored value is not `T::WIDTH` bytes wide
    pub fn records(&self) -> Result<Vec<T>> {
        let store = self.series.store();
        (0..self.size())
            .map(|offset| {
                let handle = store.record_at(self.tag(), offset).ok_or_else(|| {
                    Error::RecordNotFound {
                        tag: self.tag().to_string(),
                        offset,
                    }
                })?;
                let slot = store
                    .read_slot(&handle, 0)?
                    .ok_or(Error::EmptySlot { offset, index: 0 })?;
                T::from_le_slice(slot.payload()).ok_or(Error::ShapeMismatch {
                    expected: T::WIDTH as u64,
                    actual: slot.payload().len(),
                })
            })
            .collect()
    }

    /// Record ids in storage order.
    ///
    /// # Errors
    /// Returns error if the store fails to resolve a record
    pub fn ids(&self) -> Result<Vec<u64>> {
        self.series.ids()
    }

    /// Record timestamps in storage order.
    ///
    /// # Errors
    /// Returns error if the store fails to resolve a record
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>> {
        self.series.timestamps()
    }

    /// The series caption.
    ///
    /// # Errors
    /// Returns `NoCaption` if the series has no caption
    pub fn caption(&self) -> Result<String> {
        self.series.caption()
    }

    /// Number of records.
    #[must_use]
    pub fn size(&self) -> usize {
        self.series.size()
    }
}
