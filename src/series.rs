//! Read-only view over one series of a record store.
//!
//! Shared by [`crate::scalar::ScalarReader`] and [`crate::image::ImageReader`]:
//! ids, timestamps and captions are projected the same way for both.

use chrono::{DateTime, Utc};

use crate::record::RecordMeta;
use crate::storage::RecordStore;
use crate::{Error, Result};

/// Borrowed view of the series `tag` in `store`.
#[derive(Debug)]
pub struct SeriesView<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    tag: String,
}

impl<'a, S: RecordStore + ?Sized> SeriesView<'a, S> {
    /// Create a view; unknown tags read as an empty series.
    #[must_use]
    pub fn new(store: &'a S, tag: impl Into<String>) -> Self {
        Self {
            store,
            tag: tag.into(),
        }
    }

    /// Series tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &'a S {
        self.store
    }

    /// Number of records.
    #[must_use]
    pub fn size(&self) -> usize {
        self.store.record_count(&self.tag)
    }

    /// Record headers in storage order.
    ///
    /// # Errors
    /// Returns error if the store fails to resolve a record
    pub fn metas(&self) -> Result<Vec<RecordMeta>> {
        (0..self.size())
            .map(|offset| {
                let handle =
                    self.store
                        .record_at(&self.tag, offset)
                        .ok_or_else(|| Error::RecordNotFound {
                            tag: self.tag.clone(),
                            offset,
                        })?;
                self.store.record_meta(&handle)
            })
            .collect()
    }

    /// Record ids in storage order.
    ///
    /// # Errors
    /// Returns error if the store fails to resolve a record
    pub fn ids(&self) -> Result<Vec<u64>> {
        Ok(self.metas()?.into_iter().map(|m| m.id).collect())
    }

    /// Record timestamps in storage order.
    ///
    /// # Errors
    /// Returns error if the store fails to resolve a record
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>> {
        Ok(self.metas()?.into_iter().map(|m| m.timestamp).collect())
    }

    /// The series caption, unresolved.
    ///
    /// A series is expected to carry exactly one caption; extra captions are
    /// logged and the first one wins.
    ///
    /// # Errors
    /// Returns `NoCaption` if the series has no caption
    pub fn caption(&self) -> Result<String> {
        let mut captions = self.store.captions(&self.tag).into_iter();
        let first = captions.next().ok_or_else(|| Error::NoCaption {
            tag: self.tag.clone(),
        })?;
        let extra = captions.count();
        if extra > 0 {
            tracing::warn!(
                tag = %self.tag,
                captions = extra + 1,
                "series has more than one caption, using the first"
            );
        }
        Ok(first)
    }
}
