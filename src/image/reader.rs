//! Image reader: decodes sampled slots back into tensors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec;
use crate::record::RecordHandle;
use crate::series::SeriesView;
use crate::storage::RecordStore;
use crate::tag::{ModeTagResolver, TagResolver};
use crate::{Error, Result};

/// One decoded image sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Payload bytes as unsigned octets (0..=255)
    pub data: Vec<u8>,
    /// Tensor shape; its product equals `data.len()`
    pub shape: Vec<u64>,
    /// Step the sample was taken in
    pub step_id: u64,
    /// Start time of that step
    pub timestamp: DateTime<Utc>,
}

/// Reads image samples from one series.
pub struct ImageReader<'a, S: RecordStore + ?Sized, T = ModeTagResolver> {
    series: SeriesView<'a, S>,
    mode: String,
    resolver: T,
}

impl<'a, S: RecordStore + ?Sized> ImageReader<'a, S> {
    /// Create a reader resolving captions for display mode `mode`.
    #[must_use]
    pub fn new(store: &'a S, tag: impl Into<String>, mode: impl Into<String>) -> Self {
        Self::with_resolver(store, tag, mode, ModeTagResolver)
    }
}

impl<'a, S: RecordStore + ?Sized, T: TagResolver> ImageReader<'a, S, T> {
    /// Create a reader with a custom caption resolver.
    #[must_use]
    pub fn with_resolver(
        store: &'a S,
        tag: impl Into<String>,
        mode: impl Into<String>,
        resolver: T,
    ) -> Self {
        Self {
            series: SeriesView::new(store, tag),
            mode: mode.into(),
            resolver,
        }
    }

    /// Series tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.series.tag()
    }

    /// Display mode.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Caption resolved for this reader's mode.
    ///
    /// # Errors
    /// Returns `NoCaption` if the series has no caption
    pub fn caption(&self) -> Result<String> {
        let caption = self.series.caption()?;
        Ok(self.resolver.resolve(&caption, &self.mode))
    }

    /// Number of records (sampled steps).
    #[must_use]
    pub fn size(&self) -> usize {
        self.series.size()
    }

    /// Step ids in storage order.
    ///
    /// # Errors
    /// Returns error if the store fails to resolve a record
    pub fn ids(&self) -> Result<Vec<u64>> {
        self.series.ids()
    }

    /// Step timestamps in storage order.
    ///
    /// # Errors
    /// Returns error if the store fails to resolve a record
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>> {
        self.series.timestamps()
    }

    /// Slots reserved by the record at `offset`.
    ///
    /// # Errors
    /// Returns `RecordNotFound` if `offset` is past the end of the series
    pub fn num_samples(&self, offset: usize) -> Result<usize> {
        let handle = self.handle(offset)?;
        Ok(self.series.store().record_meta(&handle)?.capacity)
    }

    /// Decode sample `index` of the record at `offset`.
    ///
    /// # Errors
    /// - `RecordNotFound` if `offset` is past the end of the series
    /// - `IndexOutOfRange` if `index` is not a reserved slot
    /// - `EmptySlot` if the slot was never written
    pub fn record(&self, offset: usize, index: usize) -> Result<ImageRecord> {
        let store = self.series.store();
        let handle = self.handle(offset)?;
        let meta = store.record_meta(&handle)?;

        if index >= meta.capacity {
            // The seen count is not recorded, so readers report 0
            return Err(Error::IndexOutOfRange {
                index,
                capacity: meta.capacity,
                seen: 0,
            });
        }

        let slot = store
            .read_slot(&handle, index)?
            .ok_or(Error::EmptySlot { offset, index })?;
        let (data, shape) = codec::unpack(slot);

        Ok(ImageRecord {
            data,
            shape,
            step_id: meta.id,
            timestamp: meta.timestamp,
        })
    }

    /// All written samples of the record at `offset`, in slot order.
    ///
    /// # Errors
    /// Returns `RecordNotFound` if `offset` is past the end of the series
    pub fn samples(&self, offset: usize) -> Result<Vec<ImageRecord>> {
        let capacity = self.num_samples(offset)?;
        let mut samples = Vec::with_capacity(capacity);
        for index in 0..capacity {
            match self.record(offset, index) {
                Ok(sample) => samples.push(sample),
                Err(Error::EmptySlot { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(samples)
    }

    fn handle(&self, offset: usize) -> Result<RecordHandle> {
        self.series
            .store()
            .record_at(self.series.tag(), offset)
            .ok_or_else(|| Error::RecordNotFound {
                tag: self.series.tag().to_string(),
                offset,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRecordStore;

    fn store_with_record() -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        store.add_caption("train/layer1%out", "train/layer1%out").unwrap();
        let handle = store
            .create_record("train/layer1%out", 4, Utc::now(), 3)
            .unwrap();
        store
            .write_slot(&handle, 1, vec![10, 20, 30, 40, 50, 60], vec![2, 3])
            .unwrap();
        store
    }

    #[test]
    fn test_record_decodes_slot() {
        let store = store_with_record();
        let reader = ImageReader::new(&store, "train/layer1%out", "train");

        let sample = reader.record(0, 1).unwrap();
        assert_eq!(sample.data, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(sample.shape, vec![2, 3]);
        assert_eq!(sample.step_id, 4);
    }

    #[test]
    fn test_record_empty_slot() {
        let store = store_with_record();
        let reader = ImageReader::new(&store, "train/layer1%out", "train");
        assert!(matches!(
            reader.record(0, 0),
            Err(Error::EmptySlot {
                offset: 0,
                index: 0
            })
        ));
    }

    #[test]
    fn test_record_out_of_range() {
        let store = store_with_record();
        let reader = ImageReader::new(&store, "train/layer1%out", "train");
        assert!(matches!(
            reader.record(0, 3),
            Err(Error::IndexOutOfRange {
                index: 3,
                capacity: 3,
                seen: 0
            })
        ));
        assert!(matches!(
            reader.record(1, 0),
            Err(Error::RecordNotFound { offset: 1, .. })
        ));
    }

    #[test]
    fn test_samples_skips_empty_slots() {
        let store = store_with_record();
        let reader = ImageReader::new(&store, "train/layer1%out", "train");
        assert_eq!(reader.num_samples(0).unwrap(), 3);
        assert_eq!(reader.samples(0).unwrap().len(), 1);
    }

    #[test]
    fn test_caption_resolution() {
        let store = store_with_record();
        let train = ImageReader::new(&store, "train/layer1%out", "train");
        assert_eq!(train.caption().unwrap(), "layer1/out");

        let test = ImageReader::new(&store, "train/layer1%out", "test");
        assert_eq!(test.caption().unwrap(), "train/layer1/out");
    }

    #[test]
    fn test_caption_missing() {
        let store = MemoryRecordStore::new();
        store.create_record("train/x", 0, Utc::now(), 1).unwrap();
        let reader = ImageReader::new(&store, "train/x", "train");
        assert!(matches!(reader.caption(), Err(Error::NoCaption { .. })));
    }
}
