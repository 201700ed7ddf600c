//! Record model shared by the writers, readers and stores.
//!
//! ```text
//! Series (tag, captions) ──< Record (step id, timestamp) ──< Slot (payload, shape)
//! ```
//!
//! A slot keeps its payload bytes and its shape as two parallel fields
//! addressed by the same index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One written slot: raw payload bytes plus the tensor shape they describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    payload: Vec<u8>,
    shape: Vec<u64>,
}

impl Slot {
    /// Create a slot from payload bytes and shape.
    ///
    /// No validation happens here; [`crate::image::codec::pack`] is the
    /// checked constructor for tensor payloads.
    #[must_use]
    pub const fn new(payload: Vec<u8>, shape: Vec<u64>) -> Self {
        Self { payload, shape }
    }

    /// Payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Shape dimensions.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Split into `(payload, shape)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Vec<u64>) {
        (self.payload, self.shape)
    }
}

/// A record: one step's id and timestamp plus its reserved slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: u64,
    timestamp: DateTime<Utc>,
    slots: Vec<Option<Slot>>,
}

impl Record {
    /// Create a record with `capacity` empty slots.
    #[must_use]
    pub fn new(id: u64, timestamp: DateTime<Utc>, capacity: usize) -> Self {
        Self {
            id,
            timestamp,
            slots: vec![None; capacity],
        }
    }

    /// Step (or scalar) id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Wall-clock time the record was created.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Number of reserved slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot contents, `None` when out of range or never written.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Number of slots holding data.
    #[must_use]
    pub fn written_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Id, timestamp and capacity.
    #[must_use]
    pub fn meta(&self) -> RecordMeta {
        RecordMeta {
            id: self.id,
            timestamp: self.timestamp,
            capacity: self.capacity(),
        }
    }

    /// Replace the contents of `index`. Returns `false` when out of range.
    pub(crate) fn set_slot(&mut self, index: usize, slot: Slot) -> bool {
        match self.slots.get_mut(index) {
            Some(entry) => {
                *entry = Some(slot);
                true
            }
            None => false,
        }
    }
}

/// Record header without slot contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Step (or scalar) id
    pub id: u64,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Reserved slots
    pub capacity: usize,
}

/// Address of a record inside a store: series tag plus append offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle {
    tag: String,
    offset: usize,
}

impl RecordHandle {
    /// Create a handle.
    #[must_use]
    pub fn new(tag: impl Into<String>, offset: usize) -> Self {
        Self {
            tag: tag.into(),
            offset,
        }
    }

    /// Series tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Offset of the record within its series.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

/// An append-only series of records sharing a tag and caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    tag: String,
    captions: Vec<String>,
    records: Vec<Record>,
}

impl Series {
    /// Create an empty series.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            captions: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Series tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Captions in the order they were added.
    #[must_use]
    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    /// Records in append order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn add_caption(&mut self, caption: impl Into<String>) {
        self.captions.push(caption.into());
    }

    /// Append a record and return its offset.
    pub(crate) fn push(&mut self, record: Record) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub(crate) fn record_mut(&mut self, offset: usize) -> Option<&mut Record> {
        self.records.get_mut(offset)
    }
}
