//! Error types for trueno-vislog
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Precondition failures (`ShapeMismatch`, `SizeNotPositive`, `IndexOutOfRange`,
//! `NoCaption`) are raised before any record is touched, so a failed call never
//! leaves a partially written slot behind.

use thiserror::Error;

use crate::image::ElementType;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-vislog error types
#[derive(Error, Debug)]
pub enum Error {
    /// Payload length does not match the product of the declared shape
    #[error("Shape mismatch: shape product is {expected} but payload has {actual} elements")]
    ShapeMismatch {
        /// Product of the declared shape (saturated on overflow)
        expected: u64,
        /// Number of payload elements supplied
        actual: usize,
    },

    /// Degenerate shape (empty, or containing a zero dimension)
    #[error("Shape {shape:?} has no elements\nEvery dimension must be positive")]
    SizeNotPositive {
        /// The rejected shape
        shape: Vec<u64>,
    },

    /// Slot index outside the reserved range or ahead of the samples seen
    #[error("Slot index {index} out of range (capacity {capacity}, samples seen {seen})")]
    IndexOutOfRange {
        /// Requested slot index
        index: usize,
        /// Slots reserved for the step
        capacity: usize,
        /// Samples offered so far in the step (0 when raised by a reader)
        seen: usize,
    },

    /// Series has no caption
    #[error("Series '{tag}' has no caption")]
    NoCaption {
        /// Series tag
        tag: String,
    },

    /// Storage error (record store, Parquet persistence)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Sample written while no sampled step is open
    #[error("No sampled step is open\nCall start_step() on a step the sampling policy selects")]
    NoOpenStep,

    /// Step ids must strictly increase
    #[error("Step {requested} does not follow step {last}\nStep ids must strictly increase")]
    StepOrder {
        /// Most recently started step
        last: u64,
        /// Rejected step id
        requested: u64,
    },

    /// Slot was reserved but never written
    #[error("Slot {index} of record {offset} was never written")]
    EmptySlot {
        /// Record offset within the series
        offset: usize,
        /// Slot index within the record
        index: usize,
    },

    /// Record offset past the end of the series
    #[error("Series '{tag}' has no record at offset {offset}")]
    RecordNotFound {
        /// Series tag
        tag: String,
        /// Requested offset
        offset: usize,
    },

    /// Series tag not present in the store
    #[error("Unknown series: {0}")]
    UnknownSeries(String),

    /// Sample element type differs from the writer configuration
    #[error("Element type mismatch: writer configured for {configured:?}, sample is {given:?}")]
    ElementTypeMismatch {
        /// Configured payload element type
        configured: ElementType,
        /// Element type of the offered data
        given: ElementType,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON error (config and caption metadata)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
