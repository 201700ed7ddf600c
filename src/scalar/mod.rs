//! Scalar time-series logging
//!
//! Each scalar is one record in its series, so ids and timestamps come from
//! the record header and the value from slot 0.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use trueno_vislog::scalar::{ScalarReader, ScalarWriter};
//! use trueno_vislog::storage::MemoryRecordStore;
//!
//! # fn main() -> trueno_vislog::Result<()> {
//! let store = Arc::new(MemoryRecordStore::new());
//! let writer = ScalarWriter::<f32, _>::new(Arc::clone(&store), "train/loss");
//! for step in 0..3 {
//!     writer.add_record(step, 1.0 / (step as f32 + 1.0))?;
//! }
//!
//! let reader = ScalarReader::<f32, _>::new(store.as_ref(), "train/loss");
//! assert_eq!(reader.ids()?, vec![0, 1, 2]);
//! assert_eq!(reader.records()?[0], 1.0);
//! # Ok(())
//! # }
//! ```

mod reader;
mod record;
mod writer;

pub use reader::ScalarReader;
pub use record::{ScalarRecord, ScalarRecordBuilder};
pub use writer::ScalarWriter;

/// Numeric types storable as scalar records.
pub trait ScalarValue: Copy + Send + Sync + 'static {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Little-endian encoding.
    fn to_le_vec(self) -> Vec<u8>;

    /// Decode from exactly [`Self::WIDTH`] little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_scalar_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ScalarValue for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn to_le_vec(self) -> Vec<u8> {
                    self.to_le_bytes().to_vec()
                }

                fn from_le_slice(bytes: &[u8]) -> Option<Self> {
                    bytes.try_into().ok().map(<$ty>::from_le_bytes)
                }
            }
        )*
    };
}

impl_scalar_value!(i32, i64, f32, f64);
