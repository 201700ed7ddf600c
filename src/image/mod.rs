//! Image tensor logging
//!
//! ## Write path
//!
//! ```text
//! start_step(id) ─> offer() ─┬─ Keep(slot) ─> set_sample(slot, shape, data)
//!                            └─ Discard
//!                ─> finish_step() ─> persist() when the next step is sampled
//! ```
//!
//! ## Read path
//!
//! `ImageReader::record(offset, index)` returns the payload as unsigned
//! octets together with its shape, step id and timestamp.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use trueno_vislog::image::{ImageConfig, ImageReader, ImageWriter};
//! use trueno_vislog::storage::MemoryRecordStore;
//!
//! # fn main() -> trueno_vislog::Result<()> {
//! let store = Arc::new(MemoryRecordStore::new());
//! let config = ImageConfig { num_samples: 2, seed: Some(7), ..ImageConfig::default() };
//! let mut writer = ImageWriter::new(Arc::clone(&store), "train/input", &config)?;
//!
//! writer.start_step(0)?;
//! for pixel in 0u8..5 {
//!     if let Some(slot) = writer.offer().slot() {
//!         writer.set_sample(slot, &[2, 2], &[pixel; 4])?;
//!     }
//! }
//! writer.finish_step()?;
//!
//! let reader = ImageReader::new(store.as_ref(), "train/input", "train");
//! assert_eq!(reader.record(0, 0)?.shape, vec![2, 2]);
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod reader;
mod writer;

pub use reader::{ImageReader, ImageRecord};
pub use writer::{ImageWriter, StepPhase};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Element type of stored image payloads. Both are one byte per element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Unsigned octets (pixel intensities)
    #[default]
    U8,
    /// Signed octets; read back as their unsigned bit pattern
    I8,
}

/// Element types accepted as image payload.
pub trait PayloadElement: Copy {
    /// Matching configuration value.
    const ELEMENT_TYPE: ElementType;

    /// Raw byte of this element.
    fn to_octet(self) -> u8;
}

impl PayloadElement for u8 {
    const ELEMENT_TYPE: ElementType = ElementType::U8;

    fn to_octet(self) -> u8 {
        self
    }
}

impl PayloadElement for i8 {
    const ELEMENT_TYPE: ElementType = ElementType::I8;

    fn to_octet(self) -> u8 {
        u8::from_ne_bytes(self.to_ne_bytes())
    }
}

/// Image writer configuration.
///
/// Deserializable so it can live in a run's JSON config:
///
/// ```rust
/// use trueno_vislog::image::{ElementType, ImageConfig};
///
/// let config: ImageConfig =
///     serde_json::from_str(r#"{ "num_samples": 4, "element_type": "i8" }"#).unwrap();
/// assert_eq!(config.num_samples, 4);
/// assert_eq!(config.sample_period, 1);
/// assert_eq!(config.element_type, ElementType::I8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Slots reserved per sampled step (0 disables image capture)
    pub num_samples: usize,
    /// Sample steps whose id is a multiple of this period
    pub sample_period: u64,
    /// Payload element type accepted by `set_sample`
    pub element_type: ElementType,
    /// Seed for the sampling generator; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            num_samples: 10,
            sample_period: 1,
            element_type: ElementType::U8,
            seed: None,
        }
    }
}

impl ImageConfig {
    /// Check configuration values.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `sample_period` is 0
    pub fn validate(&self) -> Result<()> {
        if self.sample_period == 0 {
            return Err(Error::InvalidConfig(
                "sample_period must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
