//! # trueno-vislog: Sampled Training Logs
//!
//! **Version**: 0.1.0
//!
//! trueno-vislog records scalar metrics and image tensors emitted by a
//! long-running training process so they can be visualized later. Images
//! arrive far faster than they can be stored, so each sampled step keeps a
//! uniform random subset of fixed size (reservoir sampling) and writes it
//! into an append-only record store that knows nothing about tensors.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Muda elimination**: A fixed per-step budget; discarded samples are never copied
//! - **Poka-Yoke safety**: Shapes and slot indices are checked before any write
//! - **Genchi Genbutsu**: Every sample seen in a step has equal odds of being kept
//! - **Jidoka**: Statistical tests verify the retention distribution
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_vislog::image::ImageConfig;
//! use trueno_vislog::LogWriter;
//!
//! # fn main() -> trueno_vislog::Result<()> {
//! let writer = LogWriter::builder().mode("train").build()?;
//! let loss = writer.new_scalar::<f32>("loss")?;
//! let mut images = writer.new_image("input", &ImageConfig { num_samples: 4, ..Default::default() })?;
//!
//! for step in 0..10 {
//!     loss.add_record(step, 1.0 / (step as f32 + 1.0))?;
//!
//!     images.start_step(step)?;
//!     for _ in 0..32 {
//!         if let Some(slot) = images.offer().slot() {
//!             images.set_sample(slot, &[2, 2], &[0u8, 64, 128, 255])?;
//!         }
//!     }
//!     images.finish_step()?;
//! }
//!
//! let reader = writer.reader();
//! assert_eq!(reader.scalar::<f32>("loss").size(), 10);
//! assert_eq!(reader.image("input").caption()?, "input");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod image;
pub mod record;
pub mod sampling;
pub mod scalar;
pub mod series;
pub mod storage;
pub mod tag;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageConfig, ImageReader, ImageWriter};
use scalar::{ScalarReader, ScalarValue, ScalarWriter};
use storage::{MemoryRecordStore, RecordStore};
use tag::TagResolver;

/// Default display mode.
pub const DEFAULT_MODE: &str = "train";

/// Mode-scoped entry point for writing scalar and image series.
///
/// Series created through a `LogWriter` are tagged `"{mode}/{name}"` and carry
/// that tag as their caption.
#[derive(Debug)]
pub struct LogWriter<S: RecordStore = MemoryRecordStore> {
    store: Arc<S>,
    mode: String,
}

impl LogWriter {
    /// Create a log writer builder
    #[must_use]
    pub fn builder() -> LogWriterBuilder {
        LogWriterBuilder::default()
    }
}

impl<S: RecordStore> LogWriter<S> {
    /// Create a writer over an existing store.
    pub fn with_store(store: Arc<S>, mode: impl Into<String>) -> Self {
        Self {
            store,
            mode: mode.into(),
        }
    }

    /// Display mode series are tagged with.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Shared store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Same writer logging under another mode, sharing the store.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the mode is empty or contains `/` or `%`
    pub fn as_mode(&self, mode: impl Into<String>) -> Result<Self> {
        let mode = mode.into();
        tag::validate_mode(&mode)?;
        Ok(Self::with_store(Arc::clone(&self.store), mode))
    }

    fn register(&self, name: &str) -> Result<String> {
        let tag = tag::series_tag(&self.mode, name);
        if self.store.captions(&tag).is_empty() {
            self.store.add_caption(&tag, &tag)?;
        }
        Ok(tag)
    }

    /// Create a scalar series writer for `name`.
    ///
    /// # Errors
    /// Returns error if the store rejects the caption
    pub fn new_scalar<T: ScalarValue>(&self, name: &str) -> Result<ScalarWriter<T, S>> {
        let tag = self.register(name)?;
        Ok(ScalarWriter::new(Arc::clone(&self.store), tag))
    }

    /// Create an image series writer for `name`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for an invalid configuration, or an error if the
    /// store rejects the caption
    pub fn new_image(&self, name: &str, config: &ImageConfig) -> Result<ImageWriter<S>> {
        config.validate()?;
        let tag = self.register(name)?;
        ImageWriter::new(Arc::clone(&self.store), tag, config)
    }

    /// Persist every series now.
    ///
    /// # Errors
    /// Returns error if the store fails to persist
    pub fn persist(&self) -> Result<()> {
        self.store.persist()
    }

    /// Reader over the same store and mode.
    #[must_use]
    pub fn reader(&self) -> LogReader<S> {
        LogReader::with_store(Arc::clone(&self.store), self.mode.clone())
    }
}

/// Log writer builder
#[derive(Debug, Default)]
pub struct LogWriterBuilder {
    mode: Option<String>,
    persist_dir: Option<PathBuf>,
}

impl LogWriterBuilder {
    /// Set the display mode (default `"train"`)
    #[must_use]
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Persist series as Parquet files under `dir`
    #[must_use]
    pub fn persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persist_dir = Some(dir.into());
        self
    }

    /// Build the log writer
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the mode is empty or contains `/` or `%`
    pub fn build(self) -> Result<LogWriter> {
        let mode = self.mode.unwrap_or_else(|| DEFAULT_MODE.to_string());
        tag::validate_mode(&mode)?;

        let store = match self.persist_dir {
            Some(dir) => MemoryRecordStore::with_persist_dir(dir),
            None => MemoryRecordStore::new(),
        };
        Ok(LogWriter::with_store(Arc::new(store), mode))
    }
}

/// Mode-scoped entry point for reading series back.
#[derive(Debug)]
pub struct LogReader<S: RecordStore = MemoryRecordStore> {
    store: Arc<S>,
    mode: String,
}

impl LogReader {
    /// Open the series persisted under `dir`.
    ///
    /// # Errors
    /// Returns error if the directory or a series file cannot be read
    pub fn open(dir: impl AsRef<Path>, mode: impl Into<String>) -> Result<Self> {
        let store = MemoryRecordStore::load_dir(dir)?;
        Ok(Self::with_store(Arc::new(store), mode))
    }
}

impl<S: RecordStore> LogReader<S> {
    /// Create a reader over an existing store.
    pub fn with_store(store: Arc<S>, mode: impl Into<String>) -> Self {
        Self {
            store,
            mode: mode.into(),
        }
    }

    /// Display mode.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Display names of the series logged under this mode, sorted by tag.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let resolver = tag::ModeTagResolver;
        self.store
            .tags()
            .into_iter()
            .filter(|t| resolver.tag_matches_mode(t, &self.mode))
            .map(|t| resolver.readable_tag(&self.mode, &t))
            .collect()
    }

    /// Scalar reader for the series logged as `name`.
    #[must_use]
    pub fn scalar<T: ScalarValue>(&self, name: &str) -> ScalarReader<'_, T, S> {
        ScalarReader::new(self.store.as_ref(), tag::series_tag(&self.mode, name))
    }

    /// Image reader for the series logged as `name`.
    #[must_use]
    pub fn image(&self, name: &str) -> ImageReader<'_, S> {
        ImageReader::new(
            self.store.as_ref(),
            tag::series_tag(&self.mode, name),
            self.mode.clone(),
        )
    }
}
