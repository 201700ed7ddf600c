//! Scalar Record - one time-series data point

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ScalarValue;

/// Scalar Record represents a single scalar data point.
///
/// ## Storage Layout
///
/// Stored as a one-slot record:
/// - `id` as the record id (training step, iteration, ...)
/// - `timestamp` as the record timestamp
/// - `value` as little-endian bytes in slot 0, shape `[width]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScalarRecord<T> {
    id: u64,
    timestamp: DateTime<Utc>,
    value: T,
}

impl<T: ScalarValue> ScalarRecord<T> {
    /// Create a new scalar record stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `id` - Step or iteration number
    /// * `value` - Scalar value
    #[must_use]
    pub fn new(id: u64, value: T) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            value,
        }
    }

    /// Create a builder for constructing a scalar record with optional fields.
    #[must_use]
    pub fn builder(id: u64, value: T) -> ScalarRecordBuilder<T> {
        ScalarRecordBuilder::new(id, value)
    }

    /// Get the id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Get the timestamp when the value was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the value.
    #[must_use]
    pub const fn value(&self) -> T {
        self.value
    }
}

/// Builder for `ScalarRecord`.
#[derive(Debug)]
pub struct ScalarRecordBuilder<T> {
    id: u64,
    timestamp: DateTime<Utc>,
    value: T,
}

impl<T: ScalarValue> ScalarRecordBuilder<T> {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: u64, value: T) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            value,
        }
    }

    /// Set a custom timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the `ScalarRecord`.
    #[must_use]
    pub fn build(self) -> ScalarRecord<T> {
        ScalarRecord {
            id: self.id,
            timestamp: self.timestamp,
            value: self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_record_new() {
        let record = ScalarRecord::new(3, 0.5f64);
        assert_eq!(record.id(), 3);
        assert!((record.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scalar_record_builder_timestamp() {
        let at = DateTime::from_timestamp(100, 0).unwrap();
        let record = ScalarRecord::builder(1, 7i32).timestamp(at).build();
        assert_eq!(record.timestamp(), at);
        assert_eq!(record.value(), 7);
    }
}
