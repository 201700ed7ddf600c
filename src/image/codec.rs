//! Tensor packing and unpacking.
//!
//! A tensor is stored as a [`Slot`]: the elements' raw bytes in `payload` and
//! the dimensions in `shape`. Unpacking always yields unsigned octets, so an
//! `i8` payload reads back as its two's-complement bit pattern.

use crate::record::Slot;
use crate::{Error, Result};

use super::PayloadElement;

/// Number of elements described by `shape`, `None` on overflow.
#[must_use]
pub fn shape_product(shape: &[u64]) -> Option<u64> {
    shape.iter().try_fold(1u64, |acc, &dim| acc.checked_mul(dim))
}

/// Check that `shape` describes exactly `len` elements.
///
/// # Errors
/// - `SizeNotPositive` if the shape is empty or has a zero dimension
/// - `ShapeMismatch` if the product differs from `len` (or overflows)
pub fn validate_shape(shape: &[u64], len: usize) -> Result<()> {
    if shape.is_empty() || shape.contains(&0) {
        return Err(Error::SizeNotPositive {
            shape: shape.to_vec(),
        });
    }
    let matches = shape_product(shape)
        .zip(u64::try_from(len).ok())
        .is_some_and(|(product, len)| product == len);
    if !matches {
        return Err(Error::ShapeMismatch {
            expected: shape_product(shape).unwrap_or(u64::MAX),
            actual: len,
        });
    }
    Ok(())
}

/// Pack a tensor into a slot.
///
/// # Errors
/// See [`validate_shape`]
pub fn pack<E: PayloadElement>(shape: &[u64], data: &[E]) -> Result<Slot> {
    validate_shape(shape, data.len())?;
    let payload = data.iter().map(|e| e.to_octet()).collect();
    Ok(Slot::new(payload, shape.to_vec()))
}

/// Unpack a slot into `(data, shape)`.
#[must_use]
pub fn unpack(slot: Slot) -> (Vec<u8>, Vec<u64>) {
    slot.into_parts()
}
