//! Steering data: the compact permission structure describing which
//! devices are allowed to join the mesh.
//!
//! On the wire, steering data is either a single marker byte (0x00 =
//! permit none, 0xFF = permit all) or a fixed-length bloom filter of
//! 8 or 16 bytes. Any other length is a hard validation failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker length (permit-all / permit-none).
pub const STEERING_MARKER_LEN: usize = 1;

/// Short bloom filter length.
pub const STEERING_BLOOM_LEN_SHORT: usize = 8;

/// Long bloom filter length.
pub const STEERING_BLOOM_LEN_LONG: usize = 16;

/// Marker byte permitting no joiners.
pub const STEERING_PERMIT_NONE: u8 = 0x00;

/// Marker byte permitting all joiners.
pub const STEERING_PERMIT_ALL: u8 = 0xFF;

/// Steering data validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SteeringDataError {
    /// Wire length is not in the enumerated whitelist.
    #[error("invalid steering data length {len} (expected 1, 8, or 16)")]
    InvalidLength {
        /// The rejected length.
        len: usize,
    },

    /// Single-byte steering data must be one of the two markers.
    #[error("invalid steering marker byte {value:#04x} (expected 0x00 or 0xff)")]
    InvalidMarker {
        /// The rejected marker byte.
        value: u8,
    },
}

/// Steering data value.
///
/// Invariant: `bytes.len()` is 1, 8, or 16, and a 1-byte value is
/// exactly `0x00` or `0xFF`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteeringData {
    bytes: Vec<u8>,
}

impl SteeringData {
    /// Steering data permitting every joiner.
    #[must_use]
    pub fn permit_all() -> Self {
        Self {
            bytes: vec![STEERING_PERMIT_ALL],
        }
    }

    /// Steering data permitting no joiner.
    #[must_use]
    pub fn permit_none() -> Self {
        Self {
            bytes: vec![STEERING_PERMIT_NONE],
        }
    }

    /// Validate and adopt wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringDataError::InvalidLength`] for lengths outside
    /// the whitelist, and [`SteeringDataError::InvalidMarker`] for a
    /// 1-byte value that is neither marker.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SteeringDataError> {
        match bytes.len() {
            STEERING_MARKER_LEN => match bytes[0] {
                STEERING_PERMIT_NONE | STEERING_PERMIT_ALL => Ok(Self {
                    bytes: bytes.to_vec(),
                }),
                value => Err(SteeringDataError::InvalidMarker { value }),
            },
            STEERING_BLOOM_LEN_SHORT | STEERING_BLOOM_LEN_LONG => Ok(Self {
                bytes: bytes.to_vec(),
            }),
            len => Err(SteeringDataError::InvalidLength { len }),
        }
    }

    /// True if this is the universal permit-all marker.
    #[must_use]
    pub fn is_permit_all(&self) -> bool {
        self.bytes == [STEERING_PERMIT_ALL]
    }

    /// True if this is the permit-none marker.
    #[must_use]
    pub fn is_permit_none(&self) -> bool {
        self.bytes == [STEERING_PERMIT_NONE]
    }

    /// True if this is a bloom filter (8 or 16 bytes).
    #[must_use]
    pub fn is_bloom(&self) -> bool {
        self.bytes.len() > STEERING_MARKER_LEN
    }

    /// Wire length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a valid value has at least the marker byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Union permission set over a collection of steering data values.
    ///
    /// If any input is the permit-all marker, the result is permit-all.
    /// Otherwise the bloom filters are OR-merged, padded to the longest
    /// filter length present; inputs that are permit-none contribute
    /// nothing. With no bloom input the result is permit-none.
    pub fn merge<'a, I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut merged: Vec<u8> = Vec::new();
        for data in inputs {
            if data.is_permit_all() {
                return Self::permit_all();
            }
            if !data.is_bloom() {
                continue;
            }
            if data.bytes.len() > merged.len() {
                merged.resize(data.bytes.len(), 0);
            }
            for (acc, byte) in merged.iter_mut().zip(&data.bytes) {
                *acc |= byte;
            }
        }

        if merged.is_empty() {
            Self::permit_none()
        } else {
            Self { bytes: merged }
        }
    }
}

impl Default for SteeringData {
    fn default() -> Self {
        Self::permit_none()
    }
}
