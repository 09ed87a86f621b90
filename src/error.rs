//! Error type shared by the numeric pipeline and the I/O glue around it.

use thiserror::Error;

/// Errors returned by zkphash.
#[derive(Debug, Error)]
pub enum PhashError {
    /// A size argument was zero, or two matrices disagree on their shape.
    #[error("invalid dimension: {reason}")]
    InvalidDimension {
        /// What was wrong with the shape.
        reason: String,
    },
    /// A sequence did not have the length the operation requires.
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidInputLength {
        /// Required length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// The fixed-point scale is zero or too large for the coefficient type.
    #[error("invalid scale: {reason}")]
    InvalidScale {
        /// What was wrong with the scale.
        reason: String,
    },
    /// Configuration values failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// The offending field and constraint.
        reason: String,
    },
    /// A hash cell held something other than 0 or 1.
    #[error("hash cell holds {0}, expected 0 or 1")]
    InvalidBit(u8),
    /// A hex-encoded hash could not be decoded.
    #[error("invalid hash encoding: {reason}")]
    InvalidHex {
        /// What was wrong with the encoding.
        reason: String,
    },
    /// An image could not be decoded or resampled.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// Filesystem access failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A witness file could not be encoded or decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Poseidon hashing rejected its inputs.
    #[cfg(feature = "commit")]
    #[error("poseidon hashing failed: {0}")]
    Poseidon(#[from] light_poseidon::PoseidonError),
}

impl PhashError {
    pub(crate) fn dimension(reason: impl Into<String>) -> Self {
        PhashError::InvalidDimension {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PhashError>;
