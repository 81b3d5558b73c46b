//! Error types for clustering and interval scans.

use thiserror::Error;

use crate::core::series::SeriesId;

/// Errors raised by the clustering core.
///
/// Most variants are fatal input errors that abort the enclosing call.
/// [`PulseError::DegenerateVariance`] and [`PulseError::NonFiniteDistance`] are
/// metric faults: callers evaluating pairs inside a larger computation
/// substitute the metric's fallback distance and keep going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PulseError {
    /// `build_clusters` was called with no ids.
    #[error("empty id set")]
    EmptyIdSet,

    /// A sequence that must hold at least one value was empty.
    #[error("empty sequence")]
    EmptySequence,

    /// Two sequences that must be comparable have incompatible lengths.
    #[error("length mismatch: expected {expected}, actual {actual}")]
    LengthMismatch {
        /// Length of the reference sequence
        expected: usize,
        /// Length of the offending sequence
        actual: usize,
    },

    /// An id was referenced that the series set does not contain.
    #[error("unknown series id: {0}")]
    UnknownSeries(SeriesId),

    /// The same id appeared twice where a set of ids was expected.
    #[error("duplicate series id: {0}")]
    DuplicateSeries(SeriesId),

    /// A value in an input sequence was NaN or infinite.
    #[error("non-finite input value at index {index}")]
    NonFiniteInput {
        /// Position of the first non-finite value
        index: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what's wrong with the parameter
        message: String,
    },

    /// Correlation is undefined because a sequence is (nearly) constant.
    #[error("degenerate variance: sample variance {variance:e} below epsilon")]
    DegenerateVariance {
        /// The smaller of the two sample variances
        variance: f64,
    },

    /// The metric produced NaN or an infinity.
    #[error("non-finite distance")]
    NonFiniteDistance,
}

impl PulseError {
    /// Create a LengthMismatch error.
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Whether this error is a metric fault that pair evaluation may absorb.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateVariance { .. } | Self::NonFiniteDistance
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PulseError>;
