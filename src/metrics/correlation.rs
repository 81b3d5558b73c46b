use crate::core::config::{ClusterConfig, MetricKind};
use crate::core::distance_metric::{ensure_finite, DistanceMetric};
use crate::core::error::{PulseError, Result};

/// Distance substituted for pairs whose correlation is undefined.
pub const CORRELATION_FALLBACK: f64 = 2.0;

/// Sample variance below which a sequence counts as constant.
pub const VARIANCE_EPSILON: f64 = 1e-12;

/// Pearson correlation distance.
///
/// Distance formula: `d = 1 - r` where `r = S_ab / sqrt(S_aa * S_bb)` and
/// `S_xy = sum((x_i - mean_x) * (y_i - mean_y))`.
///
/// Edge cases:
/// - Either sequence has sample variance below [`VARIANCE_EPSILON`] (or fewer
///   than two points) → `DegenerateVariance`; evaluation falls back to
///   [`CORRELATION_FALLBACK`]
/// - Any non-finite value → `NonFiniteDistance`
/// - Different lengths → `LengthMismatch` (fatal)
/// - `r` is clamped to [-1, 1] for numerical stability, so `d` lies in [0, 2]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PearsonCorrelation;

impl PearsonCorrelation {
    /// Pearson correlation of two equal-length sequences.
    pub fn correlation(a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(PulseError::length_mismatch(a.len(), b.len()));
        }
        ensure_finite(a)?;
        ensure_finite(b)?;

        let n = a.len();
        if n < 2 {
            return Err(PulseError::DegenerateVariance { variance: 0.0 });
        }

        let n_f = n as f64;
        let mean_a = a.iter().sum::<f64>() / n_f;
        let mean_b = b.iter().sum::<f64>() / n_f;

        let (mut s_ab, mut s_aa, mut s_bb) = (0.0, 0.0, 0.0);
        for (x, y) in a.iter().zip(b) {
            let da = x - mean_a;
            let db = y - mean_b;
            s_ab += da * db;
            s_aa += da * da;
            s_bb += db * db;
        }

        let variance = (s_aa.min(s_bb)) / (n_f - 1.0);
        if variance < VARIANCE_EPSILON {
            return Err(PulseError::DegenerateVariance { variance });
        }

        // sqrt(x*x) rounds back to x, so r is exactly 1 for a == b
        let r = s_ab / (s_aa * s_bb).sqrt();
        if !r.is_finite() {
            return Err(PulseError::NonFiniteDistance);
        }
        Ok(r.clamp(-1.0, 1.0))
    }
}

impl DistanceMetric for PearsonCorrelation {
    fn name(&self) -> &'static str {
        "correlation"
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        let r = Self::correlation(a, b)?;
        Ok((1.0 - r).max(0.0))
    }

    fn fallback_distance(&self) -> f64 {
        CORRELATION_FALLBACK
    }

    fn agrees_with(&self, config: &ClusterConfig) -> bool {
        config.metric == MetricKind::Correlation
    }
}
