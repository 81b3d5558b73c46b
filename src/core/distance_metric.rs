use serde::{Deserialize, Serialize};

use crate::core::config::ClusterConfig;
use crate::core::error::{PulseError, Result};
use crate::core::series::SeriesId;

/// Trait for pairwise dissimilarity between two numeric sequences.
///
/// Algorithms are generic over `M: DistanceMetric` so the inner pair loop is
/// monomorphized per metric. Implementations must be symmetric, non-negative,
/// and zero for identical non-degenerate input.
///
/// `distance` reports metric faults (near-constant input, non-finite values)
/// as recoverable [`PulseError`]s. Callers that must not abort on a single bad
/// pair go through [`DistanceMetric::evaluate`], which swaps the fault for
/// [`DistanceMetric::fallback_distance`].
pub trait DistanceMetric: Clone + Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Compute the distance between `a` and `b`.
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64>;

    /// The maximal distance substituted when a pair cannot be measured.
    /// Must be finite.
    fn fallback_distance(&self) -> f64;

    /// Whether `config`'s metric settings describe this metric.
    ///
    /// Metrics outside the built-in set have no config representation and
    /// accept any config.
    fn agrees_with(&self, _config: &ClusterConfig) -> bool {
        true
    }

    /// Compute the distance, absorbing recoverable faults.
    ///
    /// Fatal errors (e.g. incompatible lengths) are still returned.
    fn evaluate(&self, a: &[f64], b: &[f64]) -> Result<Evaluation> {
        match self.distance(a, b) {
            Ok(d) if d.is_finite() => Ok(Evaluation::exact(d)),
            Ok(_) => Ok(Evaluation::fallback(
                self.fallback_distance(),
                MetricFault::NonFinite,
            )),
            Err(err) if err.is_recoverable() => Ok(Evaluation::fallback(
                self.fallback_distance(),
                MetricFault::from_error(&err),
            )),
            Err(err) => Err(err),
        }
    }
}

/// Kind of recoverable metric fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFault {
    /// Near-zero variance made the metric undefined.
    DegenerateVariance,
    /// Input or output contained NaN or an infinity.
    NonFinite,
}

impl MetricFault {
    fn from_error(err: &PulseError) -> Self {
        match err {
            PulseError::DegenerateVariance { .. } => MetricFault::DegenerateVariance,
            _ => MetricFault::NonFinite,
        }
    }
}

/// Outcome of one pair evaluation: the distance actually used and, when a
/// fallback was substituted, why.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub distance: f64,
    pub fault: Option<MetricFault>,
}

impl Evaluation {
    pub fn exact(distance: f64) -> Self {
        Self {
            distance,
            fault: None,
        }
    }

    pub fn fallback(distance: f64, fault: MetricFault) -> Self {
        Self {
            distance,
            fault: Some(fault),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fault.is_some()
    }
}

/// Audit record for a pair whose distance was replaced by the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFault {
    pub id_a: SeriesId,
    pub id_b: SeriesId,
    pub fault: MetricFault,
    pub substituted: f64,
}

/// Reject sequences holding NaN or infinities.
pub(crate) fn ensure_finite(values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PulseError::NonFiniteDistance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy metric: absolute difference of the first elements; errors on demand.
    #[derive(Clone)]
    struct FirstElement;

    impl DistanceMetric for FirstElement {
        fn name(&self) -> &'static str {
            "first-element"
        }

        fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
            if a.len() != b.len() {
                return Err(PulseError::length_mismatch(a.len(), b.len()));
            }
            if a[0] == 0.0 || b[0] == 0.0 {
                return Err(PulseError::DegenerateVariance { variance: 0.0 });
            }
            Ok((a[0] - b[0]).abs())
        }

        fn fallback_distance(&self) -> f64 {
            99.0
        }
    }

    #[test]
    fn test_evaluate_passes_through_exact() {
        let e = FirstElement.evaluate(&[1.0], &[3.0]).unwrap();
        assert_eq!(e, Evaluation::exact(2.0));
        assert!(!e.is_fallback());
    }

    #[test]
    fn test_evaluate_substitutes_fallback() {
        let e = FirstElement.evaluate(&[0.0], &[3.0]).unwrap();
        assert_eq!(e.distance, 99.0);
        assert_eq!(e.fault, Some(MetricFault::DegenerateVariance));
    }

    #[test]
    fn test_evaluate_non_finite_output() {
        let e = FirstElement.evaluate(&[f64::INFINITY], &[1.0]).unwrap();
        assert_eq!(e.distance, 99.0);
        assert_eq!(e.fault, Some(MetricFault::NonFinite));
    }

    #[test]
    fn test_evaluate_propagates_fatal() {
        let err = FirstElement.evaluate(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, PulseError::length_mismatch(1, 2));
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&[0.0, -1.5, 2.0]).is_ok());
        assert_eq!(
            ensure_finite(&[0.0, f64::NAN]),
            Err(PulseError::NonFiniteDistance)
        );
    }
}
