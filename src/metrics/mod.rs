pub mod correlation;
pub mod dtw;

use crate::core::config::{ClusterConfig, MetricKind};
use crate::core::distance_metric::{DistanceMetric, Evaluation};
use crate::core::error::Result;
use crate::core::series::Series;

pub use correlation::PearsonCorrelation;
pub use dtw::{Dtw, DTW_FALLBACK};

/// Metric chosen at runtime from a [`ClusterConfig`].
///
/// Code that knows its metric statically should use [`PearsonCorrelation`] or
/// [`Dtw`] directly; this enum only dispatches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Correlation(PearsonCorrelation),
    Dtw(Dtw),
}

impl Metric {
    pub fn from_config(config: &ClusterConfig) -> Self {
        match config.metric {
            MetricKind::Correlation => Metric::Correlation(PearsonCorrelation),
            MetricKind::Dtw => Metric::Dtw(
                Dtw::new(config.dtw_cost).with_window(config.dtw_window_fraction),
            ),
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Correlation(_) => MetricKind::Correlation,
            Metric::Dtw(_) => MetricKind::Dtw,
        }
    }
}

impl DistanceMetric for Metric {
    fn name(&self) -> &'static str {
        match self {
            Metric::Correlation(m) => m.name(),
            Metric::Dtw(m) => m.name(),
        }
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        match self {
            Metric::Correlation(m) => m.distance(a, b),
            Metric::Dtw(m) => m.distance(a, b),
        }
    }

    fn fallback_distance(&self) -> f64 {
        match self {
            Metric::Correlation(m) => m.fallback_distance(),
            Metric::Dtw(m) => m.fallback_distance(),
        }
    }

    fn agrees_with(&self, config: &ClusterConfig) -> bool {
        match self {
            Metric::Correlation(m) => m.agrees_with(config),
            Metric::Dtw(m) => m.agrees_with(config),
        }
    }
}

/// Distance between two series under `metric`.
///
/// A pair the metric cannot measure (near-constant input, non-finite values)
/// gets the metric's fallback distance, flagged in [`Evaluation::fault`].
/// Only fatal errors such as `LengthMismatch` are returned as `Err`.
pub fn distance<M: DistanceMetric>(metric: &M, a: &Series, b: &Series) -> Result<Evaluation> {
    metric.evaluate(&a.values, &b.values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CellCost;
    use crate::core::distance_metric::MetricFault;
    use crate::core::error::PulseError;

    #[test]
    fn test_from_config_dispatch() {
        let corr = Metric::from_config(&ClusterConfig::default());
        assert_eq!(corr, Metric::Correlation(PearsonCorrelation));
        assert_eq!(corr.kind(), MetricKind::Correlation);
        assert_eq!(corr.fallback_distance(), correlation::CORRELATION_FALLBACK);

        let config = ClusterConfig::new(MetricKind::Dtw)
            .with_dtw_window(Some(0.25))
            .with_dtw_cost(CellCost::Absolute);
        let metric = Metric::from_config(&config);
        assert_eq!(metric.name(), "dtw");
        match metric {
            Metric::Dtw(dtw) => {
                assert_eq!(dtw.window_fraction(), Some(0.25));
                assert_eq!(dtw.cost(), CellCost::Absolute);
            }
            other => panic!("expected dtw, got {other:?}"),
        }
    }

    #[test]
    fn test_distance_on_series() {
        let a = Series::new("a", vec![1.0, 2.0, 3.0, 4.0]);
        let b = Series::new("b", vec![4.0, 3.0, 2.0, 1.0]);
        let metric = Metric::Correlation(PearsonCorrelation);
        let e = distance(&metric, &a, &b).unwrap();
        assert!((e.distance - 2.0).abs() < 1e-12);
        assert!(!e.is_fallback());
        assert_eq!(distance(&metric, &a, &a).unwrap(), Evaluation::exact(0.0));
    }

    #[test]
    fn test_distance_flags_degenerate_pair() {
        let flat = Series::new("flat", vec![0.5; 6]);
        let wave = Series::new("wave", vec![0.0, 1.0, 0.0, -1.0, 0.0, 1.0]);
        let metric = Metric::Correlation(PearsonCorrelation);

        let e = distance(&metric, &flat, &wave).unwrap();
        assert_eq!(e.distance, correlation::CORRELATION_FALLBACK);
        assert_eq!(e.fault, Some(MetricFault::DegenerateVariance));

        let short = Series::new("short", vec![0.0, 1.0]);
        assert_eq!(
            distance(&metric, &wave, &short),
            Err(PulseError::length_mismatch(6, 2))
        );
    }

    #[test]
    fn test_metric_agrees_with_config() {
        let dtw_config = ClusterConfig::new(MetricKind::Dtw);
        assert!(Metric::from_config(&dtw_config).agrees_with(&dtw_config));
        assert!(!Metric::from_config(&dtw_config).agrees_with(&ClusterConfig::default()));
        assert!(Metric::Correlation(PearsonCorrelation).agrees_with(&ClusterConfig::default()));
    }
}
