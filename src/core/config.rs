use serde::{Deserialize, Serialize};

use crate::core::error::{PulseError, Result};

/// Which distance metric a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// `1 - pearson(a, b)`, in [0, 2].
    #[default]
    Correlation,
    /// Dynamic time warping cumulative cost.
    Dtw,
}

/// Per-cell cost used inside the DTW grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellCost {
    /// `|a_i - b_j|`
    Absolute,
    /// `(a_i - b_j)^2`
    #[default]
    Squared,
}

impl CellCost {
    #[inline]
    pub fn cost(self, a: f64, b: f64) -> f64 {
        match self {
            CellCost::Absolute => (a - b).abs(),
            CellCost::Squared => (a - b) * (a - b),
        }
    }
}

/// Configuration for a clustering run.
///
/// Missing fields fall back to [`ClusterConfig::default`] when deserializing,
/// so a partial JSON object such as `{"metric": "dtw"}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Nodes at this depth become leaves without being split.
    pub max_depth: usize,
    /// Nodes with at most this many members become leaves.
    pub min_cluster_size: usize,
    /// Nodes whose mean pivot distance is at or below this become leaves.
    pub dispersion_threshold: f64,
    pub metric: MetricKind,
    /// Sakoe-Chiba band as a fraction of the longer series; `None` is unbanded.
    pub dtw_window_fraction: Option<f64>,
    pub dtw_cost: CellCost,
    /// Run seed from which every node's pivot choice is derived.
    pub rng_seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_cluster_size: 20,
            dispersion_threshold: 0.0,
            metric: MetricKind::Correlation,
            dtw_window_fraction: Some(0.1),
            dtw_cost: CellCost::Squared,
            rng_seed: 7,
        }
    }
}

impl ClusterConfig {
    pub fn new(metric: MetricKind) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    pub fn with_dispersion_threshold(mut self, threshold: f64) -> Self {
        self.dispersion_threshold = threshold;
        self
    }

    pub fn with_dtw_window(mut self, fraction: Option<f64>) -> Self {
        self.dtw_window_fraction = fraction;
        self
    }

    pub fn with_dtw_cost(mut self, cost: CellCost) -> Self {
        self.dtw_cost = cost;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Check value ranges that the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.dispersion_threshold.is_finite() {
            return Err(PulseError::invalid_parameter(format!(
                "dispersion_threshold must be finite, got {}",
                self.dispersion_threshold
            )));
        }
        if let Some(fraction) = self.dtw_window_fraction {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(PulseError::invalid_parameter(format!(
                    "dtw_window_fraction must be in [0, 1], got {fraction}"
                )));
            }
        }
        Ok(())
    }
}
