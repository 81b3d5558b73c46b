use crate::core::config::{CellCost, ClusterConfig, MetricKind};
use crate::core::distance_metric::{ensure_finite, DistanceMetric};
use crate::core::error::{PulseError, Result};

/// Distance substituted for pairs whose DTW cost cannot be computed.
///
/// DTW cost has no upper bound, so the largest finite value stands in for it.
/// Keeping it finite lets results serialize as plain JSON numbers.
pub const DTW_FALLBACK: f64 = f64::MAX;

/// Dynamic time warping distance with an optional Sakoe-Chiba band.
///
/// Returns the cumulative cost of the cheapest monotone warping path at the
/// terminal cell `(N, M)`, without renormalization.
///
/// With a band, only cells with `|i - j| <= floor(window_fraction * max(N, M))`
/// are visited. A fraction of 0 forces the diagonal path, which only exists
/// when `N == M`; a band narrower than `|N - M|` cannot reach the terminal
/// cell and is rejected with `LengthMismatch`.
///
/// Only two grid rows are kept alive, so memory is O(M) while time is O(N*M),
/// or O(N*W) with a band of width W.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dtw {
    window_fraction: Option<f64>,
    cost: CellCost,
}

impl Default for Dtw {
    fn default() -> Self {
        Self::new(CellCost::default())
    }
}

impl Dtw {
    /// Unbanded DTW with the given per-cell cost.
    pub fn new(cost: CellCost) -> Self {
        Self {
            window_fraction: None,
            cost,
        }
    }

    /// Restrict warping to a Sakoe-Chiba band; `None` removes the band.
    ///
    /// The fraction is clamped into [0, 1].
    pub fn with_window(mut self, fraction: Option<f64>) -> Self {
        self.window_fraction = fraction.map(|f| f.clamp(0.0, 1.0));
        self
    }

    pub fn window_fraction(&self) -> Option<f64> {
        self.window_fraction
    }

    pub fn cost(&self) -> CellCost {
        self.cost
    }

    /// Band half-width in cells for series of length `n` and `m`.
    pub fn band_width(&self, n: usize, m: usize) -> Option<usize> {
        self.window_fraction
            .map(|f| (f * n.max(m) as f64).floor() as usize)
    }
}

impl DistanceMetric for Dtw {
    fn name(&self) -> &'static str {
        "dtw"
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.is_empty() || b.is_empty() {
            return Err(PulseError::EmptySequence);
        }
        ensure_finite(a)?;
        ensure_finite(b)?;

        let n = a.len();
        let m = b.len();
        let window = match self.band_width(n, m) {
            Some(w) if w < n.abs_diff(m) => return Err(PulseError::length_mismatch(n, m)),
            Some(w) => w,
            None => n.max(m),
        };

        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];
        prev[0] = 0.0;

        for i in 1..=n {
            let j_start = i.saturating_sub(window).max(1);
            let j_end = (i + window).min(m);

            // Cells the next row may read outside this row's band stay unreachable
            curr[j_start - 1] = f64::INFINITY;
            if j_end < m {
                curr[j_end + 1] = f64::INFINITY;
            }

            let ai = a[i - 1];
            for j in j_start..=j_end {
                let best = prev[j].min(curr[j - 1]).min(prev[j - 1]);
                curr[j] = self.cost.cost(ai, b[j - 1]) + best;
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        let total = prev[m];
        if total.is_finite() {
            Ok(total)
        } else {
            Err(PulseError::NonFiniteDistance)
        }
    }

    fn fallback_distance(&self) -> f64 {
        DTW_FALLBACK
    }

    /// The config must select DTW with this band and cell cost.
    fn agrees_with(&self, config: &ClusterConfig) -> bool {
        config.metric == MetricKind::Dtw
            && *self == Dtw::new(config.dtw_cost).with_window(config.dtw_window_fraction)
    }
}
