use log::warn;
use serde::{Deserialize, Serialize};

use crate::algorithms::common::try_map;
use crate::core::error::{PulseError, Result};
use crate::core::series::{Series, SeriesId};

/// Transform applied to the first difference `values[i+1] - values[i]`
/// before the maximum-subarray scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTransform {
    /// `|dx|`. Never negative, so the best interval spans the whole sequence.
    #[default]
    AbsDiff,
    /// `dx^2`. Also never negative.
    SquaredDiff,
    /// `dx` unchanged; rises and falls cancel.
    SignedDiff,
}

impl ActivityTransform {
    #[inline]
    pub fn apply(self, dx: f64) -> f64 {
        match self {
            ActivityTransform::AbsDiff => dx.abs(),
            ActivityTransform::SquaredDiff => dx * dx,
            ActivityTransform::SignedDiff => dx,
        }
    }

    /// Transformed first differences, length `values.len() - 1`.
    pub fn differences(self, values: &[f64]) -> Vec<f64> {
        values
            .windows(2)
            .map(|w| self.apply(w[1] - w[0]))
            .collect()
    }
}

/// Half-open range `[start, end)` with the sum of the values it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl Interval {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The most active interval of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityInterval {
    pub series_id: SeriesId,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

/// Maximum-sum contiguous subarray of `y` (Kadane's scan).
///
/// Works for arbitrary real input: on all-negative `y` the result is the
/// single largest element, never an empty interval.
///
/// The running window restarts only when its sum turns negative, so zero-sum
/// prefixes are kept. Ties keep the earliest start; for the same start the
/// longer interval wins. One pass, O(n).
///
/// # Errors
/// - `EmptySequence` if `y` is empty
/// - `NonFiniteInput` at the first NaN or infinity
pub fn max_subarray(y: &[f64]) -> Result<Interval> {
    let (&first, rest) = y.split_first().ok_or(PulseError::EmptySequence)?;
    if !first.is_finite() {
        return Err(PulseError::NonFiniteInput { index: 0 });
    }

    let mut running = first;
    let mut run_start = 0;
    let mut best = Interval {
        start: 0,
        end: 1,
        score: first,
    };

    for (offset, &x) in rest.iter().enumerate() {
        let i = offset + 1;
        if !x.is_finite() {
            return Err(PulseError::NonFiniteInput { index: i });
        }

        if running < 0.0 {
            running = x;
            run_start = i;
        } else {
            running += x;
        }

        if running > best.score || (running == best.score && run_start == best.start) {
            best = Interval {
                start: run_start,
                end: i + 1,
                score: running,
            };
        }
    }

    Ok(best)
}

/// Most active interval of `values` under `transform`.
///
/// Indices refer to the transformed difference sequence: `[start, end)` covers
/// the steps from `values[start]` to `values[end]`.
///
/// # Errors
/// `EmptySequence` when `values` has fewer than two points (there is no
/// difference to scan), and `NonFiniteInput` for NaN or infinite values.
pub fn most_active_interval(values: &[f64], transform: ActivityTransform) -> Result<Interval> {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(PulseError::NonFiniteInput { index });
    }
    max_subarray(&transform.differences(values))
}

/// [`most_active_interval`] tagged with the series id.
pub fn series_activity(series: &Series, transform: ActivityTransform) -> Result<ActivityInterval> {
    let interval = most_active_interval(&series.values, transform)?;
    Ok(ActivityInterval {
        series_id: series.id.clone(),
        start: interval.start,
        end: interval.end,
        score: interval.score,
    })
}

/// A series left out of a batch scan because it holds a NaN or infinity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFault {
    pub series_id: SeriesId,
    /// Position of the first non-finite value.
    pub index: usize,
}

/// Outcome of scanning many series: intervals in input order plus the
/// series that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityScan {
    pub intervals: Vec<ActivityInterval>,
    pub skipped: Vec<ActivityFault>,
}

/// Run [`series_activity`] over every series.
///
/// A series holding a non-finite value is skipped and recorded instead of
/// failing the batch. Other errors (a series with fewer than two points) are
/// still returned.
pub fn batch_activity(series: &[&Series], transform: ActivityTransform) -> Result<ActivityScan> {
    let outcomes = try_map(series, |s| match series_activity(s, transform) {
        Ok(interval) => Ok(Ok(interval)),
        Err(PulseError::NonFiniteInput { index }) => {
            warn!("series {} has a non-finite value at {index}; skipping activity scan", s.id);
            Ok(Err(ActivityFault {
                series_id: s.id.clone(),
                index,
            }))
        }
        Err(err) => Err(err),
    })?;

    let mut scan = ActivityScan::default();
    for outcome in outcomes {
        match outcome {
            Ok(interval) => scan.intervals.push(interval),
            Err(fault) => scan.skipped.push(fault),
        }
    }
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_example() {
        let y = [-2.0, 1.0, -3.0, 4.0, -1.0, 2.0, 1.0, -5.0, 4.0];
        let best = max_subarray(&y).unwrap();
        assert_eq!((best.start, best.end), (3, 7));
        assert_eq!(best.score, 6.0);
    }

    #[test]
    fn test_all_negative_single_element() {
        let best = max_subarray(&[-3.0, -1.0, -2.0]).unwrap();
        assert_eq!((best.start, best.end, best.score), (1, 2, -1.0));
        assert_eq!(best.len(), 1);
    }

    #[test]
    fn test_empty_is_error() {
        assert_eq!(max_subarray(&[]), Err(PulseError::EmptySequence));
        assert_eq!(
            most_active_interval(&[1.0], ActivityTransform::AbsDiff),
            Err(PulseError::EmptySequence)
        );
        assert_eq!(
            most_active_interval(&[], ActivityTransform::AbsDiff),
            Err(PulseError::EmptySequence)
        );
    }

    #[test]
    fn test_ties_prefer_leftmost() {
        // [0,2) and [3,5) both sum to 3
        let best = max_subarray(&[1.0, 2.0, -10.0, 2.0, 1.0]).unwrap();
        assert_eq!((best.start, best.end, best.score), (0, 2, 3.0));

        // equal all-negative maxima: first one
        let best = max_subarray(&[-1.0, -5.0, -1.0]).unwrap();
        assert_eq!((best.start, best.end), (0, 1));
    }

    #[test]
    fn test_zero_prefix_kept() {
        let best = max_subarray(&[0.0, 5.0]).unwrap();
        assert_eq!((best.start, best.end, best.score), (0, 2, 5.0));
    }

    #[test]
    fn test_absdiff_covers_everything() {
        // Non-negative transform: the scan never restarts
        let x = [0.0, 1.0, 2.0, 10.0, 9.0, 8.0, 8.0, 8.0];
        let best = most_active_interval(&x, ActivityTransform::AbsDiff).unwrap();
        assert_eq!((best.start, best.end), (0, x.len() - 1));
        assert_eq!(best.score, 12.0);
    }

    #[test]
    fn test_squared_diff() {
        let x = [0.0, 1.0, 3.0, 3.0];
        let best = most_active_interval(&x, ActivityTransform::SquaredDiff).unwrap();
        assert_eq!((best.start, best.end, best.score), (0, 3, 5.0));
    }

    #[test]
    fn test_signed_diff_finds_rise() {
        // falls 3, rises 6, falls 2
        let x = [5.0, 2.0, 4.0, 8.0, 6.0];
        let best = most_active_interval(&x, ActivityTransform::SignedDiff).unwrap();
        assert_eq!((best.start, best.end, best.score), (1, 3, 6.0));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            max_subarray(&[1.0, f64::NAN]),
            Err(PulseError::NonFiniteInput { index: 1 })
        );
        assert_eq!(
            most_active_interval(&[0.0, 1.0, f64::INFINITY], ActivityTransform::AbsDiff),
            Err(PulseError::NonFiniteInput { index: 2 })
        );
    }

    #[test]
    fn test_batch_skips_non_finite_series() {
        let good = Series::new("a", vec![0.0, 1.0, 3.0]);
        let bad = Series::new("b", vec![0.0, 1.0, 2.0, f64::NAN, 1.0]);
        let also_good = Series::new("c", vec![2.0, 2.0, 1.0]);

        let scan = batch_activity(&[&good, &bad, &also_good], ActivityTransform::AbsDiff).unwrap();
        let ids: Vec<&str> = scan.intervals.iter().map(|a| a.series_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(
            scan.skipped,
            vec![ActivityFault {
                series_id: "b".into(),
                index: 3
            }]
        );

        let short = Series::new("d", vec![1.0]);
        assert_eq!(
            batch_activity(&[&good, &short], ActivityTransform::AbsDiff),
            Err(PulseError::EmptySequence)
        );
    }

    #[test]
    fn test_series_activity() {
        let s = Series::new("ecg_1", vec![0.0, 0.5, -0.5, 0.0]);
        let a = series_activity(&s, ActivityTransform::AbsDiff).unwrap();
        assert_eq!(a.series_id.as_str(), "ecg_1");
        assert_eq!((a.start, a.end, a.score), (0, 3, 2.0));
    }
}
