use serde::{Deserialize, Serialize};

use crate::algorithms::common::{evaluate_pair, resolve_members};
use crate::core::distance_metric::{DistanceMetric, PairFault};
use crate::core::error::Result;
use crate::core::series::{SeriesId, SeriesSet};

/// The most similar pair inside one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestPair {
    /// Smaller id of the pair.
    pub id_a: SeriesId,
    /// Larger id of the pair.
    pub id_b: SeriesId,
    pub distance: f64,
    /// Whether `distance` is the metric's fallback rather than a measurement.
    pub fallback: bool,
}

/// Find the minimum-distance pair among `members` by exhaustive search.
///
/// Every unordered pair is evaluated, O(k^2) metric calls for k members, so this
/// is meant for leaves whose size the partitioner has already bounded.
///
/// Pairs are visited in lexicographic `(id_a, id_b)` order and only a strictly
/// smaller distance replaces the current best, so ties resolve to the
/// lexicographically smallest id pair regardless of the input order.
///
/// Returns `None` for fewer than two members. Metric faults are replaced by the
/// fallback distance and appended to `faults`.
///
/// # Errors
/// `UnknownSeries` / `DuplicateSeries` for bad ids, and fatal metric errors
/// such as `LengthMismatch`.
pub fn closest_pair<M: DistanceMetric>(
    set: &SeriesSet,
    members: &[SeriesId],
    metric: &M,
    faults: &mut Vec<PairFault>,
) -> Result<Option<ClosestPair>> {
    let mut series = resolve_members(set, members)?;
    if series.len() < 2 {
        return Ok(None);
    }
    series.sort_by(|a, b| a.id.cmp(&b.id));

    let mut best: Option<ClosestPair> = None;
    for (i, a) in series.iter().enumerate() {
        for b in &series[i + 1..] {
            let eval = evaluate_pair(metric, a, b, faults)?;
            if best.as_ref().map_or(true, |p| eval.distance < p.distance) {
                best = Some(ClosestPair {
                    id_a: a.id.clone(),
                    id_b: b.id.clone(),
                    distance: eval.distance,
                    fallback: eval.is_fallback(),
                });
            }
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PulseError;
    use crate::core::series::Series;
    use crate::metrics::{Dtw, PearsonCorrelation};

    fn ids(names: &[&str]) -> Vec<SeriesId> {
        names.iter().map(|&n| SeriesId::from(n)).collect()
    }

    #[test]
    fn test_fewer_than_two() {
        let set = SeriesSet::from_series([Series::new("a", vec![1.0, 2.0, 3.0])]).unwrap();
        let mut faults = Vec::new();
        assert_eq!(closest_pair(&set, &[], &PearsonCorrelation, &mut faults).unwrap(), None);
        assert_eq!(
            closest_pair(&set, &ids(&["a"]), &PearsonCorrelation, &mut faults).unwrap(),
            None
        );
    }

    #[test]
    fn test_identical_pair_is_zero() {
        let wave: Vec<f64> = (0..32).map(|i| (i as f64 * 0.3).sin()).collect();
        let set = SeriesSet::from_series([
            Series::new("x", wave.clone()),
            Series::new("y", (0..32).map(|i| (i as f64 * 0.9).cos()).collect()),
            Series::new("z", wave),
        ])
        .unwrap();
        let mut faults = Vec::new();

        for metric_pair in [
            closest_pair(&set, &set.ids(), &PearsonCorrelation, &mut faults).unwrap(),
            closest_pair(&set, &set.ids(), &Dtw::default(), &mut faults).unwrap(),
        ] {
            let pair = metric_pair.unwrap();
            assert_eq!((pair.id_a.as_str(), pair.id_b.as_str()), ("x", "z"));
            assert_eq!(pair.distance, 0.0);
            assert!(!pair.fallback);
        }
        assert!(faults.is_empty());
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        // DTW with absolute cost on single points: |a - b|
        // a-d, b-c and c-d are all at distance 1; (a, d) is smallest among the ties
        let set = SeriesSet::from_series([
            Series::new("d", vec![3.0]),
            Series::new("c", vec![2.0]),
            Series::new("b", vec![1.0]),
            Series::new("a", vec![4.0]),
        ])
        .unwrap();
        let metric = Dtw::new(crate::core::config::CellCost::Absolute);
        let mut faults = Vec::new();

        let forward = closest_pair(&set, &ids(&["a", "b", "c", "d"]), &metric, &mut faults)
            .unwrap()
            .unwrap();
        let reversed = closest_pair(&set, &ids(&["d", "c", "b", "a"]), &metric, &mut faults)
            .unwrap()
            .unwrap();

        assert_eq!(forward, reversed);
        assert_eq!((forward.id_a.as_str(), forward.id_b.as_str()), ("a", "d"));
        assert_eq!(forward.distance, 1.0);
    }

    #[test]
    fn test_all_degenerate_uses_fallback() {
        let set = SeriesSet::from_series([
            Series::new("p", vec![1.0; 6]),
            Series::new("q", vec![2.0; 6]),
            Series::new("r", vec![3.0; 6]),
        ])
        .unwrap();
        let mut faults = Vec::new();
        let pair = closest_pair(&set, &set.ids(), &PearsonCorrelation, &mut faults)
            .unwrap()
            .unwrap();
        assert_eq!((pair.id_a.as_str(), pair.id_b.as_str()), ("p", "q"));
        assert_eq!(pair.distance, 2.0);
        assert!(pair.fallback);
        assert_eq!(faults.len(), 3);
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let set = SeriesSet::from_series([
            Series::new("a", vec![1.0, 2.0]),
            Series::new("b", vec![2.0, 1.0]),
        ])
        .unwrap();
        let mut faults = Vec::new();
        let err = closest_pair(&set, &ids(&["a", "b", "a"]), &PearsonCorrelation, &mut faults)
            .unwrap_err();
        assert_eq!(err, PulseError::DuplicateSeries("a".into()));
    }
}
