use std::collections::HashSet;

use log::warn;

use crate::core::distance_metric::{DistanceMetric, Evaluation, PairFault};
use crate::core::error::{PulseError, Result};
use crate::core::series::{Series, SeriesId, SeriesSet};

/// Identity of a node in the partition tree, carried as a 64-bit key.
///
/// The root key is derived from the run seed; each child key is derived from
/// its parent's key and branch. Pivot choice depends only on the key, never on
/// a shared generator, so sequential and parallel traversal pick the same
/// pivots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(u64);

impl NodeKey {
    pub fn root(seed: u64) -> Self {
        Self(splitmix64(seed))
    }

    pub fn left(self) -> Self {
        Self(splitmix64(self.0 ^ 0x9E37_79B9_7F4A_7C15))
    }

    pub fn right(self) -> Self {
        Self(splitmix64(self.0 ^ 0xD1B5_4A32_D192_ED03))
    }

    /// Deterministic index in `0..len` for this node.
    pub fn pick(self, len: usize) -> usize {
        assert!(len > 0, "Cannot pick from an empty node");
        (splitmix64(self.0) % len as u64) as usize
    }
}

/// SplitMix64 finalizer (Steele et al.), a bijective 64-bit mixer.
#[inline]
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Median of `values`; the mean of the two middle values for even counts.
///
/// Infinite values sort last. Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        let (lo, hi) = (sorted[mid - 1], sorted[mid]);
        // halve first so two large finite distances cannot overflow
        Some(lo / 2.0 + hi / 2.0)
    }
}

/// Resolve `ids` against `set`, rejecting unknown and repeated ids.
pub fn resolve_members<'a>(set: &'a SeriesSet, ids: &[SeriesId]) -> Result<Vec<&'a Series>> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .map(|id| {
            if !seen.insert(id) {
                return Err(PulseError::DuplicateSeries(id.clone()));
            }
            set.get(id)
        })
        .collect()
}

/// Evaluate one pair, logging and recording any fallback substitution.
pub fn evaluate_pair<M: DistanceMetric>(
    metric: &M,
    a: &Series,
    b: &Series,
    faults: &mut Vec<PairFault>,
) -> Result<Evaluation> {
    let eval = metric.evaluate(&a.values, &b.values)?;
    if let Some(fault) = eval.fault {
        warn!(
            "{} distance fault {:?} for ({}, {}); using fallback {}",
            metric.name(),
            fault,
            a.id,
            b.id,
            eval.distance
        );
        faults.push(PairFault {
            id_a: a.id.clone().min(b.id.clone()),
            id_b: a.id.clone().max(b.id.clone()),
            fault,
            substituted: eval.distance,
        });
    }
    Ok(eval)
}

/// Map `f` over `items`, keeping input order and stopping at the first error.
///
/// With the `parallel` feature the items are processed on the rayon pool.
pub fn try_map<T, R, F>(items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    let out = {
        use rayon::prelude::*;
        items.par_iter().map(f).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let out = items.iter().map(f).collect();
    out
}
