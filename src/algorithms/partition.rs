use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::algorithms::common::{evaluate_pair, median, resolve_members, NodeKey};
use crate::core::config::ClusterConfig;
use crate::core::distance_metric::{DistanceMetric, PairFault};
use crate::core::error::{PulseError, Result};
use crate::core::series::{Series, SeriesId, SeriesSet};

/// Nodes at least this large split their children across rayon tasks.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_MEMBERS: usize = 64;

/// Why a node was emitted as a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `|members| <= min_cluster_size`.
    MinSize,
    /// `depth >= max_depth`.
    MaxDepth,
    /// Mean pivot distance at or below the dispersion threshold.
    Dispersion,
    /// Every member fell on the left of the median, so splitting would not
    /// change the member set.
    OneSidedSplit,
}

/// A node of the partition tree built by one [`partition`] call.
#[derive(Debug, Clone)]
pub struct ClusterNode {
    pub members: Vec<SeriesId>,
    pub depth: usize,
    /// Mean distance to the pivot, when the node got far enough to pick one.
    pub dispersion: Option<f64>,
    pub pivot: Option<SeriesId>,
    /// Set on leaves only.
    pub stop: Option<StopReason>,
    pub children: Option<Box<(ClusterNode, ClusterNode)>>,
}

impl ClusterNode {
    fn leaf(
        members: Vec<SeriesId>,
        depth: usize,
        dispersion: Option<f64>,
        pivot: Option<SeriesId>,
        stop: StopReason,
    ) -> Self {
        Self {
            members,
            depth,
            dispersion,
            pivot,
            stop: Some(stop),
            children: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Depth of the deepest node below (and including) this one.
    pub fn height(&self) -> usize {
        match &self.children {
            Some(pair) => pair.0.height().max(pair.1.height()),
            None => self.depth,
        }
    }

    fn collect_leaves(&self, out: &mut Vec<Leaf>) {
        match &self.children {
            Some(pair) => {
                pair.0.collect_leaves(out);
                pair.1.collect_leaves(out);
            }
            None => out.push(Leaf {
                members: self.members.clone(),
                depth: self.depth,
                dispersion: self.dispersion,
                stop: self.stop.unwrap_or(StopReason::MinSize),
            }),
        }
    }
}

/// A terminal cluster: the durable output of partitioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub members: Vec<SeriesId>,
    pub depth: usize,
    pub dispersion: Option<f64>,
    pub stop: StopReason,
}

impl Leaf {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of one partitioning run: the tree plus every fallback substitution
/// made while building it.
#[derive(Debug, Clone)]
pub struct Partition {
    pub root: ClusterNode,
    pub faults: Vec<PairFault>,
}

impl Partition {
    /// Leaves in left-to-right tree order.
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }

    pub fn height(&self) -> usize {
        self.root.height()
    }
}

/// Read-only state shared by every node of one run.
struct SplitCtx<'a, M: DistanceMetric> {
    metric: &'a M,
    config: &'a ClusterConfig,
}

/// Recursively partition `ids` into disjoint leaf clusters.
///
/// # Algorithm
/// For a node holding `members` at `depth`:
/// 1. Stop if `|members| <= min_cluster_size` or `depth >= max_depth`.
/// 2. Pick a pivot from the node key (derived from `rng_seed` and the path).
/// 3. Measure every member against the pivot (the pivot itself at 0). Stop if
///    the mean of these distances is at or below `dispersion_threshold`.
/// 4. Members with distance `<=` median go left, the rest right. Stop if the
///    right side is empty.
/// 5. Recurse on both sides at `depth + 1`.
///
/// Metric faults on a pair are replaced by the metric's fallback distance and
/// recorded in [`Partition::faults`]; they never abort the run.
///
/// # Errors
/// - `EmptyIdSet` if `ids` is empty
/// - `UnknownSeries` / `DuplicateSeries` for bad ids
/// - `InvalidParameter` if the config fails validation
/// - fatal metric errors such as `LengthMismatch`
pub fn partition<M: DistanceMetric>(
    set: &SeriesSet,
    ids: &[SeriesId],
    metric: &M,
    config: &ClusterConfig,
) -> Result<Partition> {
    config.validate()?;
    if ids.is_empty() {
        return Err(PulseError::EmptyIdSet);
    }
    let members = resolve_members(set, ids)?;

    let ctx = SplitCtx { metric, config };
    let (root, faults) = split_node(&ctx, members, 0, NodeKey::root(config.rng_seed))?;
    let result = Partition { root, faults };

    info!(
        "partitioned {} series with {} metric: {} leaves, height {}, {} fallback pairs",
        ids.len(),
        metric.name(),
        result.leaves().len(),
        result.height(),
        result.faults.len()
    );
    Ok(result)
}

/// Partition `ids` and return only the leaves.
pub fn build_clusters<M: DistanceMetric>(
    set: &SeriesSet,
    ids: &[SeriesId],
    metric: &M,
    config: &ClusterConfig,
) -> Result<Vec<Leaf>> {
    partition(set, ids, metric, config).map(|p| p.leaves())
}

fn split_node<M: DistanceMetric>(
    ctx: &SplitCtx<'_, M>,
    members: Vec<&Series>,
    depth: usize,
    key: NodeKey,
) -> Result<(ClusterNode, Vec<PairFault>)> {
    let n = members.len();
    let ids = || members.iter().map(|s| s.id.clone()).collect::<Vec<_>>();

    if n <= ctx.config.min_cluster_size {
        debug!("depth {depth}: {n} members at or below min size, leaf");
        return Ok((
            ClusterNode::leaf(ids(), depth, None, None, StopReason::MinSize),
            Vec::new(),
        ));
    }
    if depth >= ctx.config.max_depth {
        debug!("depth {depth}: max depth reached with {n} members, leaf");
        return Ok((
            ClusterNode::leaf(ids(), depth, None, None, StopReason::MaxDepth),
            Vec::new(),
        ));
    }

    let pivot_idx = key.pick(n);
    let pivot = members[pivot_idx];
    let mut faults = Vec::new();
    let distances = members
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == pivot_idx {
                Ok(0.0)
            } else {
                evaluate_pair(ctx.metric, s, pivot, &mut faults).map(|e| e.distance)
            }
        })
        .collect::<Result<Vec<f64>>>()?;

    // scale before summing; fallback distances sit at f64::MAX
    let dispersion = distances
        .iter()
        .map(|d| d / n as f64)
        .sum::<f64>()
        .min(f64::MAX);
    if dispersion <= ctx.config.dispersion_threshold {
        debug!("depth {depth}: dispersion {dispersion:.4} within threshold, leaf");
        return Ok((
            ClusterNode::leaf(
                ids(),
                depth,
                Some(dispersion),
                Some(pivot.id.clone()),
                StopReason::Dispersion,
            ),
            faults,
        ));
    }

    let Some(med) = median(&distances) else {
        unreachable!("node with members has distances");
    };
    let (left, right): (Vec<(&Series, f64)>, Vec<(&Series, f64)>) = members
        .iter()
        .copied()
        .zip(distances.iter().copied())
        .partition(|&(_, d)| d <= med);

    if right.is_empty() {
        debug!("depth {depth}: all {n} members at or below median {med:.4}, leaf");
        return Ok((
            ClusterNode::leaf(
                ids(),
                depth,
                Some(dispersion),
                Some(pivot.id.clone()),
                StopReason::OneSidedSplit,
            ),
            faults,
        ));
    }

    debug!(
        "depth {depth}: split {n} members around pivot {} (median {med:.4}) into {}/{}",
        pivot.id,
        left.len(),
        right.len()
    );

    let left: Vec<&Series> = left.into_iter().map(|(s, _)| s).collect();
    let right: Vec<&Series> = right.into_iter().map(|(s, _)| s).collect();
    let (left_result, right_result) = recurse(ctx, left, right, depth + 1, key);
    let (left_node, left_faults) = left_result?;
    let (right_node, right_faults) = right_result?;

    faults.extend(left_faults);
    faults.extend(right_faults);

    let node = ClusterNode {
        members: ids(),
        depth,
        dispersion: Some(dispersion),
        pivot: Some(pivot.id.clone()),
        stop: None,
        children: Some(Box::new((left_node, right_node))),
    };
    Ok((node, faults))
}

type NodeResult = Result<(ClusterNode, Vec<PairFault>)>;

#[cfg(feature = "parallel")]
fn recurse<M: DistanceMetric>(
    ctx: &SplitCtx<'_, M>,
    left: Vec<&Series>,
    right: Vec<&Series>,
    depth: usize,
    key: NodeKey,
) -> (NodeResult, NodeResult) {
    if left.len() + right.len() >= PARALLEL_MIN_MEMBERS {
        rayon::join(
            || split_node(ctx, left, depth, key.left()),
            || split_node(ctx, right, depth, key.right()),
        )
    } else {
        (
            split_node(ctx, left, depth, key.left()),
            split_node(ctx, right, depth, key.right()),
        )
    }
}

#[cfg(not(feature = "parallel"))]
fn recurse<M: DistanceMetric>(
    ctx: &SplitCtx<'_, M>,
    left: Vec<&Series>,
    right: Vec<&Series>,
    depth: usize,
    key: NodeKey,
) -> (NodeResult, NodeResult) {
    (
        split_node(ctx, left, depth, key.left()),
        split_node(ctx, right, depth, key.right()),
    )
}
