pub mod algorithms;
pub mod core;
pub mod metrics;
pub mod preprocess;

pub use crate::algorithms::activity::{
    batch_activity, max_subarray, most_active_interval, series_activity, ActivityFault,
    ActivityInterval, ActivityScan, ActivityTransform, Interval,
};
pub use crate::algorithms::closest_pair::{closest_pair, ClosestPair};
pub use crate::algorithms::partition::{
    build_clusters, partition, ClusterNode, Leaf, Partition, StopReason,
};
pub use crate::algorithms::summary::{summarize_clusters, ClusterSummary};
pub use crate::core::config::{CellCost, ClusterConfig, MetricKind};
pub use crate::core::distance_metric::{DistanceMetric, Evaluation, MetricFault, PairFault};
pub use crate::core::error::{PulseError, Result};
pub use crate::core::series::{Series, SeriesId, SeriesSet};
pub use crate::metrics::correlation::{CORRELATION_FALLBACK, VARIANCE_EPSILON};
pub use crate::metrics::{distance, Dtw, Metric, PearsonCorrelation, DTW_FALLBACK};

use serde::{Deserialize, Serialize};

use crate::algorithms::common::try_map;
use crate::algorithms::summary::cluster_label;

/// High-level facade over partitioning, closest-pair search and activity
/// scans, generic over distance metric.
///
/// # Examples
///
/// ```
/// use pulse_cluster::{ClusterConfig, CorrelationEngine, PearsonCorrelation, Series, SeriesSet};
///
/// let set = SeriesSet::from_series((0..40).map(|k| {
///     let values = (0..64).map(|i| ((i + k) as f64 * 0.2).sin()).collect();
///     Series::new(format!("s{k}"), values)
/// }))
/// .unwrap();
///
/// let config = ClusterConfig::default().with_min_cluster_size(5);
/// let engine = CorrelationEngine::new(config, PearsonCorrelation).unwrap();
/// let leaves = engine.build_clusters(&set, &set.ids()).unwrap();
/// assert_eq!(leaves.iter().map(|l| l.len()).sum::<usize>(), 40);
/// ```
#[derive(Debug, Clone)]
pub struct ClusterEngine<M: DistanceMetric> {
    config: ClusterConfig,
    metric: M,
    transform: ActivityTransform,
}

impl ClusterEngine<Metric> {
    /// Create an engine whose metric is selected by `config.metric`.
    pub fn from_config(config: ClusterConfig) -> Result<Self> {
        let metric = Metric::from_config(&config);
        Self::new(config, metric)
    }
}

impl<M: DistanceMetric> ClusterEngine<M> {
    /// Create a new engine, validating the configuration.
    ///
    /// `config.metric`, `dtw_window_fraction` and `dtw_cost` must describe
    /// `metric`; a mismatch is rejected with `InvalidParameter`.
    pub fn new(config: ClusterConfig, metric: M) -> Result<Self> {
        config.validate()?;
        if !metric.agrees_with(&config) {
            return Err(PulseError::invalid_parameter(format!(
                "config metric settings ({:?}, window {:?}, cost {:?}) do not match the {} metric",
                config.metric,
                config.dtw_window_fraction,
                config.dtw_cost,
                metric.name()
            )));
        }
        Ok(Self {
            config,
            metric,
            transform: ActivityTransform::default(),
        })
    }

    /// Use `transform` for activity scans (default: absolute difference).
    pub fn with_transform(mut self, transform: ActivityTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Distance between two series, with the fallback flagged when the metric
    /// cannot measure the pair.
    pub fn distance(&self, a: &Series, b: &Series) -> Result<Evaluation> {
        distance(&self.metric, a, b)
    }

    /// Partition `ids` and keep the full tree and fault audit.
    pub fn partition(&self, set: &SeriesSet, ids: &[SeriesId]) -> Result<Partition> {
        partition(set, ids, &self.metric, &self.config)
    }

    /// Partition `ids` into disjoint leaves.
    pub fn build_clusters(&self, set: &SeriesSet, ids: &[SeriesId]) -> Result<Vec<Leaf>> {
        build_clusters(set, ids, &self.metric, &self.config)
    }

    /// Closest pair among `members`; fallback substitutions are logged only.
    pub fn closest_pair(
        &self,
        set: &SeriesSet,
        members: &[SeriesId],
    ) -> Result<Option<ClosestPair>> {
        let mut faults = Vec::new();
        closest_pair(set, members, &self.metric, &mut faults)
    }

    /// Closest pair of every leaf, in leaf order, plus the faults met on the way.
    ///
    /// Leaves are independent, so with the `parallel` feature they are searched
    /// concurrently; the output order and contents do not depend on scheduling.
    pub fn closest_pairs(
        &self,
        set: &SeriesSet,
        leaves: &[Leaf],
    ) -> Result<(Vec<Option<ClosestPair>>, Vec<PairFault>)> {
        let search = |leaf: &Leaf| -> Result<(Option<ClosestPair>, Vec<PairFault>)> {
            let mut faults = Vec::new();
            let pair = closest_pair(set, &leaf.members, &self.metric, &mut faults)?;
            Ok((pair, faults))
        };

        let per_leaf = try_map(leaves, search)?;

        let mut pairs = Vec::with_capacity(per_leaf.len());
        let mut faults = Vec::new();
        for (pair, leaf_faults) in per_leaf {
            pairs.push(pair);
            faults.extend(leaf_faults);
        }
        Ok((pairs, faults))
    }

    /// Most active interval of every series in `set`, in id order. Series
    /// holding non-finite values are skipped and listed in the scan.
    pub fn activity(&self, set: &SeriesSet) -> Result<ActivityScan> {
        let series: Vec<&Series> = set.iter().collect();
        batch_activity(&series, self.transform)
    }

    /// Run the whole pipeline over every series in `set`.
    pub fn analyze(&self, set: &SeriesSet) -> Result<Analysis> {
        let ids = set.ids();
        let partition = self.partition(set, &ids)?;
        let leaves = partition.leaves();
        let mut faults = partition.faults;

        let (pairs, pair_faults) = self.closest_pairs(set, &leaves)?;
        faults.extend(pair_faults);

        let closest_pairs = pairs
            .into_iter()
            .enumerate()
            .map(|(idx, pair)| LeafPair {
                cluster_id: cluster_label(idx),
                pair,
            })
            .collect();

        let scan = self.activity(set)?;

        Ok(Analysis {
            summaries: summarize_clusters(&leaves, set)?,
            activity: scan.intervals,
            skipped_activity: scan.skipped,
            leaves,
            closest_pairs,
            faults,
        })
    }
}

/// Closest pair of one leaf, keyed by the leaf's label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafPair {
    pub cluster_id: String,
    pub pair: Option<ClosestPair>,
}

/// Everything one [`ClusterEngine::analyze`] run produces, as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub leaves: Vec<Leaf>,
    pub summaries: Vec<ClusterSummary>,
    pub closest_pairs: Vec<LeafPair>,
    pub activity: Vec<ActivityInterval>,
    /// Series left out of the activity scan because of non-finite values.
    pub skipped_activity: Vec<ActivityFault>,
    /// Every pair whose distance was replaced by the metric's fallback.
    pub faults: Vec<PairFault>,
}

impl Analysis {
    /// Number of pair evaluations that used the fallback distance.
    pub fn fallback_count(&self) -> usize {
        self.faults.len()
    }
}

/// Convenience type alias for correlation-distance clustering.
pub type CorrelationEngine = ClusterEngine<PearsonCorrelation>;

/// Convenience type alias for DTW clustering.
pub type DtwEngine = ClusterEngine<Dtw>;
