use serde::{Deserialize, Serialize};

use crate::algorithms::common::median;
use crate::algorithms::partition::{Leaf, StopReason};
use crate::core::error::Result;
use crate::core::series::SeriesSet;

/// Per-leaf digest handed to reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// `c{index}` in leaf order.
    pub cluster_id: String,
    pub size: usize,
    pub depth: usize,
    pub dispersion: Option<f64>,
    pub stop: StopReason,
    /// Median member length, rounded down.
    pub median_len: usize,
}

/// Label used for the leaf at `index` across all reports.
pub fn cluster_label(index: usize) -> String {
    format!("c{index}")
}

/// Summarize each leaf; fails with `UnknownSeries` if a member is missing from `set`.
pub fn summarize_clusters(leaves: &[Leaf], set: &SeriesSet) -> Result<Vec<ClusterSummary>> {
    leaves
        .iter()
        .enumerate()
        .map(|(idx, leaf)| {
            let lengths = leaf
                .members
                .iter()
                .map(|id| set.get(id).map(|s| s.len() as f64))
                .collect::<Result<Vec<f64>>>()?;
            Ok(ClusterSummary {
                cluster_id: cluster_label(idx),
                size: leaf.len(),
                depth: leaf.depth,
                dispersion: leaf.dispersion,
                stop: leaf.stop,
                median_len: median(&lengths).map_or(0, |m| m.floor() as usize),
            })
        })
        .collect()
}
