use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{PulseError, Result};

/// Stable identifier of a series.
///
/// Ids are opaque to the algorithms apart from their total order, which is
/// used for deterministic tie-breaking (closest pair, result ordering).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeriesId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SeriesId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for SeriesId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A single fixed-length sequence handed to the core.
///
/// The optional `label` (e.g. signal category) is carried through for
/// reporting and never read by the algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub values: Vec<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

impl Series {
    pub fn new(id: impl Into<SeriesId>, values: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            values,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read-only collection of series keyed by id, iterated in id order.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    series: BTreeMap<SeriesId, Series>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, rejecting duplicate ids.
    pub fn from_series(series: impl IntoIterator<Item = Series>) -> Result<Self> {
        let mut set = Self::new();
        for s in series {
            set.insert(s)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, series: Series) -> Result<()> {
        if self.series.contains_key(&series.id) {
            return Err(PulseError::DuplicateSeries(series.id));
        }
        self.series.insert(series.id.clone(), series);
        Ok(())
    }

    /// Look up a series, failing with [`PulseError::UnknownSeries`].
    pub fn get(&self, id: &SeriesId) -> Result<&Series> {
        self.series
            .get(id)
            .ok_or_else(|| PulseError::UnknownSeries(id.clone()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.series.contains_key(id)
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<SeriesId> {
        self.series.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The common length of all series, or `None` if lengths differ or the set is empty.
    pub fn uniform_len(&self) -> Option<usize> {
        let mut lens = self.series.values().map(Series::len);
        let first = lens.next()?;
        lens.all(|l| l == first).then_some(first)
    }
}
