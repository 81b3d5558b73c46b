//! Harmonization helpers: z-scoring and length equalization.
//!
//! The clustering core assumes every series in a run is already z-scored and
//! of one length; these helpers produce that shape from raw traces.

use crate::core::error::{PulseError, Result};
use crate::core::series::{Series, SeriesSet};

/// Added to the standard deviation so flat traces map to zeros instead of NaN.
pub const ZSCORE_EPSILON: f64 = 1e-8;

/// Z-score `x` using the population standard deviation.
pub fn zscore(x: &[f64]) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(PulseError::EmptySequence);
    }
    if let Some(index) = x.iter().position(|v| !v.is_finite()) {
        return Err(PulseError::NonFiniteInput { index });
    }
    let n = x.len() as f64;
    let mu = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / n;
    let denom = var.sqrt() + ZSCORE_EPSILON;
    Ok(x.iter().map(|v| (v - mu) / denom).collect())
}

/// Linearly resample `x` onto `target_len` evenly spaced points spanning the
/// same range (first and last samples are preserved).
pub fn resample_linear(x: &[f64], target_len: usize) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(PulseError::EmptySequence);
    }
    if target_len == 0 {
        return Err(PulseError::invalid_parameter("target_len must be > 0"));
    }
    if target_len == 1 {
        return Ok(vec![x[0]]);
    }

    let last = x.len() - 1;
    let scale = last as f64 / (target_len - 1) as f64;
    Ok((0..target_len)
        .map(|k| {
            let pos = k as f64 * scale;
            let i = pos.floor() as usize;
            if i >= last {
                x[last]
            } else {
                let frac = pos - i as f64;
                x[i] * (1.0 - frac) + x[i + 1] * frac
            }
        })
        .collect())
}

impl SeriesSet {
    /// Z-score every series and, if `target_len` is given, resample those
    /// whose length differs. Labels are kept.
    pub fn harmonized(&self, target_len: Option<usize>) -> Result<SeriesSet> {
        SeriesSet::from_series(
            self.iter()
                .map(|s| {
                    let mut values = zscore(&s.values)?;
                    if let Some(len) = target_len.filter(|&len| len != values.len()) {
                        values = resample_linear(&values, len)?;
                    }
                    Ok(Series {
                        id: s.id.clone(),
                        values,
                        label: s.label.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        )
    }
}
