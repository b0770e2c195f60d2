//! Per-minute activity lookup table.

use serde::{Deserialize, Serialize};

/// Discretized activity curve, one entry per whole minute since onset.
///
/// Lookups past the last entry read as zero, so analytic tables
/// (`duration + 1` entries) and editor exports (`duration` entries) share
/// the same consumption contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTable {
    values: Vec<f64>,
}

impl ActivityTable {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Value at a whole minute, 0 past the end.
    pub fn at(&self, minute: usize) -> f64 {
        self.values.get(minute).copied().unwrap_or(0.0)
    }

    /// Value at the nearest whole minute. Negative minutes read 0.
    pub fn at_rounded(&self, minutes: f64) -> f64 {
        if minutes < 0.0 || !minutes.is_finite() {
            return 0.0;
        }
        self.at(minutes.round() as usize)
    }

    /// Index of the largest entry (first one on ties).
    pub fn argmax(&self) -> Option<usize> {
        self.values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| i)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Sum of all entries, i.e. the area under the curve in minute steps.
    pub fn area(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Share of the area still ahead `minutes` after onset: 1 at or before
    /// onset, 0 once the table is exhausted.
    pub fn remaining_fraction(&self, minutes: f64) -> f64 {
        let area = self.area();
        if area <= 0.0 || minutes.is_nan() {
            return 0.0;
        }
        if minutes <= 0.0 {
            return 1.0;
        }
        let elapsed = minutes.floor() as usize;
        if elapsed >= self.values.len() {
            return 0.0;
        }
        let done: f64 = self.values[..elapsed].iter().sum();
        ((area - done) / area).clamp(0.0, 1.0)
    }

    /// Rescale every entry by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        for v in &mut self.values {
            *v *= factor;
        }
        self
    }
}
