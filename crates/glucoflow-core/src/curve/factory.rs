//! Builds [`ActivityTable`]s from the analytic model or from an editor export.

use serde::{Deserialize, Serialize};

use super::activity::DecayCurve;
use super::table::ActivityTable;
use crate::error::DomainError;

/// How a freshly built table is rescaled before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Keep the values as produced.
    #[default]
    AsIs,
    /// Rescale so entries sum to one.
    UnitArea,
    /// Rescale so the largest entry is one.
    UnitPeak,
}

impl Normalization {
    fn apply(self, table: ActivityTable) -> ActivityTable {
        let reference = match self {
            Self::AsIs => return table,
            Self::UnitArea => table.area(),
            Self::UnitPeak => table.max(),
        };
        if reference > 0.0 {
            table.scaled(1.0 / reference)
        } else {
            table
        }
    }
}

/// Table builder shared by both curve sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveFactory {
    normalization: Normalization,
}

impl CurveFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Sample the analytic model at every whole minute `0..=duration`.
    ///
    /// # Errors
    ///
    /// Propagates the [`DomainError`] of undefined decay constants.
    pub fn build_analytic(&self, duration: u32, peak: u32) -> Result<ActivityTable, DomainError> {
        let curve = DecayCurve::new(duration as f64, peak as f64)?;
        let values = (0..=duration).map(|m| curve.activity(m as f64)).collect();
        Ok(self.normalization.apply(ActivityTable::new(values)))
    }

    /// Wrap the per-minute samples exported by a curve editor.
    pub fn build_from_editor(&self, samples: Vec<f64>) -> ActivityTable {
        self.normalization.apply(ActivityTable::new(samples))
    }
}
