use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Variant tag of a factor. Factors stack only with factors of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FactorKind {
    Insulin,
    Carbohydrate,
}

impl FactorKind {
    /// Direction of the factor's effect on the total series.
    pub fn sign(self) -> f64 {
        match self {
            Self::Insulin => -1.0,
            Self::Carbohydrate => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Insulin => "insulin",
            Self::Carbohydrate => "carbohydrate",
        }
    }
}

impl std::fmt::Display for FactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Timing of an activity curve, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveParams {
    /// Delay between the factor's time and the start of activity.
    pub onset: u32,
    /// Minutes after onset at which activity is maximal.
    pub peak: u32,
    /// Minutes of activity after onset.
    pub duration: u32,
}

impl CurveParams {
    pub fn new(onset: u32, peak: u32, duration: u32) -> Self {
        Self {
            onset,
            peak,
            duration,
        }
    }
}

/// Insulin presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsulinType {
    Rapid,
    UltraRapid,
}

impl InsulinType {
    pub fn params(self) -> CurveParams {
        match self {
            Self::Rapid => CurveParams::new(0, 90, 300),
            Self::UltraRapid => CurveParams::new(0, 55, 300),
        }
    }
}

/// Defaults for building factors of one kind.
///
/// `scale` converts raw curve amplitude into the series' unit, e.g. the
/// insulin sensitivity factor for insulin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindProfile {
    pub kind: FactorKind,
    pub params: CurveParams,
    pub scale: f64,
}

impl KindProfile {
    pub fn new(kind: FactorKind, params: CurveParams, scale: f64) -> Self {
        Self {
            kind,
            params,
            scale,
        }
    }

    /// Insulin profile scaled by the insulin sensitivity factor.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonFiniteScale`] for a NaN or infinite `isf`.
    pub fn insulin(params: CurveParams, isf: f64) -> Result<Self, DomainError> {
        Ok(Self::new(FactorKind::Insulin, params, finite_scale(isf)?))
    }

    /// Carbohydrate profile: one gram raises the series by `isf / carb_ratio`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveRatio`] unless `carb_ratio` is a
    /// positive finite number, and [`DomainError::NonFiniteScale`] for a
    /// non-finite `isf`.
    pub fn carbohydrate(
        params: CurveParams,
        isf: f64,
        carb_ratio: f64,
    ) -> Result<Self, DomainError> {
        if !(carb_ratio.is_finite() && carb_ratio > 0.0) {
            return Err(DomainError::NonPositiveRatio(carb_ratio));
        }
        let scale = finite_scale(isf)? / carb_ratio;
        Ok(Self::new(FactorKind::Carbohydrate, params, finite_scale(scale)?))
    }

    pub fn with_params(mut self, params: CurveParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

fn finite_scale(scale: f64) -> Result<f64, DomainError> {
    if !scale.is_finite() {
        return Err(DomainError::NonFiniteScale(scale));
    }
    Ok(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carbohydrate_scale_is_isf_per_ratio() {
        let profile = KindProfile::carbohydrate(CurveParams::new(0, 45, 180), 30.0, 10.0).unwrap();
        assert_eq!(profile.scale, 3.0);
        assert_eq!(profile.kind, FactorKind::Carbohydrate);
    }

    #[test]
    fn carbohydrate_rejects_unusable_ratio() {
        let params = CurveParams::new(0, 45, 180);
        for ratio in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                KindProfile::carbohydrate(params, 30.0, ratio),
                Err(DomainError::NonPositiveRatio(_))
            ));
        }
    }

    #[test]
    fn non_finite_isf_is_rejected() {
        let params = CurveParams::new(0, 75, 300);
        assert!(matches!(
            KindProfile::insulin(params, f64::NAN),
            Err(DomainError::NonFiniteScale(_))
        ));
        assert!(matches!(
            KindProfile::carbohydrate(params, f64::INFINITY, 10.0),
            Err(DomainError::NonFiniteScale(_))
        ));
        assert!(KindProfile::insulin(params, 30.0).is_ok());
    }
}
