//! Time-stamped, amount-scaled activity curves.
//!
//! A [`Factor`] places an [`ActivityTable`] at an absolute time and scales it
//! by an amount (units of insulin, grams of carbohydrate) and by its kind's
//! conversion factor. Whether the table came from the analytic model or from
//! the curve editor makes no difference here.

mod kind;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use kind::{CurveParams, FactorKind, InsulinType, KindProfile};

use crate::curve::{ActivityTable, CurveFactory};
use crate::error::DomainError;
use crate::series::SeriesPoint;

/// Previous and current value of a mutated field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorChange<T> {
    pub previous: T,
    pub current: T,
}

impl<T: PartialEq> FactorChange<T> {
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }
}

/// One insulin dose or carbohydrate intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    id: Uuid,
    kind: FactorKind,
    params: CurveParams,
    time: DateTime<Utc>,
    /// Time the factor was created with.
    default_time: DateTime<Utc>,
    amount: f64,
    scale: f64,
    table: ActivityTable,
}

fn check_amount(amount: f64) -> Result<f64, DomainError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(DomainError::NegativeAmount(amount));
    }
    Ok(amount)
}

impl Factor {
    /// Create a factor with an explicit table.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NegativeAmount`] for a negative or non-finite
    /// amount.
    pub fn new(
        profile: &KindProfile,
        table: ActivityTable,
        time: DateTime<Utc>,
        amount: f64,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            kind: profile.kind,
            params: profile.params,
            time,
            default_time: time,
            amount: check_amount(amount)?,
            scale: profile.scale,
            table,
        })
    }

    /// Create a factor whose table samples the analytic model for the
    /// profile's `(duration, peak)`.
    ///
    /// # Errors
    ///
    /// Propagates undefined decay constants and negative amounts.
    pub fn analytic(
        profile: &KindProfile,
        time: DateTime<Utc>,
        amount: f64,
    ) -> Result<Self, DomainError> {
        let table = CurveFactory::new().build_analytic(profile.params.duration, profile.params.peak)?;
        Self::new(profile, table, time, amount)
    }

    /// Insulin dose with preset timing.
    pub fn insulin(
        insulin_type: InsulinType,
        isf: f64,
        time: DateTime<Utc>,
        units: f64,
    ) -> Result<Self, DomainError> {
        Self::analytic(&KindProfile::insulin(insulin_type.params(), isf)?, time, units)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> FactorKind {
        self.kind
    }

    pub fn params(&self) -> CurveParams {
        self.params
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn default_time(&self) -> DateTime<Utc> {
        self.default_time
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn table(&self) -> &ActivityTable {
        &self.table
    }

    /// Minutes since onset at `t`; negative before onset.
    pub fn minutes_since_onset(&self, t: DateTime<Utc>) -> f64 {
        (t - self.time).num_milliseconds() as f64 / 60_000.0 - self.params.onset as f64
    }

    /// Time at which activity ends.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.time + Duration::minutes(i64::from(self.params.onset + self.params.duration))
    }

    /// Time of maximal activity.
    pub fn peak_time(&self) -> DateTime<Utc> {
        self.time + Duration::minutes(i64::from(self.params.onset + self.params.peak))
    }

    /// Unsigned contribution at `t`; 0 outside `[onset, onset + duration]`.
    pub fn activity_at(&self, t: DateTime<Utc>) -> f64 {
        let m = self.minutes_since_onset(t);
        if m < 0.0 || m > self.params.duration as f64 {
            return 0.0;
        }
        self.table.at_rounded(m) * self.amount * self.scale
    }

    /// Contribution at `t` with the kind's sign applied.
    pub fn signed_activity_at(&self, t: DateTime<Utc>) -> f64 {
        self.kind.sign() * self.activity_at(t)
    }

    /// Amount still to act at `t`, from the table's remaining area.
    pub fn on_board_at(&self, t: DateTime<Utc>) -> f64 {
        self.amount * self.table.remaining_fraction(self.minutes_since_onset(t))
    }

    /// The factor's own curve sampled every `sampling` from its time until
    /// activity ends.
    pub fn shape(&self, sampling: Duration) -> Vec<SeriesPoint> {
        let step = sampling.num_minutes().max(1);
        let end = i64::from(self.params.onset + self.params.duration);
        (0..)
            .map(|k| k * step)
            .take_while(|&m| m < end)
            .map(|m| {
                let time = self.time + Duration::minutes(m);
                SeriesPoint::new(time, self.activity_at(time))
            })
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_time(&mut self, time: DateTime<Utc>) -> FactorChange<DateTime<Utc>> {
        let previous = std::mem::replace(&mut self.time, time);
        FactorChange {
            previous,
            current: time,
        }
    }

    /// # Errors
    ///
    /// Returns [`DomainError::NegativeAmount`] and keeps the old amount.
    pub fn set_amount(&mut self, amount: f64) -> Result<FactorChange<f64>, DomainError> {
        let amount = check_amount(amount)?;
        let previous = std::mem::replace(&mut self.amount, amount);
        Ok(FactorChange {
            previous,
            current: amount,
        })
    }

    /// Shift the time by a pointer-drag delta.
    pub fn drag_time(&mut self, delta: Duration) -> FactorChange<DateTime<Utc>> {
        self.set_time(self.time + delta)
    }

    /// Shift the amount by a pointer-drag delta, stopping at zero.
    pub fn drag_amount(&mut self, delta: f64) -> FactorChange<f64> {
        let current = (self.amount + delta).max(0.0);
        let previous = std::mem::replace(&mut self.amount, current);
        FactorChange { previous, current }
    }

    pub fn reset_time(&mut self) -> FactorChange<DateTime<Utc>> {
        self.set_time(self.default_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn insulin() -> Factor {
        let profile = KindProfile::insulin(CurveParams::new(15, 80, 300), 30.0).unwrap();
        Factor::analytic(&profile, t0(), 2.0).unwrap()
    }

    #[test]
    fn zero_before_onset_and_after_duration() {
        let f = insulin();
        assert_eq!(f.activity_at(t0() - Duration::minutes(5)), 0.0);
        assert_eq!(f.activity_at(t0() + Duration::minutes(10)), 0.0);
        assert_eq!(f.activity_at(t0() + Duration::minutes(316)), 0.0);
        assert!(f.activity_at(t0() + Duration::minutes(95)) > 0.0);
    }

    #[test]
    fn activity_scales_with_amount_and_sign() {
        let mut f = insulin();
        let at = t0() + Duration::minutes(95);
        let double = f.activity_at(at);
        f.set_amount(1.0).unwrap();
        assert!((f.activity_at(at) * 2.0 - double).abs() < 1e-12);
        assert_eq!(f.signed_activity_at(at), -f.activity_at(at));
    }

    #[test]
    fn negative_amount_is_a_domain_error() {
        let profile = KindProfile::insulin(CurveParams::new(0, 75, 300), 30.0).unwrap();
        assert!(matches!(
            Factor::analytic(&profile, t0(), -1.0),
            Err(DomainError::NegativeAmount(_))
        ));
        let mut f = insulin();
        assert!(f.set_amount(-0.5).is_err());
        assert_eq!(f.amount(), 2.0);
    }

    #[test]
    fn infinite_amount_is_a_domain_error() {
        let profile = KindProfile::insulin(CurveParams::new(0, 75, 300), 30.0).unwrap();
        assert!(matches!(
            Factor::analytic(&profile, t0(), f64::INFINITY),
            Err(DomainError::NegativeAmount(a)) if a.is_infinite()
        ));
        let mut f = insulin();
        assert!(f.set_amount(f64::NAN).is_err());
        assert!(f.set_amount(f64::INFINITY).is_err());
        assert_eq!(f.amount(), 2.0);
    }

    #[test]
    fn drag_amount_clamps_at_zero() {
        let mut f = insulin();
        let change = f.drag_amount(-5.0);
        assert_eq!(change.previous, 2.0);
        assert_eq!(change.current, 0.0);
        assert_eq!(f.amount(), 0.0);
    }

    #[test]
    fn time_changes_report_previous_value() {
        let mut f = insulin();
        let change = f.drag_time(Duration::minutes(30));
        assert_eq!(change.previous, t0());
        assert_eq!(f.time(), t0() + Duration::minutes(30));
        let change = f.reset_time();
        assert_eq!(change.current, t0());
        assert!(f.reset_time().is_noop());
    }

    #[test]
    fn shape_covers_onset_plus_duration() {
        let f = insulin();
        let shape = f.shape(Duration::minutes(5));
        assert_eq!(shape.len(), 63);
        assert_eq!(shape[0].time, t0());
        assert_eq!(shape[0].value, 0.0);
    }

    #[test]
    fn kinds_compare_by_value() {
        let a = insulin();
        let b = insulin();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.kind(), b.kind());
        assert_eq!(FactorKind::Insulin.sign(), -1.0);
        assert_eq!(FactorKind::Carbohydrate.sign(), 1.0);
    }
}
