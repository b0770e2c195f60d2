//! Composition of a baseline series with time-stamped factors.
//!
//! The model owns the baseline and an insertion-ordered list of factors.
//! Every query recomputes from scratch and returns owned data, so any
//! mutation (add, remove, time or amount change) is reflected by the next
//! query without cache invalidation.
//!
//! Insertion order matters for stacking only: a factor's stacked band sits
//! on top of every earlier factor of the same kind, and the same-kind factors
//! inserted after it are its dependents.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::factor::{Factor, FactorChange, FactorKind};
use crate::series::{BaselineSeries, SeriesPoint, StackedPoint};

#[derive(Debug, Clone)]
pub struct CompositionModel {
    baseline: BaselineSeries,
    factors: Vec<Factor>,
}

impl CompositionModel {
    pub fn new(baseline: BaselineSeries) -> Self {
        Self {
            baseline,
            factors: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Copy of the undisturbed baseline.
    pub fn baseline(&self) -> BaselineSeries {
        self.baseline.clone()
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn factor(&self, id: Uuid) -> Option<&Factor> {
        self.factors.iter().find(|f| f.id() == id)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.factors
            .iter()
            .position(|f| f.id() == id)
            .ok_or(CoreError::UnknownFactor(id))
    }

    /// Same-kind factors inserted before the one at `index`.
    fn earlier_same_kind(&self, index: usize) -> impl Iterator<Item = &Factor> + '_ {
        let kind = self.factors[index].kind();
        self.factors[..index].iter().filter(move |f| f.kind() == kind)
    }

    fn dependents_of(&self, index: usize) -> Vec<Uuid> {
        let kind = self.factors[index].kind();
        self.factors[index + 1..]
            .iter()
            .filter(|f| f.kind() == kind)
            .map(Factor::id)
            .collect()
    }

    /// Baseline with its own sample-to-sample deltas carried forward, plus
    /// every factor's signed contribution at each sample time.
    pub fn total_series(&self) -> Vec<SeriesPoint> {
        let base = self.baseline.samples();
        let mut result: Vec<SeriesPoint> = Vec::with_capacity(base.len());
        for (i, sample) in base.iter().enumerate() {
            let value = match result.last() {
                Some(previous) => previous.value + (sample.value - base[i - 1].value),
                None => sample.value,
            };
            result.push(SeriesPoint::new(sample.time, value));
        }

        for point in &mut result {
            let time = point.time;
            point.value += self
                .factors
                .iter()
                .map(|f| f.signed_activity_at(time))
                .sum::<f64>();
        }
        result
    }

    /// `(time, bottom, top)` band of one factor at every baseline sample.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFactor`] for an id the model does not own.
    pub fn stacked_contribution(&self, id: Uuid) -> Result<Vec<StackedPoint>> {
        let index = self.position(id)?;
        Ok(self
            .baseline
            .samples()
            .iter()
            .map(|sample| self.stacked_at(index, sample.time))
            .collect())
    }

    fn stacked_at(&self, index: usize, time: DateTime<Utc>) -> StackedPoint {
        let bottom: f64 = self
            .earlier_same_kind(index)
            .map(|f| f.activity_at(time))
            .sum();
        StackedPoint {
            time,
            bottom,
            top: bottom + self.factors[index].activity_at(time),
        }
    }

    /// Same-kind factors inserted after `id`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFactor`] for an id the model does not own.
    pub fn dependent_factors(&self, id: Uuid) -> Result<Vec<Uuid>> {
        let index = self.position(id)?;
        Ok(self.dependents_of(index))
    }

    /// Draggable amplitude handle: the factor's peak time and the stacked
    /// value there.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFactor`] for an id the model does not own.
    pub fn peak_handle(&self, id: Uuid) -> Result<SeriesPoint> {
        let index = self.position(id)?;
        let time = self.factors[index].peak_time();
        Ok(SeriesPoint::new(time, self.stacked_at(index, time).top))
    }

    /// The factor's own curve at the baseline's sampling interval.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFactor`] for an id the model does not own.
    pub fn factor_shape(&self, id: Uuid) -> Result<Vec<SeriesPoint>> {
        let index = self.position(id)?;
        Ok(self.factors[index].shape(self.baseline.sampling()))
    }

    /// Total amount of `kind` still acting at `time`. Factors that have not
    /// started yet do not count.
    pub fn on_board(&self, kind: FactorKind, time: DateTime<Utc>) -> f64 {
        self.factors
            .iter()
            .filter(|f| f.kind() == kind && f.time() <= time)
            .map(|f| f.on_board_at(time))
            .sum()
    }

    /// Units of insulin still acting at `time`.
    pub fn insulin_on_board(&self, time: DateTime<Utc>) -> f64 {
        self.on_board(FactorKind::Insulin, time)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a factor; it stacks on top of all earlier same-kind factors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateFactor`] if the id is already present.
    pub fn add_factor(&mut self, factor: Factor) -> Result<Event> {
        if self.factor(factor.id()).is_some() {
            return Err(CoreError::DuplicateFactor(factor.id()));
        }
        let event = Event::FactorAdded {
            id: factor.id(),
            kind: factor.kind(),
            index: self.factors.len(),
            time: factor.time(),
            amount: factor.amount(),
        };
        tracing::debug!(id = %factor.id(), kind = %factor.kind(), "factor added");
        self.factors.push(factor);
        Ok(event)
    }

    /// Remove a factor. Removing an absent id does nothing and returns `None`.
    pub fn remove_factor(&mut self, id: Uuid) -> Option<Event> {
        let index = self.factors.iter().position(|f| f.id() == id)?;
        let dependents = self.dependents_of(index);
        let factor = self.factors.remove(index);
        tracing::debug!(%id, kind = %factor.kind(), "factor removed");
        Some(Event::FactorRemoved {
            id,
            kind: factor.kind(),
            dependents,
        })
    }

    fn time_changed(
        &mut self,
        id: Uuid,
        change: impl FnOnce(&mut Factor) -> FactorChange<DateTime<Utc>>,
    ) -> Result<Event> {
        let index = self.position(id)?;
        let change = change(&mut self.factors[index]);
        tracing::debug!(
            %id,
            previous = %change.previous,
            current = %change.current,
            "factor time changed"
        );
        Ok(Event::FactorTimeChanged {
            id,
            previous: change.previous,
            current: change.current,
            dependents: self.dependents_of(index),
        })
    }

    fn amount_changed(
        &mut self,
        id: Uuid,
        change: impl FnOnce(&mut Factor) -> Result<FactorChange<f64>>,
    ) -> Result<Event> {
        let index = self.position(id)?;
        let change = change(&mut self.factors[index])?;
        tracing::debug!(
            %id,
            previous = change.previous,
            current = change.current,
            "factor amount changed"
        );
        Ok(Event::FactorAmountChanged {
            id,
            previous: change.previous,
            current: change.current,
            dependents: self.dependents_of(index),
        })
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFactor`] for an id the model does not own.
    pub fn set_factor_time(&mut self, id: Uuid, time: DateTime<Utc>) -> Result<Event> {
        self.time_changed(id, |f| f.set_time(time))
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFactor`] or a negative-amount
    /// [`crate::error::DomainError`]; the amount is unchanged on error.
    pub fn set_factor_amount(&mut self, id: Uuid, amount: f64) -> Result<Event> {
        self.amount_changed(id, |f| Ok(f.set_amount(amount)?))
    }

    /// Shift a factor's time by a pointer-drag delta.
    pub fn drag_factor_time(&mut self, id: Uuid, delta: Duration) -> Result<Event> {
        self.time_changed(id, |f| f.drag_time(delta))
    }

    /// Shift a factor's amount by a pointer-drag delta, stopping at zero.
    pub fn drag_factor_amount(&mut self, id: Uuid, delta: f64) -> Result<Event> {
        self.amount_changed(id, |f| Ok(f.drag_amount(delta)))
    }

    /// Move a factor back to the time it was created with.
    pub fn reset_factor_time(&mut self, id: Uuid) -> Result<Event> {
        self.time_changed(id, Factor::reset_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::{CurveParams, KindProfile};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn flat_model() -> CompositionModel {
        let baseline =
            BaselineSeries::flat(t0(), t0() + Duration::minutes(240), 5, 100.0).unwrap();
        CompositionModel::new(baseline)
    }

    fn insulin(offset_min: i64, units: f64) -> Factor {
        let profile = KindProfile::insulin(CurveParams::new(0, 75, 300), 30.0).unwrap();
        Factor::analytic(&profile, t0() + Duration::minutes(offset_min), units).unwrap()
    }

    fn carbs(offset_min: i64, grams: f64) -> Factor {
        let profile = KindProfile::carbohydrate(CurveParams::new(0, 45, 180), 30.0, 10.0).unwrap();
        Factor::analytic(&profile, t0() + Duration::minutes(offset_min), grams).unwrap()
    }

    #[test]
    fn empty_model_returns_baseline() {
        let model = flat_model();
        let total = model.total_series();
        assert_eq!(total.len(), 48);
        assert!(total.iter().all(|p| p.value == 100.0));
    }

    #[test]
    fn baseline_drift_is_carried_forward() {
        let samples = (0..4)
            .map(|i| SeriesPoint::new(t0() + Duration::minutes(5 * i), 100.0 + 2.0 * i as f64))
            .collect();
        let model = CompositionModel::new(BaselineSeries::from_samples(samples).unwrap());
        let values: Vec<f64> = model.total_series().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 102.0, 104.0, 106.0]);
    }

    #[test]
    fn insulin_lowers_and_carbs_raise() {
        let mut model = flat_model();
        let dose = insulin(0, 1.0);
        let at = dose.peak_time();
        model.add_factor(dose).unwrap();
        let total = model.total_series();
        let sample = total.iter().find(|p| p.time == at).unwrap();
        assert!(sample.value < 100.0);

        let mut model = flat_model();
        model.add_factor(carbs(0, 30.0)).unwrap();
        assert!(model.total_series().iter().any(|p| p.value > 100.0));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut model = flat_model();
        let dose = insulin(0, 1.0);
        let id = dose.id();
        model.add_factor(dose).unwrap();
        assert!(model.remove_factor(id).is_some());
        let once = model.total_series();
        assert!(model.remove_factor(id).is_none());
        assert_eq!(model.total_series(), once);
        assert!(model.is_empty());
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut model = flat_model();
        let dose = insulin(0, 1.0);
        model.add_factor(dose.clone()).unwrap();
        assert!(matches!(
            model.add_factor(dose),
            Err(CoreError::DuplicateFactor(_))
        ));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn dependents_are_later_same_kind_only() {
        let mut model = flat_model();
        let first = insulin(0, 1.0);
        let meal = carbs(10, 20.0);
        let second = insulin(30, 1.0);
        let (first_id, meal_id, second_id) = (first.id(), meal.id(), second.id());
        model.add_factor(first).unwrap();
        model.add_factor(meal).unwrap();
        model.add_factor(second).unwrap();

        assert_eq!(model.dependent_factors(first_id).unwrap(), vec![second_id]);
        assert!(model.dependent_factors(meal_id).unwrap().is_empty());
        assert!(model.dependent_factors(second_id).unwrap().is_empty());
    }

    #[test]
    fn stacked_band_ignores_other_kinds() {
        let mut model = flat_model();
        let meal = carbs(0, 20.0);
        let dose = insulin(0, 1.0);
        let dose_id = dose.id();
        model.add_factor(meal).unwrap();
        model.add_factor(dose).unwrap();
        let band = model.stacked_contribution(dose_id).unwrap();
        assert!(band.iter().all(|p| p.bottom == 0.0));
        assert!(band.iter().any(|p| p.top > 0.0));
    }

    #[test]
    fn peak_handle_includes_earlier_factors() {
        let mut model = flat_model();
        let first = insulin(0, 1.0);
        let second = insulin(0, 2.0);
        let (first_id, second_id) = (first.id(), second.id());
        let expected_time = first.peak_time();
        let lone = first.activity_at(expected_time);
        model.add_factor(first).unwrap();
        model.add_factor(second).unwrap();

        let handle = model.peak_handle(first_id).unwrap();
        assert_eq!(handle.time, expected_time);
        assert!((handle.value - lone).abs() < 1e-12);

        let handle = model.peak_handle(second_id).unwrap();
        assert!((handle.value - 3.0 * lone).abs() < 1e-9);
    }

    #[test]
    fn mutations_report_dependents() {
        let mut model = flat_model();
        let first = insulin(0, 1.0);
        let second = insulin(30, 1.0);
        let (first_id, second_id) = (first.id(), second.id());
        model.add_factor(first).unwrap();
        model.add_factor(second).unwrap();

        let event = model.drag_factor_time(first_id, Duration::minutes(10)).unwrap();
        assert_eq!(event.stale_factors(), vec![first_id, second_id]);
        assert_eq!(
            model.factor(first_id).unwrap().time(),
            t0() + Duration::minutes(10)
        );

        match model.set_factor_amount(first_id, 3.0).unwrap() {
            Event::FactorAmountChanged {
                previous, current, ..
            } => {
                assert_eq!(previous, 1.0);
                assert_eq!(current, 3.0);
            }
            other => panic!("unexpected event {other:?}"),
        }

        assert!(model.set_factor_amount(first_id, -1.0).is_err());
        assert_eq!(model.factor(first_id).unwrap().amount(), 3.0);

        model.reset_factor_time(first_id).unwrap();
        assert_eq!(model.factor(first_id).unwrap().time(), t0());
    }

    #[test]
    fn mutation_is_visible_in_next_query() {
        let mut model = flat_model();
        let dose = insulin(0, 1.0);
        let id = dose.id();
        model.add_factor(dose).unwrap();
        let before = model.total_series();
        model.set_factor_amount(id, 2.0).unwrap();
        let after = model.total_series();
        let idx = 15;
        let drop_before = 100.0 - before[idx].value;
        let drop_after = 100.0 - after[idx].value;
        assert!((drop_after - 2.0 * drop_before).abs() < 1e-9);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let model = flat_model();
        let id = Uuid::new_v4();
        assert!(matches!(
            model.stacked_contribution(id),
            Err(CoreError::UnknownFactor(_))
        ));
        assert!(model.peak_handle(id).is_err());
        assert!(model.dependent_factors(id).is_err());
        assert!(model.factor_shape(id).is_err());
    }

    #[test]
    fn insulin_on_board_decays() {
        let mut model = flat_model();
        model.add_factor(insulin(0, 2.0)).unwrap();
        assert_eq!(model.insulin_on_board(t0() - Duration::minutes(1)), 0.0);
        assert!((model.insulin_on_board(t0()) - 2.0).abs() < 1e-9);
        let later = model.insulin_on_board(t0() + Duration::minutes(120));
        assert!(later > 0.0 && later < 2.0);
        assert_eq!(model.insulin_on_board(t0() + Duration::minutes(400)), 0.0);
    }
}
