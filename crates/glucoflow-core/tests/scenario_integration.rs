//! Integration tests for composing factors over a baseline and for the
//! editor-to-table pipeline.

use chrono::{DateTime, Duration, TimeZone, Utc};
use glucoflow_core::curve::activity;
use glucoflow_core::{
    BaselineSeries, CompositionModel, CurveEditor, CurveFactory, CurveParams, EditorLayout,
    Event, Factor, FactorKind, KindProfile,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

fn minutes(m: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(m)
}

#[test]
fn test_single_insulin_lowers_flat_baseline() {
    let baseline = BaselineSeries::flat(t0(), minutes(60), 5, 100.0).unwrap();
    let mut model = CompositionModel::new(baseline);

    let profile = KindProfile::insulin(CurveParams::new(15, 80, 300), 30.0).unwrap();
    let factor = Factor::analytic(&profile, t0(), 1.0).unwrap();
    model.add_factor(factor).unwrap();

    let total = model.total_series();
    assert_eq!(total.len(), 12);
    assert!(total.iter().all(|p| p.value <= 100.0));

    // Nothing acts before onset
    for p in total.iter().filter(|p| p.time < minutes(15)) {
        assert_eq!(p.value, 100.0);
    }

    let after_onset: Vec<f64> = total
        .iter()
        .filter(|p| p.time >= minutes(15))
        .map(|p| p.value)
        .collect();
    assert_eq!(after_onset.len(), 9);
    for pair in after_onset.windows(2) {
        assert!(pair[1] < pair[0], "not strictly decreasing: {pair:?}");
    }
}

#[test]
fn test_two_carb_intakes_stack() {
    let baseline = BaselineSeries::flat(t0(), minutes(240), 5, 100.0).unwrap();
    let mut model = CompositionModel::new(baseline);

    let profile = KindProfile::carbohydrate(CurveParams::new(0, 45, 180), 30.0, 10.0).unwrap();
    let first = Factor::analytic(&profile, t0(), 30.0).unwrap();
    let second = Factor::analytic(&profile, minutes(30), 20.0).unwrap();
    let (first_id, second_id) = (first.id(), second.id());
    model.add_factor(first).unwrap();
    model.add_factor(second).unwrap();

    assert_eq!(model.dependent_factors(first_id).unwrap(), vec![second_id]);
    assert!(model.dependent_factors(second_id).unwrap().is_empty());

    let lower = model.stacked_contribution(first_id).unwrap();
    let upper = model.stacked_contribution(second_id).unwrap();
    assert_eq!(lower.len(), upper.len());
    for (l, u) in lower.iter().zip(&upper) {
        assert_eq!(l.time, u.time);
        assert_eq!(u.bottom, l.top);
        assert!(u.top >= u.bottom);
    }
    assert!(lower.iter().all(|p| p.bottom == 0.0));
}

#[test]
fn test_insulin_does_not_stack_on_carbs() {
    let baseline = BaselineSeries::flat(t0(), minutes(240), 5, 100.0).unwrap();
    let mut model = CompositionModel::new(baseline);

    let carbs = KindProfile::carbohydrate(CurveParams::new(0, 45, 180), 30.0, 10.0).unwrap();
    let insulin = KindProfile::insulin(CurveParams::new(0, 75, 300), 30.0).unwrap();
    let meal = Factor::analytic(&carbs, t0(), 40.0).unwrap();
    let dose = Factor::analytic(&insulin, minutes(10), 2.0).unwrap();
    let (meal_id, dose_id) = (meal.id(), dose.id());
    model.add_factor(meal).unwrap();
    model.add_factor(dose).unwrap();

    assert!(model.dependent_factors(meal_id).unwrap().is_empty());
    let stacked = model.stacked_contribution(dose_id).unwrap();
    assert!(stacked.iter().all(|p| p.bottom == 0.0));
}

#[test]
fn test_drag_reports_dependents_to_redraw() {
    let baseline = BaselineSeries::flat(t0(), minutes(240), 5, 100.0).unwrap();
    let mut model = CompositionModel::new(baseline);
    let profile = KindProfile::insulin(CurveParams::new(0, 75, 300), 30.0).unwrap();
    let ids: Vec<_> = (0..3)
        .map(|i| {
            let f = Factor::analytic(&profile, minutes(20 * i), 1.0).unwrap();
            let id = f.id();
            model.add_factor(f).unwrap();
            id
        })
        .collect();

    let event = model.drag_factor_time(ids[0], Duration::minutes(15)).unwrap();
    match &event {
        Event::FactorTimeChanged {
            previous,
            current,
            dependents,
            ..
        } => {
            assert_eq!(*previous, t0());
            assert_eq!(*current, minutes(15));
            assert_eq!(dependents, &ids[1..].to_vec());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(event.stale_factors(), ids);

    let event = model.drag_factor_amount(ids[2], -5.0).unwrap();
    assert!(matches!(
        event,
        Event::FactorAmountChanged { current, ref dependents, .. }
            if current == 0.0 && dependents.is_empty()
    ));
}

#[test]
fn test_default_editor_curve_peaks_at_configured_minute() {
    let editor = CurveEditor::new(300, 80, EditorLayout::default()).unwrap();
    let exported = editor.export_curve();
    assert_eq!(exported.len(), 300);

    let table = CurveFactory::new().build_from_editor(exported);
    assert!(table.at(80) > table.at(0));
    assert!(table.at(80) > table.at(299));
    assert!(table.at(0).abs() < 1e-9);
    assert!(table.at(299).abs() < 1e-9);

    let argmax = table.argmax().unwrap();
    assert!(argmax.abs_diff(80) <= 1, "argmax was {argmax}");
}

#[test]
fn test_rejected_drag_leaves_editor_unchanged() {
    let mut editor = CurveEditor::new(300, 80, EditorLayout::default()).unwrap();
    let before = editor.points().to_vec();

    let too_close = editor.min_spacing() / 2.0;
    assert!(editor.drag(1, too_close, 50.0).is_err());
    assert!(editor.drag(1, editor.layout().width - too_close, 50.0).is_err());
    assert_eq!(editor.points(), before.as_slice());
}

#[test]
fn test_editor_table_drives_a_factor() {
    let mut editor = CurveEditor::new(180, 45, EditorLayout::default()).unwrap();
    editor.insert(300.0, 150.0).unwrap();
    let table = CurveFactory::new().build_from_editor(editor.export_curve());

    let profile = KindProfile::carbohydrate(CurveParams::new(0, 45, 180), 30.0, 10.0).unwrap();
    let factor = Factor::new(&profile, table, t0(), 10.0).unwrap();
    assert_eq!(factor.kind(), FactorKind::Carbohydrate);
    assert!(factor.activity_at(minutes(45)) > 0.0);
    assert_eq!(factor.activity_at(minutes(181)), 0.0);
}

#[test]
fn test_on_board_table_tracks_closed_form() {
    let factory = CurveFactory::new();
    let table = factory.build_analytic(300, 75).unwrap();
    let curve = activity::DecayCurve::new(300.0, 75.0).unwrap();

    for m in [0.0, 30.0, 75.0, 150.0, 240.0, 300.0] {
        let from_table = table.remaining_fraction(m);
        let closed = curve.on_board(m);
        assert!(
            (from_table - closed).abs() < 0.02,
            "m={m}: table {from_table} vs closed form {closed}"
        );
    }
}

#[test]
fn test_insulin_on_board_decays_to_zero() {
    let baseline = BaselineSeries::flat(t0(), minutes(360), 5, 100.0).unwrap();
    let mut model = CompositionModel::new(baseline);
    let profile = KindProfile::insulin(CurveParams::new(0, 75, 300), 30.0).unwrap();
    model
        .add_factor(Factor::analytic(&profile, minutes(10), 4.0).unwrap())
        .unwrap();

    assert_eq!(model.insulin_on_board(t0()), 0.0);
    assert!((model.insulin_on_board(minutes(10)) - 4.0).abs() < 1e-9);
    let midway = model.insulin_on_board(minutes(120));
    assert!(midway > 0.0 && midway < 4.0);
    assert_eq!(model.insulin_on_board(minutes(320)), 0.0);
}
