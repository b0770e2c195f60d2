use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use glucoflow_core::series::parse_clock;
use glucoflow_core::{
    BaselineSeries, CompositionModel, Config, Factor, FactorKind, KindProfile, SeriesPoint,
    StackedPoint, ValidationError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Args)]
pub struct SimulateArgs {
    /// JSON baseline file: {"date": "YYYY-MM-DD", "samples": [["HH:MM:SS", value], ...]}
    #[arg(long, conflicts_with_all = ["flat", "minutes"])]
    baseline: Option<PathBuf>,
    /// Constant baseline value
    #[arg(long, default_value_t = 100.0)]
    flat: f64,
    /// Length of the constant baseline
    #[arg(long, default_value_t = 360)]
    minutes: i64,
    /// Start of the constant baseline
    #[arg(long, default_value = "08:00", value_parser = parse_clock_arg)]
    start: NaiveTime,
    /// Reference date for clock times (defaults to today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Insulin dose, e.g. "08:30=2.5"
    #[arg(long = "insulin", value_parser = parse_entry)]
    insulin: Vec<(NaiveTime, f64)>,
    /// Carbohydrate intake in grams, e.g. "08:15=45"
    #[arg(long = "carbs", value_parser = parse_entry)]
    carbs: Vec<(NaiveTime, f64)>,
    /// Print every factor's stacked band along with the total
    #[arg(long)]
    stacked: bool,
}

#[derive(Deserialize)]
struct BaselineFile {
    date: NaiveDate,
    samples: Vec<(String, f64)>,
}

#[derive(Serialize)]
struct FactorReport {
    id: Uuid,
    kind: FactorKind,
    time: DateTime<Utc>,
    amount: f64,
    peak: SeriesPoint,
    stacked: Vec<StackedPoint>,
}

#[derive(Serialize)]
struct StackedReport {
    total: Vec<SeriesPoint>,
    factors: Vec<FactorReport>,
}

fn parse_clock_arg(s: &str) -> Result<NaiveTime, String> {
    parse_clock(s).map_err(|e| e.to_string())
}

fn parse_entry(s: &str) -> Result<(NaiveTime, f64), String> {
    let (clock, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected HH:MM=AMOUNT, got '{s}'"))?;
    let time = parse_clock_arg(clock)?;
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad amount '{amount}': {e}"))?;
    Ok((time, amount))
}

fn load_baseline(
    args: &SimulateArgs,
    date: NaiveDate,
    config: &Config,
) -> Result<(BaselineSeries, NaiveDate), Box<dyn std::error::Error>> {
    match &args.baseline {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let file: BaselineFile = serde_json::from_str(&content)?;
            let series = BaselineSeries::from_clock_samples(file.date, &file.samples)?;
            Ok((series, file.date))
        }
        None => {
            let from = date.and_time(args.start).and_utc();
            let to = Duration::try_minutes(args.minutes)
                .and_then(|span| from.checked_add_signed(span))
                .ok_or_else(|| ValidationError::InvalidValue {
                    field: "minutes".into(),
                    message: format!("{} minutes from {from} is out of range", args.minutes),
                })?;
            let series =
                BaselineSeries::flat(from, to, config.sampling.interval_minutes, args.flat)?;
            Ok((series, date))
        }
    }
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let (baseline, date) = load_baseline(&args, date, &config)?;
    tracing::debug!(
        samples = baseline.len(),
        sampling_minutes = baseline.sampling_minutes(),
        "baseline loaded"
    );

    let mut model = CompositionModel::new(baseline);
    let entries: [(KindProfile, &[(NaiveTime, f64)]); 2] = [
        (config.insulin_profile()?, args.insulin.as_slice()),
        (config.carb_profile()?, args.carbs.as_slice()),
    ];
    let factory = config.curve_factory();
    for (profile, doses) in entries {
        let table = factory.build_analytic(profile.params.duration, profile.params.peak)?;
        for &(clock, amount) in doses {
            let time = date.and_time(clock).and_utc();
            let factor = Factor::new(&profile, table.clone(), time, amount)?;
            model.add_factor(factor)?;
        }
    }

    if !args.stacked {
        println!("{}", serde_json::to_string_pretty(&model.total_series())?);
        return Ok(());
    }

    let factors = model
        .factors()
        .iter()
        .map(|f| -> Result<FactorReport, Box<dyn std::error::Error>> {
            Ok(FactorReport {
                id: f.id(),
                kind: f.kind(),
                time: f.time(),
                amount: f.amount(),
                peak: model.peak_handle(f.id())?,
                stacked: model.stacked_contribution(f.id())?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let report = StackedReport {
        total: model.total_series(),
        factors,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
