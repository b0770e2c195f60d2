use clap::{Subcommand, ValueEnum};
use glucoflow_core::{Config, Interpolation, Normalization};

#[derive(Clone, Copy, ValueEnum)]
pub enum NormalizeArg {
    AsIs,
    UnitArea,
    UnitPeak,
}

impl From<NormalizeArg> for Normalization {
    fn from(arg: NormalizeArg) -> Self {
        match arg {
            NormalizeArg::AsIs => Normalization::AsIs,
            NormalizeArg::UnitArea => Normalization::UnitArea,
            NormalizeArg::UnitPeak => Normalization::UnitPeak,
        }
    }
}

#[derive(Subcommand)]
pub enum CurveAction {
    /// Print the analytic activity table as JSON
    Analytic {
        /// Total active minutes
        #[arg(long)]
        duration: u32,
        /// Minute of maximal activity
        #[arg(long)]
        peak: u32,
        /// Table normalization (defaults to the configured one)
        #[arg(long, value_enum)]
        normalize: Option<NormalizeArg>,
    },
    /// Print the export of an editor curve as JSON
    Editor {
        #[arg(long)]
        duration: u32,
        #[arg(long)]
        peak: u32,
        /// Extra control point in box coordinates, e.g. "300:150"
        #[arg(long = "point", value_parser = parse_point)]
        points: Vec<(f64, f64)>,
        /// Sample a Catmull-Rom curve instead of the monotone one
        #[arg(long)]
        catmull_rom: bool,
    },
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(':')
        .ok_or_else(|| format!("expected X:Y, got '{s}'"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok((x, y))
}

pub fn run(action: CurveAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        CurveAction::Analytic {
            duration,
            peak,
            normalize,
        } => {
            let mut factory = config.curve_factory();
            if let Some(normalize) = normalize {
                factory = factory.with_normalization(normalize.into());
            }
            let table = factory.build_analytic(duration, peak)?;
            println!("{}", serde_json::to_string_pretty(table.values())?);
        }
        CurveAction::Editor {
            duration,
            peak,
            points,
            catmull_rom,
        } => {
            let mut editor = config.curve_editor(duration, peak)?;
            if catmull_rom {
                editor = editor.with_interpolation(Interpolation::CatmullRom);
            }
            for (x, y) in points {
                editor.insert(x, y)?;
            }
            let table = config.curve_factory().build_from_editor(editor.export_curve());
            println!("{}", serde_json::to_string_pretty(table.values())?);
        }
    }
    Ok(())
}
