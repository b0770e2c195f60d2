//! Activity curves: the analytic decay model, per-minute tables and the
//! factory that builds tables from either source.

pub mod activity;
mod factory;
mod table;

pub use activity::DecayCurve;
pub use factory::{CurveFactory, Normalization};
pub use table::ActivityTable;
