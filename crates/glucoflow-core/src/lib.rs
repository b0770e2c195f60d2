//! # Glucoflow Core Library
//!
//! This library composes a baseline glucose-like time series with the
//! time-shifted activity curves of discrete factors (insulin doses and
//! carbohydrate intakes). All operations are available through the
//! standalone CLI binary; any interactive front end is a thin layer over
//! the same core library.
//!
//! ## Architecture
//!
//! - **Curves**: Closed-form decay model and per-minute activity tables
//! - **Editor**: Control-point curve editor with monotone interpolation
//! - **Factors**: Timed, scaled curve instances of a given kind
//! - **Model**: Baseline plus factors, with total and stacked views
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CompositionModel`]: Factor registry and series composition
//! - [`CurveFactory`]: Builds [`ActivityTable`]s from the model or the editor
//! - [`CurveEditor`]: Interactive curve shaping
//! - [`Config`]: Application configuration management

pub mod curve;
pub mod editor;
pub mod factor;
pub mod model;
pub mod series;
pub mod storage;
pub mod events;
pub mod error;

pub use curve::{ActivityTable, CurveFactory, DecayCurve, Normalization};
pub use editor::{CurveEditor, EditorLayout, Interpolation, Sampler};
pub use factor::{CurveParams, Factor, FactorChange, FactorKind, InsulinType, KindProfile};
pub use model::CompositionModel;
pub use series::{BaselineSeries, SeriesPoint, StackedPoint};
pub use storage::Config;
pub use events::Event;
pub use error::{ConfigError, CoreError, DomainError, InvariantViolation, ValidationError};
