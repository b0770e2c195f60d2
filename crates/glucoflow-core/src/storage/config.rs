//! TOML-based application configuration.
//!
//! Stores the tuning values of the composition engine:
//! - Baseline sampling interval
//! - Insulin and carbohydrate curve timing and unit scales
//! - Curve editor geometry and sampler limits
//!
//! Configuration is stored at `~/.config/glucoflow/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::curve::{CurveFactory, Normalization};
use crate::editor::{CurveEditor, EditorLayout, Interpolation, Sampler};
use crate::error::{ConfigError, DomainError, Result};
use crate::factor::{CurveParams, KindProfile};
use crate::series::DEFAULT_SAMPLING_MINUTES;

/// Baseline sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,
}

/// Insulin curve and sensitivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsulinConfig {
    /// Insulin sensitivity factor: series units per unit of insulin.
    #[serde(default = "default_isf")]
    pub isf: f64,
    #[serde(default)]
    pub onset: u32,
    #[serde(default = "default_insulin_peak")]
    pub peak: u32,
    #[serde(default = "default_insulin_duration")]
    pub duration: u32,
}

/// Carbohydrate curve and ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbsConfig {
    /// Grams of carbohydrate covered by one unit of insulin.
    #[serde(default = "default_carb_ratio")]
    pub carb_ratio: f64,
    #[serde(default)]
    pub onset: u32,
    #[serde(default = "default_carbs_peak")]
    pub peak: u32,
    #[serde(default = "default_carbs_duration")]
    pub duration: u32,
}

/// Curve table settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurveConfig {
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub interpolation: Interpolation,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/glucoflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub insulin: InsulinConfig,
    #[serde(default)]
    pub carbs: CarbsConfig,
    #[serde(default)]
    pub curve: CurveConfig,
    #[serde(default)]
    pub editor: EditorLayout,
    #[serde(default)]
    pub sampler: Sampler,
}

// Default functions
fn default_interval_minutes() -> i64 {
    DEFAULT_SAMPLING_MINUTES
}
fn default_isf() -> f64 {
    30.0
}
fn default_insulin_peak() -> u32 {
    75
}
fn default_insulin_duration() -> u32 {
    300
}
fn default_carb_ratio() -> f64 {
    10.0
}
fn default_carbs_peak() -> u32 {
    45
}
fn default_carbs_duration() -> u32 {
    180
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

impl Default for InsulinConfig {
    fn default() -> Self {
        Self {
            isf: default_isf(),
            onset: 0,
            peak: default_insulin_peak(),
            duration: default_insulin_duration(),
        }
    }
}

impl Default for CarbsConfig {
    fn default() -> Self {
        Self {
            carb_ratio: default_carb_ratio(),
            onset: 0,
            peak: default_carbs_peak(),
            duration: default_carbs_duration(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Read a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadFailed`] when the file cannot be read or
    /// parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        Ok(cfg)
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SaveFailed`] on serialization or IO failure.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("falling back to default config: {e}");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    // ── Domain builders ──────────────────────────────────────────────

    pub fn insulin_profile(&self) -> Result<KindProfile, DomainError> {
        let i = &self.insulin;
        KindProfile::insulin(CurveParams::new(i.onset, i.peak, i.duration), i.isf)
    }

    /// Carbohydrate profile scaled by `isf / carb_ratio`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveRatio`] when the configured ratio is
    /// zero, negative or not finite.
    pub fn carb_profile(&self) -> Result<KindProfile, DomainError> {
        let c = &self.carbs;
        KindProfile::carbohydrate(
            CurveParams::new(c.onset, c.peak, c.duration),
            self.insulin.isf,
            c.carb_ratio,
        )
    }

    pub fn sampler(&self) -> Sampler {
        self.sampler
    }

    pub fn curve_factory(&self) -> CurveFactory {
        CurveFactory::new().with_normalization(self.curve.normalization)
    }

    /// Open an editor session with the configured layout, interpolation and
    /// sampler.
    ///
    /// # Errors
    ///
    /// See [`CurveEditor::new`].
    pub fn curve_editor(&self, duration: u32, peak: u32) -> Result<CurveEditor, DomainError> {
        Ok(CurveEditor::new(duration, peak, self.editor)?
            .with_interpolation(self.curve.interpolation)
            .with_sampler(self.sampler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.sampling.interval_minutes, 5);
        assert_eq!(parsed.insulin.peak, 75);
        assert_eq!(parsed.sampler.max_iterations, 50);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[insulin]\nisf = 45.0\n").unwrap();
        assert_eq!(parsed.insulin.isf, 45.0);
        assert_eq!(parsed.insulin.duration, 300);
        assert_eq!(parsed.carbs.carb_ratio, 10.0);
        assert_eq!(parsed.editor.width, 600.0);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("insulin.peak").as_deref(), Some("75"));
        assert_eq!(cfg.get("curve.interpolation").as_deref(), Some("monotone_x"));
        assert!(cfg.get("insulin.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("carbs.carb_ratio", "12.5").unwrap();
        assert_eq!(cfg.carbs.carb_ratio, 12.5);
        cfg.apply("insulin.peak", "60").unwrap();
        assert_eq!(cfg.insulin.peak, 60);
    }

    #[test]
    fn apply_updates_enum_string() {
        let mut cfg = Config::default();
        cfg.apply("curve.normalization", "unit_peak").unwrap();
        assert_eq!(cfg.curve.normalization, Normalization::UnitPeak);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_value() {
        let mut cfg = Config::default();
        assert!(cfg.apply("insulin.nonexistent", "1").is_err());
        assert!(cfg.apply("insulin.peak", "soon").is_err());
        assert!(cfg.apply("curve.normalization", "sideways").is_err());
        assert_eq!(cfg.insulin.peak, 75);
        assert_eq!(cfg.curve.normalization, Normalization::AsIs);
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.insulin.isf = 42.0;
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.insulin.isf, 42.0);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[insulin\nisf = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::error::CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }

    #[test]
    fn profiles_follow_config() {
        let cfg = Config::default();
        let insulin = cfg.insulin_profile().unwrap();
        assert_eq!(insulin.scale, 30.0);
        assert_eq!(insulin.params.duration, 300);
        let carbs = cfg.carb_profile().unwrap();
        assert_eq!(carbs.scale, 3.0);
        assert_eq!(carbs.params.peak, 45);
    }

    #[test]
    fn zero_carb_ratio_has_no_profile() {
        let mut cfg = Config::default();
        cfg.apply("carbs.carb_ratio", "0").unwrap();
        assert!(matches!(
            cfg.carb_profile(),
            Err(DomainError::NonPositiveRatio(r)) if r == 0.0
        ));
        assert!(cfg.insulin_profile().is_ok());
    }

    #[test]
    fn editor_uses_configured_layout() {
        let mut cfg = Config::default();
        cfg.editor.width = 300.0;
        let editor = cfg.curve_editor(300, 80).unwrap();
        assert_eq!(editor.min_spacing(), 5.0);
        assert!(cfg.curve_editor(300, 300).is_err());
    }

    #[test]
    fn negative_editor_height_is_refused() {
        let mut cfg = Config::default();
        cfg.apply("editor.height", "-5").unwrap();
        assert!(matches!(
            cfg.curve_editor(300, 80),
            Err(DomainError::InvalidLayout { ref field, .. }) if field == "height"
        ));
    }
}
