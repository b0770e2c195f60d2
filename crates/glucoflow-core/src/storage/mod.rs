mod config;

pub use config::{CarbsConfig, Config, CurveConfig, InsulinConfig, SamplingConfig};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/glucoflow[-dev]/` based on GLUCOFLOW_ENV.
///
/// Set GLUCOFLOW_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?.join(".config");

    let env = std::env::var("GLUCOFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("glucoflow-dev")
    } else {
        base_dir.join("glucoflow")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
