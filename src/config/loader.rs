use anyhow::{Context, Result};
use schemars::{Schema, schema_for};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::models::{Bounds, Config};

/// Configuration rejected by [`validate_config`].
///
/// A run never starts with an invalid configuration: random ranges with `min > max`
/// have no meaning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{field}` has min {min} greater than max {max}")]
    InvertedBounds {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("`{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    #[error("`target_package` must not be empty")]
    EmptyTarget,

    #[error("`launch.program` must not be empty")]
    EmptyProgram,
}

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_json::from_str(s).context("Failed to parse JSON config string into Config")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<Config> {
    let cfg: Config =
        serde_json::from_reader(reader).context("Failed to parse JSON config from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)
        .with_context(|| format!("Invalid config file {}", path_ref.display()))?;
    debug!(target: "autoswipe::config", "Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Config> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: Config = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)
        .with_context(|| format!("Invalid config file {}", path_ref.display()))?;
    debug!(target: "autoswipe::config", "Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for the Config model (for external validation or tooling).
pub fn generate_schema() -> Schema {
    schema_for!(Config)
}

/// Write the JSON Schema for the Config model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Check every bound and identifier the automation relies on.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.target_package.trim().is_empty() {
        return Err(ConfigError::EmptyTarget);
    }
    if let Some(launch) = &cfg.launch {
        if launch.program.trim().is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
    }

    let timing = &cfg.timing;
    check_non_negative_bounds("timing.swipe_interval_secs", timing.swipe_interval_secs)?;
    check_non_negative_bounds("timing.swipe_duration_ms", timing.swipe_duration_ms)?;

    let screen = &cfg.screen;
    check_bounds("screen.start_x", screen.start_x)?;
    check_bounds("screen.start_y", screen.start_y)?;
    check_bounds("screen.end_y", screen.end_y)?;
    if screen.end_x_jitter < 0 {
        return Err(ConfigError::Negative {
            field: "screen.end_x_jitter",
            value: screen.end_x_jitter,
        });
    }

    Ok(())
}

fn check_bounds(field: &'static str, bounds: Bounds) -> Result<(), ConfigError> {
    if bounds.is_ordered() {
        Ok(())
    } else {
        Err(ConfigError::InvertedBounds {
            field,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

fn check_non_negative_bounds(field: &'static str, bounds: Bounds) -> Result<(), ConfigError> {
    if bounds.min < 0 {
        return Err(ConfigError::Negative {
            field,
            value: bounds.min,
        });
    }
    check_bounds(field, bounds)
}
