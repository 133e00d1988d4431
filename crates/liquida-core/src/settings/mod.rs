pub mod builtin;

use crate::error::LiquidaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Geometric tolerances for the table detector.
///
/// A flat key-value map handed to the detector unmodified. Only the keys
/// listed in [`STRATEGY_KEYS`] and [`NUMERIC_KEYS`] are type-checked;
/// anything else passes through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSettings(BTreeMap<String, Value>);

pub const STRATEGY_KEYS: &[&str] = &["vertical_strategy", "horizontal_strategy"];

pub const STRATEGIES: &[&str] = &["lines", "lines_strict", "text", "explicit"];

pub const NUMERIC_KEYS: &[&str] = &[
    "snap_tolerance",
    "snap_x_tolerance",
    "snap_y_tolerance",
    "join_tolerance",
    "join_x_tolerance",
    "join_y_tolerance",
    "edge_min_length",
    "min_words_vertical",
    "min_words_horizontal",
    "intersection_tolerance",
    "intersection_x_tolerance",
    "intersection_y_tolerance",
    "text_x_tolerance",
    "text_y_tolerance",
];

impl TableSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlay `other` on top of these settings; `other` wins on conflicts.
    pub fn merge(&mut self, other: &TableSettings) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Apply a `key=value` override. The value is read as JSON when it
    /// parses (numbers, booleans) and as a plain string otherwise.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), LiquidaError> {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            LiquidaError::SettingsInvalid(format!(
                "override '{}' is not of the form key=value",
                assignment
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(LiquidaError::SettingsInvalid(format!(
                "override '{}' has an empty key",
                assignment
            )));
        }
        let raw = raw.trim();
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        let mut candidate = self.clone();
        candidate.set(key, value);
        validate_settings(&candidate)?;
        *self = candidate;
        Ok(())
    }
}

/// Load table settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<TableSettings, LiquidaError> {
    let content = std::fs::read_to_string(path).map_err(|e| LiquidaError::SettingsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_settings(&content, path)
}

/// Parse table settings from a JSON string.
pub fn parse_settings(json: &str, source: &Path) -> Result<TableSettings, LiquidaError> {
    let settings: TableSettings =
        serde_json::from_str(json).map_err(|e| LiquidaError::SettingsLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Parse table settings from a JSON string (no file path context).
pub fn parse_settings_str(json: &str) -> Result<TableSettings, LiquidaError> {
    let settings: TableSettings = serde_json::from_str(json).map_err(LiquidaError::Json)?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Check the value types of the known tolerance keys.
pub fn validate_settings(settings: &TableSettings) -> Result<(), LiquidaError> {
    for key in STRATEGY_KEYS {
        if let Some(value) = settings.get(key) {
            let strategy = value.as_str().ok_or_else(|| {
                LiquidaError::SettingsInvalid(format!("'{}' must be a string", key))
            })?;
            if !STRATEGIES.contains(&strategy) {
                return Err(LiquidaError::SettingsInvalid(format!(
                    "'{}' has unknown strategy '{}' (expected one of: {})",
                    key,
                    strategy,
                    STRATEGIES.join(", ")
                )));
            }
        }
    }

    for key in NUMERIC_KEYS {
        if let Some(value) = settings.get(key) {
            match value.as_f64() {
                Some(n) if n >= 0.0 => {}
                _ => {
                    return Err(LiquidaError::SettingsInvalid(format!(
                        "'{}' must be a non-negative number, got {}",
                        key, value
                    )))
                }
            }
        }
    }

    Ok(())
}
