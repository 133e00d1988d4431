use crate::error::LiquidaError;
use crate::settings::{validate_settings, TableSettings};
use serde::{Deserialize, Serialize};

const DEFAULT_JSON: &str = include_str!("../../presets/default.json");
const LINES_JSON: &str = include_str!("../../presets/lines.json");
const LINES_STRICT_JSON: &str = include_str!("../../presets/lines-strict.json");
const TEXT_JSON: &str = include_str!("../../presets/text.json");

/// Available predefined detector presets.
pub const PRESETS: &[&str] = &["default", "lines", "lines-strict", "text"];

/// A named, documented set of table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub settings: TableSettings,
}

/// Load a predefined preset by name.
pub fn load_preset(name: &str) -> Result<PresetDef, LiquidaError> {
    let json = match name {
        "default" => DEFAULT_JSON,
        "lines" => LINES_JSON,
        "lines-strict" => LINES_STRICT_JSON,
        "text" => TEXT_JSON,
        _ => {
            return Err(LiquidaError::SettingsInvalid(format!(
                "unknown preset '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    let preset: PresetDef = serde_json::from_str(json)?;
    validate_settings(&preset.settings)?;
    Ok(preset)
}
