pub mod extract;
pub mod settings;
pub mod validate;

use clap::Args;
use liquida_core::error::LiquidaError;
use liquida_core::settings::{builtin, load_settings, TableSettings};
use std::path::PathBuf;

/// Table-detector settings flags shared by `extract` and `validate`.
#[derive(Args)]
pub struct SettingsArgs {
    /// Predefined detector preset: default, lines, lines-strict, text
    #[arg(short, long, value_name = "NAME", default_value = "default")]
    pub preset: String,

    /// JSON settings file layered over the preset
    #[arg(short, long = "settings", value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Single override layered last (repeatable), e.g. --set snap_tolerance=4
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

impl SettingsArgs {
    /// Preset, then settings file, then `--set` overrides.
    pub fn resolve(&self) -> Result<TableSettings, LiquidaError> {
        let mut settings = builtin::load_preset(&self.preset)?.settings;
        if let Some(path) = &self.settings {
            settings.merge(&load_settings(path)?);
        }
        for assignment in &self.overrides {
            settings.apply_override(assignment)?;
        }
        tracing::debug!(?settings, "table settings resolved");
        Ok(settings)
    }
}
