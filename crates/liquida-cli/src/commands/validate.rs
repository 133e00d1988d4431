use liquida_core::error::LiquidaError;
use liquida_core::extraction::pdfplumber::PdfplumberDetector;
use liquida_core::model::LiquidationDocument;
use liquida_core::validate::ExerciseValidation;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::SettingsArgs;
use crate::output;

/// Everything `validate` reports about one document.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub exercises: BTreeMap<i32, ExerciseValidation>,
    pub totals_errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn for_document(doc: &LiquidationDocument) -> Self {
        let exercises = doc.validate_exercise_summaries();
        let totals_errors = doc.validate_totals();
        ValidationReport {
            is_valid: totals_errors.is_empty() && exercises.values().all(|v| v.is_valid),
            exercises,
            totals_errors,
            warnings: doc.warnings.clone(),
        }
    }
}

/// Returns whether every check passed.
pub fn run(
    input_file: PathBuf,
    output_format: &str,
    settings_args: &SettingsArgs,
) -> Result<bool, LiquidaError> {
    // Determine input type by extension
    let is_json = input_file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let doc: LiquidationDocument = if is_json {
        let json_bytes = std::fs::read(&input_file)?;
        serde_json::from_slice(&json_bytes)?
    } else {
        let settings = settings_args.resolve()?;
        let detector = PdfplumberDetector::new();
        liquida_core::extract(&input_file, &settings, &detector)?
    };

    let report = ValidationReport::for_document(&doc);
    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_validation(&report)?,
    }

    Ok(report.is_valid)
}
