use liquida_core::error::LiquidaError;
use liquida_core::extraction::pdfplumber::PdfplumberDetector;
use std::path::PathBuf;

use super::SettingsArgs;
use crate::output;

pub fn run(
    pdf_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    settings_args: &SettingsArgs,
) -> Result<(), LiquidaError> {
    let settings = settings_args.resolve()?;
    let detector = PdfplumberDetector::new();
    let doc = liquida_core::extract(&pdf_file, &settings, &detector)?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&doc)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Extracted {} record(s) over {} year(s), written to {}",
                doc.total_records(),
                doc.years().len(),
                path.display()
            );
            for w in &doc.warnings {
                eprintln!("  warning: {w}");
            }
        }
        None => match output_format {
            "json" => output::json::print(&doc)?,
            _ => output::table::print_document(&doc)?,
        },
    }

    Ok(())
}
