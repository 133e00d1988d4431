use crate::error::LiquidaError;
use crate::extraction::{PageContent, TableDetector};
use crate::settings::TableSettings;
use serde::Deserialize;
use std::io::Write;
use std::process::Command;

/// Dumps every page's text and tables as JSON. Page-level failures are
/// reported in-band so one bad page does not abort the document.
const DETECT_SCRIPT: &str = r#"
import json, sys
import pdfplumber

settings = json.loads(sys.argv[2])
pages = []
with pdfplumber.open(sys.argv[1]) as pdf:
    for index, page in enumerate(pdf.pages):
        entry = {"page_number": index + 1, "text": "", "tables": [], "error": None}
        try:
            entry["text"] = page.extract_text() or ""
            entry["tables"] = page.extract_tables(table_settings=settings)
        except Exception as exc:
            entry["error"] = str(exc)
        pages.append(entry)
json.dump({"pages": pages}, sys.stdout)
"#;

/// Table detection backend using Python's `pdfplumber`.
///
/// The tolerance settings are handed to `page.extract_tables()` unmodified.
pub struct PdfplumberDetector {
    python: String,
}

impl PdfplumberDetector {
    pub fn new() -> Self {
        PdfplumberDetector {
            python: "python3".to_string(),
        }
    }

    /// Use a specific interpreter (e.g. a virtualenv's `bin/python`).
    pub fn with_python(python: impl Into<String>) -> Self {
        PdfplumberDetector {
            python: python.into(),
        }
    }

    /// Check if the interpreter can import pdfplumber.
    pub fn is_available(&self) -> bool {
        Command::new(&self.python)
            .args(["-c", "import pdfplumber"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for PdfplumberDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct DetectorOutput {
    pages: Vec<PageContent>,
}

impl TableDetector for PdfplumberDetector {
    fn detect_pages(
        &self,
        pdf_bytes: &[u8],
        settings: &TableSettings,
    ) -> Result<Vec<PageContent>, LiquidaError> {
        if !pdf_bytes.starts_with(b"%PDF") {
            return Err(LiquidaError::InvalidPdf("missing %PDF signature".into()));
        }

        // Write PDF bytes to a temp file
        let mut tmpfile = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        tmpfile.write_all(pdf_bytes)?;
        let tmp_path = tmpfile.path().to_path_buf();

        let settings_json = serde_json::to_string(settings)?;

        let output = Command::new(&self.python)
            .arg("-c")
            .arg(DETECT_SCRIPT)
            .arg(&tmp_path)
            .arg(&settings_json)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LiquidaError::DetectorNotFound(format!("'{}' not found", self.python))
                } else {
                    LiquidaError::DetectorFailed {
                        code: -1,
                        stderr: e.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if is_missing_module(&stderr) {
                return Err(LiquidaError::DetectorNotFound(
                    "python module 'pdfplumber' is not installed".into(),
                ));
            }
            let code = output.status.code().unwrap_or(-1);
            return Err(LiquidaError::DetectorFailed { code, stderr });
        }

        let parsed = parse_detector_output(&output.stdout)?;
        tracing::debug!(
            backend = self.backend_name(),
            pages = parsed.len(),
            "table detection finished"
        );
        Ok(parsed)
    }

    fn backend_name(&self) -> &str {
        "pdfplumber"
    }
}

fn parse_detector_output(stdout: &[u8]) -> Result<Vec<PageContent>, LiquidaError> {
    let out: DetectorOutput = serde_json::from_slice(stdout)?;
    Ok(out.pages)
}

fn is_missing_module(stderr: &str) -> bool {
    stderr.contains("ModuleNotFoundError") && stderr.contains("pdfplumber")
}
