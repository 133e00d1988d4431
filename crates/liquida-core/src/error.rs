use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LiquidaError {
    #[error("failed to extract {path}: {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: Box<LiquidaError>,
    },

    #[error("not a readable PDF: {0}")]
    InvalidPdf(String),

    #[error("table detector unavailable: {0}. Install it with: pip install pdfplumber")]
    DetectorNotFound(String),

    #[error("table detector failed with exit code {code}: {stderr}")]
    DetectorFailed { code: i32, stderr: String },

    #[error("table detection failed on page {page}: {reason}")]
    PageDetection { page: usize, reason: String },

    #[error("failed to load table settings from {path}: {reason}")]
    SettingsLoad { path: PathBuf, reason: String },

    #[error("invalid table settings: {0}")]
    SettingsInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LiquidaError {
    /// Wrap any failure with the path of the document being extracted.
    pub fn for_document(self, path: impl Into<PathBuf>) -> LiquidaError {
        match self {
            already @ LiquidaError::Extraction { .. } => already,
            other => LiquidaError::Extraction {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}
