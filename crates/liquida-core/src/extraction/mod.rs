pub mod pdfplumber;

use crate::error::LiquidaError;
use crate::settings::TableSettings;
use serde::{Deserialize, Serialize};

/// One cell as returned by the table detector. Absent cells are `None`;
/// visually stacked fragments are separated by `'\n'`.
pub type Cell = Option<String>;

pub type Row = Vec<Cell>;

pub type Table = Vec<Row>;

/// Content detected on a single page of a PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContent {
    pub page_number: usize,
    /// The page's full text, used for regex scans outside any table.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    /// Set when the detector failed on this page only.
    #[serde(default)]
    pub error: Option<String>,
}

impl PageContent {
    /// The page's tables, or the page-level detection failure.
    pub fn tables(&self) -> Result<&[Table], LiquidaError> {
        match &self.error {
            Some(reason) => Err(LiquidaError::PageDetection {
                page: self.page_number,
                reason: reason.clone(),
            }),
            None => Ok(&self.tables),
        }
    }
}

/// Trait for PDF table-detection backends.
pub trait TableDetector: Send + Sync {
    /// Detect text and tables on every page of `pdf_bytes` using the given
    /// geometric tolerances. Failures confined to one page are reported in
    /// that page's `error` rather than as an `Err`.
    fn detect_pages(
        &self,
        pdf_bytes: &[u8],
        settings: &TableSettings,
    ) -> Result<Vec<PageContent>, LiquidaError>;

    /// Name of this detection backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Text of cell `idx`, or `""` when the cell is absent or out of range.
pub fn cell_text(row: &[Cell], idx: usize) -> &str {
    row.get(idx).and_then(|c| c.as_deref()).unwrap_or("")
}

/// True if the cell holds nothing but whitespace.
pub fn is_blank(cell: &Cell) -> bool {
    cell.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Number of visual lines in a cell (0 for an absent cell).
pub fn line_count(cell: &str) -> usize {
    if cell.is_empty() {
        0
    } else {
        cell.split('\n').count()
    }
}
