use crate::extraction::{cell_text, is_blank, line_count, Cell};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Rows narrower than this are layout noise.
pub const MIN_ROW_CELLS: usize = 8;

/// A tribute record needs the concept, two keys and seven amounts.
pub const DATA_ROW_CELLS: usize = 10;

pub const CONCEPT_COL: usize = 0;
pub const CLAVE_CONTABILIDAD_COL: usize = 1;
pub const CLAVE_RECAUDACION_COL: usize = 2;
pub const AMOUNT_COLS: Range<usize> = 3..10;
pub const KEY_COLS: Range<usize> = 1..3;

/// First-cell markers of the repeated column header.
pub const HEADER_MARKERS: &[&str] = &["CONCEPTO", "CLAVE"];

/// Accounting key shape, e.g. `2025/M/0000731`.
pub static ACCOUNTING_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}/[A-Z]/\d+").expect("accounting key regex"));

/// What one raw detector row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Repeated column header.
    Header,
    /// Empty or too narrow to carry a record.
    Blank,
    /// Concept text only; its keys and amounts live on a neighbouring row.
    Partial,
    /// `count` records glued into one row through shared column boundaries.
    MultiMerged { count: usize },
    /// A record and its year's "TOTAL EJERCICIO" line glued together.
    ConceptTotalMerged,
    /// A "TOTAL EJERCICIO" summary row.
    TotalRow,
    /// A plain tribute record.
    DataRow,
}

/// Classify a row without looking at any surrounding context.
pub fn classify_row(row: &[Cell]) -> RowKind {
    if row.len() < MIN_ROW_CELLS || row.iter().all(is_blank) {
        return RowKind::Blank;
    }
    if is_header(row) {
        return RowKind::Header;
    }
    if is_partial(row) {
        return RowKind::Partial;
    }
    if let Some(count) = merged_record_count(row) {
        return RowKind::MultiMerged { count };
    }
    if is_concept_total_merged(row) {
        return RowKind::ConceptTotalMerged;
    }
    if is_total_row(row) {
        return RowKind::TotalRow;
    }
    if row.len() >= DATA_ROW_CELLS {
        return RowKind::DataRow;
    }
    RowKind::Blank
}

pub fn is_header(row: &[Cell]) -> bool {
    let first = cell_text(row, CONCEPT_COL).to_uppercase();
    HEADER_MARKERS.iter().any(|m| first.contains(m))
}

/// True if any amount column holds a value.
pub fn has_amounts(row: &[Cell]) -> bool {
    cells_in(row, AMOUNT_COLS).iter().any(|c| !is_blank(c))
}

/// Concept present, keys and amounts all empty.
pub fn is_partial(row: &[Cell]) -> bool {
    if row.len() < MIN_ROW_CELLS {
        return false;
    }
    let first = cell_text(row, CONCEPT_COL).trim();
    if first.is_empty() {
        return false;
    }
    let upper = first.to_uppercase();
    if HEADER_MARKERS.iter().any(|m| upper.contains(m)) || upper.contains("TOTAL EJERCICIO") {
        return false;
    }
    !has_amounts(row) && cells_in(row, KEY_COLS).iter().all(is_blank)
}

/// Number of records merged into this row, if the accounting-key cell holds
/// several lines and more than one accounting key.
pub fn merged_record_count(row: &[Cell]) -> Option<usize> {
    let keys = cell_text(row, CLAVE_CONTABILIDAD_COL);
    if !keys.contains('\n') {
        return None;
    }
    if ACCOUNTING_KEY_RE.find_iter(keys).count() > 1 {
        Some(line_count(keys))
    } else {
        None
    }
}

/// Concept cell spans three or more lines and ends in a year total.
pub fn is_concept_total_merged(row: &[Cell]) -> bool {
    let concept = cell_text(row, CONCEPT_COL);
    let upper = concept.to_uppercase();
    concept.contains('\n')
        && upper.contains("TOTAL")
        && upper.contains("EJERCICIO")
        && line_count(concept) > 2
}

pub fn is_total_row(row: &[Cell]) -> bool {
    let upper = cell_text(row, CONCEPT_COL).to_uppercase();
    upper.contains("TOTAL") && upper.contains("EJERCICIO")
}

fn cells_in(row: &[Cell], cols: Range<usize>) -> &[Cell] {
    let start = cols.start.min(row.len());
    let end = cols.end.min(row.len());
    &row[start..end]
}
