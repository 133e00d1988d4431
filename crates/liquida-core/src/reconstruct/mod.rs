//! Row reconstruction: turns the detector's raw rows into tribute records and
//! year summaries, repairing rows the detector split or glued together.
//!
//! Merge state flows explicitly from one page to the next through
//! [`ReconstructionState`], so a record broken by a page boundary can be
//! repaired on the following page. The year of the last total row only
//! applies within its own page.

use crate::assemble::{assemble, assemble_summary};
use crate::classify::row::{
    has_amounts, is_header, ACCOUNTING_KEY_RE, CLAVE_CONTABILIDAD_COL, CLAVE_RECAUDACION_COL,
    CONCEPT_COL, MIN_ROW_CELLS,
};
use crate::classify::{classify_row, RowKind};
use crate::extraction::{cell_text, is_blank, Cell, Row, Table};
use crate::model::{ExerciseSummary, TributeRecord};
use crate::parsing::year::first_four_digits;

const TOTAL_EJERCICIO: &str = "TOTAL EJERCICIO";

/// Where the merge engine stands between rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MergeState {
    /// No record emitted yet and nothing pending.
    #[default]
    Idle,
    /// A concept-only row seen before any record; the next row carrying
    /// amounts completes it.
    AwaitingContinuation(Row),
    /// The last row that produced a record. A later concept-only row is
    /// folded back into it.
    Anchored(Row),
}

/// Everything carried from one page to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructionState {
    pub merge: MergeState,
}

/// What one page contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOutput {
    pub records: Vec<TributeRecord>,
    pub summaries: Vec<ExerciseSummary>,
    /// The first record of this page supersedes the last record emitted by
    /// an earlier page; the caller must drop that one.
    pub replaces_previous_record: bool,
}

/// Reconstruct every row of every table on one page, in order.
pub fn reconstruct_page(
    state: ReconstructionState,
    tables: &[Table],
) -> (ReconstructionState, PageOutput) {
    let mut page = PageRun {
        state,
        year_hint: None,
        out: PageOutput::default(),
    };
    for row in tables.iter().flatten() {
        page.process(row);
    }
    (page.state, page.out)
}

/// Join two halves of one record: concepts concatenated (first, then
/// second), every other column taken from `second` when it has a value.
pub fn merge_rows(first: &[Cell], second: &[Cell]) -> Row {
    let width = first.len().max(second.len());
    let concept = format!(
        "{} {}",
        cell_text(first, CONCEPT_COL).trim(),
        cell_text(second, CONCEPT_COL).trim()
    );

    let mut merged = Vec::with_capacity(width.max(1));
    merged.push(non_empty(concept.trim()));
    for idx in 1..width {
        let theirs = cell_text(second, idx).trim();
        let ours = cell_text(first, idx).trim();
        merged.push(non_empty(if theirs.is_empty() { ours } else { theirs }));
    }
    merged
}

/// Year of a total row: first 4-digit run in the collection-key cell, then
/// the accounting-key cell, then the label.
pub fn total_row_year(row: &[Cell]) -> Option<i32> {
    [CLAVE_RECAUDACION_COL, CLAVE_CONTABILIDAD_COL, CONCEPT_COL]
        .into_iter()
        .find_map(|idx| first_four_digits(cell_text(row, idx)))
}

struct PageRun {
    state: ReconstructionState,
    /// Year of the most recent total row on this page, for records whose
    /// keys carry none.
    year_hint: Option<i32>,
    out: PageOutput,
}

impl PageRun {
    fn process(&mut self, raw: &[Cell]) {
        if raw.len() < MIN_ROW_CELLS {
            return;
        }

        let row = match &self.state.merge {
            MergeState::AwaitingContinuation(pending) => {
                if is_header(raw) || !has_amounts(raw) {
                    return;
                }
                tracing::debug!(
                    pending = cell_text(pending, CONCEPT_COL),
                    continuation = cell_text(raw, CONCEPT_COL),
                    "forward merge"
                );
                let merged = merge_rows(pending, raw);
                self.state.merge = MergeState::Idle;
                merged
            }
            _ => raw.to_vec(),
        };

        match classify_row(&row) {
            RowKind::Header | RowKind::Blank => {}
            RowKind::Partial => self.fold_partial(row),
            RowKind::MultiMerged { count } => self.split_merged(&row, count),
            RowKind::ConceptTotalMerged => self.split_concept_total(&row),
            RowKind::TotalRow => self.emit_summary(&row),
            RowKind::DataRow => self.emit(row),
        }
    }

    /// Assemble and emit a record; on success the row becomes the anchor.
    fn emit(&mut self, row: Row) {
        match assemble(&row, self.year_hint) {
            Some(record) => {
                self.out.records.push(record);
                self.state.merge = MergeState::Anchored(row);
            }
            None => tracing::debug!(concept = cell_text(&row, CONCEPT_COL), "row skipped"),
        }
    }

    fn emit_summary(&mut self, row: &[Cell]) {
        match total_row_year(row) {
            Some(year) => {
                self.out.summaries.push(assemble_summary(row, year));
                self.year_hint = Some(year);
            }
            None => tracing::debug!(
                label = cell_text(row, CONCEPT_COL),
                "total row without a year skipped"
            ),
        }
    }

    /// `process` resolves a pending row before classifying, so the state
    /// here is either `Idle` or `Anchored`.
    fn fold_partial(&mut self, partial: Row) {
        let MergeState::Anchored(anchor) = std::mem::take(&mut self.state.merge) else {
            tracing::debug!(
                concept = cell_text(&partial, CONCEPT_COL),
                "partial row awaiting continuation"
            );
            self.state.merge = MergeState::AwaitingContinuation(partial);
            return;
        };

        // The anchor assembled once and the partial only lengthens its
        // concept, so the merged row assembles too.
        let merged = merge_rows(&anchor, &partial);
        let Some(record) = assemble(&merged, self.year_hint) else {
            self.state.merge = MergeState::Anchored(anchor);
            return;
        };
        if self.out.records.pop().is_none() {
            self.out.replaces_previous_record = true;
        }
        tracing::debug!(
            concept = %record.concepto,
            cross_page = self.out.replaces_previous_record && self.out.records.is_empty(),
            "backward merge"
        );
        self.out.records.push(record);
        self.state.merge = MergeState::Anchored(merged);
    }

    /// One row holding `count` records: every multi-line cell gives one line
    /// per record, single-line cells are shared. The concept is not split.
    fn split_merged(&mut self, row: &[Cell], count: usize) {
        tracing::debug!(count, "splitting merged records");
        let columns: Vec<Vec<&str>> = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let text = cell.as_deref().unwrap_or("");
                if !text.contains('\n') {
                    vec![text; count]
                } else if idx == CONCEPT_COL {
                    Vec::new()
                } else {
                    text.split('\n').collect()
                }
            })
            .collect();
        let joined_concept = cell_text(row, CONCEPT_COL)
            .split('\n')
            .collect::<Vec<_>>()
            .join(" ");

        for i in 0..count {
            let sub: Row = columns
                .iter()
                .enumerate()
                .map(|(idx, values)| {
                    if idx == CONCEPT_COL && values.is_empty() {
                        non_empty(joined_concept.trim())
                    } else {
                        values.get(i).copied().and_then(non_empty)
                    }
                })
                .collect();
            self.emit(sub);
        }
    }

    /// A record whose year total was glued underneath it: the record keeps
    /// the concept lines and the first line of every multi-line column, the
    /// total gets the `TOTAL EJERCICIO` line and the second lines.
    fn split_concept_total(&mut self, row: &[Cell]) {
        let mut lines: Vec<String> = cell_text(row, CONCEPT_COL)
            .split('\n')
            .map(str::to_string)
            .collect();

        let mut recovered_key = None;
        if row.get(CLAVE_CONTABILIDAD_COL).map_or(true, is_blank) {
            if let Some(key) = ACCOUNTING_KEY_RE.find(&lines[0]).map(|m| m.as_str().to_string()) {
                lines[0] = lines[0].replace(&key, "").trim().to_string();
                recovered_key = Some(key);
            }
        }

        let (total_lines, record_lines): (Vec<String>, Vec<String>) = lines
            .into_iter()
            .partition(|l| l.to_uppercase().contains(TOTAL_EJERCICIO));

        let mut record_row: Row = vec![non_empty(&record_lines.join("\n"))];
        let mut total_row: Row = vec![total_lines.first().and_then(|l| non_empty(l))];

        for (idx, cell) in row.iter().enumerate().skip(1) {
            let text = cell.as_deref().unwrap_or("");
            match (&recovered_key, idx) {
                (Some(key), CLAVE_CONTABILIDAD_COL) => {
                    record_row.push(Some(key.clone()));
                    total_row.push(None);
                }
                _ if text.contains('\n') => {
                    let mut parts = text.split('\n');
                    record_row.push(parts.next().and_then(non_empty));
                    total_row.push(parts.next().and_then(non_empty));
                }
                _ => {
                    record_row.push(non_empty(text));
                    total_row.push(None);
                }
            }
        }

        tracing::debug!(
            concept = cell_text(&record_row, CONCEPT_COL),
            "splitting record from glued year total"
        );
        self.emit(record_row);

        if total_row.iter().any(|c| !is_blank(c)) {
            self.emit_summary(&total_row);
        }
    }
}

fn non_empty(text: &str) -> Cell {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
