use crate::extraction::{cell_text, Cell, Table};
use crate::model::{RefundRecord, RefundSummary};
use crate::parsing::parse_amount;
use regex::Regex;
use std::sync::LazyLock;

static EXPEDIENTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/\d+").expect("expediente regex"));

/// Concepts of the per-tribute refund summary lines.
const SUMMARY_CONCEPTS: &[&str] = &["I.B.I", "I.V.T.M", "RUSTICA", "URBANA"];

const MIN_REFUND_CELLS: usize = 7;

/// Refund files and per-concept refund summaries from the refunds page.
pub fn extract_refunds(tables: &[Table]) -> (Vec<RefundRecord>, Vec<RefundSummary>) {
    let mut records = Vec::new();
    let mut summaries = Vec::new();

    for row in tables.iter().flatten() {
        if row.len() < MIN_REFUND_CELLS {
            continue;
        }
        let first = cell_text(row, 0);
        let upper = first.to_uppercase();
        if upper.contains("EXPTE") {
            continue;
        }
        if EXPEDIENTE_RE.is_match(first) {
            records.push(refund_record(row));
        } else if SUMMARY_CONCEPTS.iter().any(|c| upper.contains(c)) {
            summaries.push(RefundSummary {
                concepto: first.trim().to_string(),
                total_devolucion: amount(row, 1),
                entidad: amount(row, 2),
                diputacion: amount(row, 3),
                intereses: amount(row, 4),
            });
        }
    }
    (records, summaries)
}

fn refund_record(row: &[Cell]) -> RefundRecord {
    let solic = cell_text(row, 2).trim();
    RefundRecord {
        num_expte: cell_text(row, 0).to_string(),
        num_resolucion: cell_text(row, 1).to_string(),
        num_solic: solic.parse().unwrap_or(0),
        total_devolucion: amount(row, 3),
        entidad: amount(row, 4),
        diputacion: amount(row, 5),
        intereses: amount(row, 6),
        comp_trib: amount(row, 7),
        a_deducir: amount(row, 8),
    }
}

fn amount(row: &[Cell], idx: usize) -> rust_decimal::Decimal {
    parse_amount(row.get(idx).and_then(|c| c.as_deref()))
}
