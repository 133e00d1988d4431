//! Grand totals, deductions and advances from the totals page.

pub mod deductions;
pub mod refunds;

use crate::extraction::{cell_text, PageContent, Table};
use crate::model::{AdvanceBreakdown, AmountField, Amounts, DeductionDetail, GrandTotals};
use crate::parsing::parse_amount;
use regex::Regex;
use std::sync::LazyLock;

pub use deductions::extract_deductions;
pub use refunds::extract_refunds;

static LIQUIDO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)L[IÍ]QUIDO\s+([\d.,]+)").expect("liquido regex"));
static A_LIQUIDAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"A\s+LIQUIDAR\s+([\d.,]+)").expect("a liquidar regex"));

/// A municipal label and its provincial counterpart.
struct TotalLabel {
    word: &'static str,
    municipal: AmountField,
    provincial: AmountField,
    amount: Regex,
}

static TOTAL_LABELS: LazyLock<Vec<TotalLabel>> = LazyLock::new(|| {
    [
        ("VOLUNTARIA", AmountField::Voluntaria, AmountField::DiputacionVoluntaria),
        ("EJECUTIVA", AmountField::Ejecutiva, AmountField::DiputacionEjecutiva),
        ("RECARGO", AmountField::Recargo, AmountField::DiputacionRecargo),
    ]
    .into_iter()
    .map(|(word, municipal, provincial)| TotalLabel {
        word,
        municipal,
        provincial,
        amount: Regex::new(&format!(r"{word}\s+([\d.,]+)")).expect("total label regex"),
    })
    .collect()
});

/// What the totals page yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalsReport {
    pub totals: GrandTotals,
    pub deductions: Option<DeductionDetail>,
    pub advance_breakdown: Vec<AdvanceBreakdown>,
    /// Page holding the totals table, `None` when no page matched.
    pub page_number: Option<usize>,
}

impl TotalsReport {
    pub fn found(&self) -> bool {
        self.page_number.is_some()
    }
}

/// Scan every page for the totals table; the first match wins.
///
/// Not finding it is not an error: the report keeps zero totals and no
/// deductions, and [`TotalsReport::found`] is false.
pub fn locate_totals(pages: &[PageContent]) -> TotalsReport {
    for page in pages {
        let tables = match page.tables() {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!(error = %e, "page skipped while locating totals");
                continue;
            }
        };
        for table in tables {
            let Some(cell) = totals_cell(table) else {
                continue;
            };
            tracing::debug!(page = page.page_number, "totals table found");

            let mut amounts = parse_totals_cell(cell);
            if let Some(liquido) = liquido_below(table) {
                amounts.liquido = liquido;
            }
            let a_liquidar = capture_amount(&A_LIQUIDAR_RE, &page.text).unwrap_or_default();

            return TotalsReport {
                totals: GrandTotals {
                    amounts,
                    a_liquidar,
                },
                deductions: Some(extract_deductions(tables, &page.text)),
                advance_breakdown: extract_advances(tables),
                page_number: Some(page.page_number),
            };
        }
    }
    TotalsReport::default()
}

/// The multi-line label cell of a totals table: first row mentions `TOTAL`,
/// second row has a multi-line cell naming both `VOLUNTARIA` and `EJECUTIVA`.
pub fn totals_cell(table: &Table) -> Option<&str> {
    let [first, second, ..] = table.as_slice() else {
        return None;
    };
    let titled = first
        .iter()
        .flatten()
        .any(|c| c.to_uppercase().contains("TOTAL"));
    if !titled {
        return None;
    }
    second.iter().flatten().map(String::as_str).find(|c| {
        let upper = c.to_uppercase();
        c.contains('\n') && upper.contains("VOLUNTARIA") && upper.contains("EJECUTIVA")
    })
}

/// Read a totals cell line by line. A `DIPUTACIÓN` line always feeds the
/// provincial field, never the municipal one.
pub fn parse_totals_cell(cell: &str) -> Amounts {
    let mut amounts = Amounts::default();
    for line in cell.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((field, value)) = parse_totals_line(line) {
            *amounts.get_mut(field) = value;
        }
    }
    amounts
}

fn parse_totals_line(line: &str) -> Option<(AmountField, rust_decimal::Decimal)> {
    let upper = line.to_uppercase();
    let provincial = upper.contains("DIPUTACI");
    for label in TOTAL_LABELS.iter() {
        if provincial && upper.contains(label.word) {
            return capture_amount(&label.amount, &upper).map(|v| (label.provincial, v));
        }
        if !provincial && upper.starts_with(label.word) {
            return capture_amount(&label.amount, &upper).map(|v| (label.municipal, v));
        }
    }
    capture_amount(&LIQUIDO_RE, line).map(|v| (AmountField::Liquido, v))
}

/// `LÍQUIDO` in the rows under the label row; the last row mentioning it wins.
fn liquido_below(table: &Table) -> Option<rust_decimal::Decimal> {
    table
        .iter()
        .skip(2)
        .filter_map(|row| {
            row.iter()
                .flatten()
                .find_map(|c| capture_amount(&LIQUIDO_RE, c))
        })
        .last()
}

/// Per-year advance rows: at least eight cells, first cell a bare year.
pub fn extract_advances(tables: &[Table]) -> Vec<AdvanceBreakdown> {
    tables
        .iter()
        .flatten()
        .filter(|row| row.len() >= 8)
        .filter_map(|row| {
            let first = cell_text(row, 0);
            if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let ejercicio = first.parse().ok()?;
            let col = |idx: usize| parse_amount(row.get(idx).and_then(|c| c.as_deref()));
            Some(AdvanceBreakdown {
                ejercicio,
                urbana: col(1),
                rustica: col(2),
                vehiculos: col(3),
                bice: col(4),
                iae: col(5),
                tasas: col(6),
                ejecutiva: col(7),
            })
        })
        .collect()
}

pub(crate) fn capture_amount(re: &Regex, text: &str) -> Option<rust_decimal::Decimal> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| parse_amount(Some(m.as_str())))
}
