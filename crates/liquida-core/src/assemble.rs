use crate::classify::row::{
    AMOUNT_COLS, CLAVE_CONTABILIDAD_COL, CLAVE_RECAUDACION_COL, CONCEPT_COL, DATA_ROW_CELLS,
};
use crate::extraction::{cell_text, Cell};
use crate::model::{Amounts, ExerciseSummary, TributeRecord};
use crate::parsing::{infer_year, parse_amount, YearSources};

/// Concepts that mark a layout row rather than a record.
const REJECTED_CONCEPTS: &[&str] = &["CONCEPTO", "TOTAL"];

/// Build a tribute record from a reconstructed row.
///
/// Returns `None` for rows narrower than ten columns and for rows whose
/// concept is empty or a bare layout label. The fiscal year comes from the
/// row's keys, then `year_hint`, then the default year.
pub fn assemble(row: &[Cell], year_hint: Option<i32>) -> Option<TributeRecord> {
    if row.len() < DATA_ROW_CELLS {
        return None;
    }

    let concepto = collapse_whitespace(cell_text(row, CONCEPT_COL));
    if concepto.is_empty() || REJECTED_CONCEPTS.contains(&concepto.to_uppercase().as_str()) {
        return None;
    }

    let clave_contabilidad = cell_text(row, CLAVE_CONTABILIDAD_COL).trim().to_string();
    let clave_recaudacion = cell_text(row, CLAVE_RECAUDACION_COL).trim().to_string();

    let ejercicio = infer_year(
        &YearSources {
            clave_contabilidad: &clave_contabilidad,
            clave_recaudacion: &clave_recaudacion,
        },
        year_hint,
    );

    Some(TributeRecord {
        concepto,
        clave_contabilidad,
        clave_recaudacion,
        amounts: amounts_of(row),
        ejercicio,
    })
}

/// Build a year summary from a total row; missing columns read as zero.
pub fn assemble_summary(row: &[Cell], ejercicio: i32) -> ExerciseSummary {
    ExerciseSummary {
        ejercicio,
        amounts: amounts_of(row),
    }
}

fn amounts_of(row: &[Cell]) -> Amounts {
    Amounts::from_columns(
        AMOUNT_COLS.map(|idx| parse_amount(row.get(idx).and_then(|c| c.as_deref()))),
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
