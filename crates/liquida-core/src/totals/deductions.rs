use crate::extraction::Table;
use crate::model::{DeductionDetail, DeductionField};
use crate::parsing::parse_amount;
use regex::Regex;
use std::sync::LazyLock;

/// One deduction category as printed on the totals page.
struct DeductionRule {
    field: DeductionField,
    /// A line belongs to this category if it contains any marker.
    markers: &'static [&'static str],
    /// Amount pattern; group 1 is the figure.
    pattern: &'static str,
    /// Several lines add up into the same field.
    accumulate: bool,
}

const fn rule(
    field: DeductionField,
    markers: &'static [&'static str],
    pattern: &'static str,
) -> DeductionRule {
    DeductionRule {
        field,
        markers,
        pattern,
        accumulate: false,
    }
}

/// Checked in order against accent-folded, upper-cased text. Longer labels
/// come before the labels they extend.
const RULES: &[DeductionRule] = &[
    rule(
        DeductionField::TasaVoluntaria,
        &["- TASA VOLUNTARIA"],
        r"TASA VOLUNTARIA\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaEjecutivaSinRecargo,
        &["- TASA EJECUTIVA SIN RECARGO"],
        r"TASA EJECUTIVA SIN RECARGO\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaEjecutiva,
        &["- TASA EJECUTIVA"],
        r"TASA EJECUTIVA\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaBajaOrganoGestorDeleg,
        &["- TASA BAJA", "ORGANO GESTOR"],
        r"(?:TASA BAJA|ORGANO GESTOR)[^\d\n]*(\d[\d.,]*)",
    ),
    rule(
        DeductionField::TasaGestionTributaria,
        &["- TASA GESTION TRIBUTARIA"],
        r"TASA GESTION TRIBUTARIA\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaGestionCensal,
        &["- TASA GESTION CENSAL"],
        r"TASA GESTION CENSAL\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaGestionCatastral,
        &["- TASA GESTION CATASTRAL"],
        r"TASA GESTION CATASTRAL\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaSancionTributaria,
        &["- TASA SANCION TRIBUTARIA"],
        r"TASA SANCION TRIBUTARIA\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaSancionRecaudacion,
        &["- TASA SANCION RECAUDACION"],
        r"TASA SANCION RECAUDACION\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaSancionInspeccion,
        &["- TASA SANCION INSPECCION"],
        r"TASA SANCION INSPECCION\s+([\d.,]+)",
    ),
    rule(
        DeductionField::TasaMultasTrafico,
        &["- TASA MULTAS DE TRAFICO"],
        r"TASA MULTAS DE TRAFICO\s+([\d.,]+)",
    ),
    rule(
        DeductionField::GastosRepercutidos,
        &["- GASTOS REPERCUTIDOS"],
        r"GASTOS REPERCUTIDOS\s+([\d.,]+)",
    ),
    rule(
        DeductionField::Anticipos,
        &["- ANTICIPOS"],
        r"ANTICIPOS\s+([\d.,]+)",
    ),
    rule(
        DeductionField::InteresesPorAnticipo,
        &["- INTERESES POR ANTICIPO"],
        r"INTERESES POR ANTICIPO\s+([\d.,]+)",
    ),
    // Entity and tax compensation lines both land here; the figure closes the line.
    DeductionRule {
        field: DeductionField::ExpedientesCompensacion,
        markers: &["EXPEDIENTES COMPENSACION"],
        pattern: r"(?m)EXPEDIENTES COMPENSACION[^\n]*?(\d[\d.,]*)[ \t]*$",
        accumulate: true,
    },
    rule(
        DeductionField::ExpedientesIngresosIndebidos,
        &["- EXPEDIENTES INGRESOS INDEBIDOS"],
        r"EXPEDIENTES INGRESOS INDEBIDOS\s+([\d.,]+)",
    ),
];

static COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|r| Regex::new(r.pattern).expect("deduction regex"))
        .collect()
});

/// Read the deduction breakdown.
///
/// Multi-line cells of the `DEDUCCIONES` / `RECAUDACIÓN` table are parsed
/// line by line. If no line matched, every category pattern is run over the
/// page text instead.
pub fn extract_deductions(tables: &[Table], page_text: &str) -> DeductionDetail {
    let mut detail = DeductionDetail::default();
    let mut matched = false;

    for cell in deduction_cells(tables) {
        for line in cell.lines().map(str::trim).filter(|l| !l.is_empty()) {
            matched |= apply_line(&mut detail, line);
        }
    }

    if !matched {
        tracing::debug!("no deduction cell matched; scanning page text");
        apply_text(&mut detail, &fold(page_text));
    }
    detail
}

/// Accent-folded multi-line cells of the deductions table.
fn deduction_cells(tables: &[Table]) -> Vec<String> {
    let mut cells = Vec::new();
    for table in tables {
        let joined = fold(
            &table
                .iter()
                .flatten()
                .flatten()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        );
        if !(joined.contains("DEDUCCIONES") && joined.contains("RECAUDACION")) {
            continue;
        }
        cells.extend(
            table
                .iter()
                .flatten()
                .flatten()
                .filter(|c| c.contains('\n'))
                .map(|c| fold(c))
                .filter(|c| c.contains("RECAUDACION")),
        );
    }
    cells
}

fn apply_line(detail: &mut DeductionDetail, line: &str) -> bool {
    let Some(idx) = RULES
        .iter()
        .position(|r| r.markers.iter().any(|m| line.contains(m)))
    else {
        return false;
    };
    let Some(caps) = COMPILED[idx].captures(line) else {
        return false;
    };
    let value = parse_amount(caps.get(1).map(|m| m.as_str()));
    let rule = &RULES[idx];
    if rule.accumulate {
        *detail.get_mut(rule.field) += value;
    } else {
        *detail.get_mut(rule.field) = value;
    }
    true
}

fn apply_text(detail: &mut DeductionDetail, text: &str) {
    for (rule, re) in RULES.iter().zip(COMPILED.iter()) {
        if rule.accumulate {
            *detail.get_mut(rule.field) = re
                .captures_iter(text)
                .map(|c| parse_amount(c.get(1).map(|m| m.as_str())))
                .sum();
        } else if let Some(caps) = re.captures(text) {
            *detail.get_mut(rule.field) = parse_amount(caps.get(1).map(|m| m.as_str()));
        }
    }
}

/// Upper-case and strip Spanish accents so `GESTIÓN` and `GESTION` match alike.
fn fold(text: &str) -> String {
    text.to_uppercase()
        .chars()
        .map(|c| match c {
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' | 'Ü' => 'U',
            other => other,
        })
        .collect()
}
