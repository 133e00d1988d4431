use liquida_core::model::{AmountField, Amounts, DeductionField, LiquidationDocument};
use rust_decimal::Decimal;
use std::io::{self, Write};

use crate::commands::validate::ValidationReport;

const CONCEPT_WIDTH: usize = 34;
const AMOUNT_WIDTH: usize = 12;

const AMOUNT_HEADINGS: [&str; 7] = [
    "Voluntaria",
    "Ejecutiva",
    "Recargo",
    "Dip. vol.",
    "Dip. ejec.",
    "Dip. rec.",
    "Líquido",
];

pub fn print_document(doc: &LiquidationDocument) -> io::Result<()> {
    write_document(&mut io::stdout().lock(), doc)
}

pub fn print_validation(report: &ValidationReport) -> io::Result<()> {
    write_validation(&mut io::stdout().lock(), report)
}

/// Human-readable rendering of an extracted document.
fn write_document(out: &mut impl Write, doc: &LiquidationDocument) -> io::Result<()> {
    let h = &doc.header;

    writeln!(
        out,
        "Liquidación {}: {}",
        h.numero_liquidacion.as_deref().unwrap_or("?"),
        h.entidad.as_deref().unwrap_or("entidad desconocida")
    )?;
    if let Some(year) = h.ejercicio {
        writeln!(out, "  Ejercicio:          {year}")?;
    }
    if let Some(ref m) = h.mandamiento_pago {
        let fecha = h
            .fecha_mandamiento
            .map(|d| d.format(" (%d/%m/%Y)").to_string())
            .unwrap_or_default();
        writeln!(out, "  Mandamiento:        {m}{fecha}")?;
    }
    if let Some(ref who) = h.firmado_por {
        writeln!(out, "  Firmado por:        {who}")?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "Tribute records ({} over {} year(s)):\n",
        doc.total_records(),
        doc.years().len()
    )?;
    writeln!(
        out,
        "  {:<6} {:<cw$} {:<16}{}",
        "Año",
        "Concepto",
        "Clave contab.",
        amount_headings(),
        cw = CONCEPT_WIDTH
    )?;
    for r in &doc.tribute_records {
        writeln!(
            out,
            "  {:<6} {:<cw$} {:<16}{}",
            r.ejercicio,
            truncate(&r.concepto, CONCEPT_WIDTH),
            r.clave_contabilidad,
            amount_cells(&r.amounts),
            cw = CONCEPT_WIDTH
        )?;
    }
    writeln!(out)?;

    if !doc.exercise_summaries.is_empty() {
        writeln!(out, "Year totals:\n")?;
        for s in &doc.exercise_summaries {
            writeln!(
                out,
                "  {:<6} {:<cw$} {:<16}{}",
                s.ejercicio,
                "TOTAL EJERCICIO",
                "",
                amount_cells(&s.amounts),
                cw = CONCEPT_WIDTH
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Grand totals:\n")?;
    for field in AmountField::ALL {
        writeln!(
            out,
            "  {:<26}{:>w$}",
            field.label(),
            fmt_amount(doc.totals.amounts.get(field)),
            w = AMOUNT_WIDTH + 2
        )?;
    }
    writeln!(
        out,
        "  {:<26}{:>w$}",
        "A liquidar",
        fmt_amount(doc.totals.a_liquidar),
        w = AMOUNT_WIDTH + 2
    )?;
    writeln!(out)?;

    if let Some(ref d) = doc.deductions {
        writeln!(out, "Deductions:\n")?;
        for field in DeductionField::ALL {
            let value = d.get(field);
            if !value.is_zero() {
                writeln!(
                    out,
                    "  {:<34}{:>w$}",
                    field.label(),
                    fmt_amount(value),
                    w = AMOUNT_WIDTH + 2
                )?;
            }
        }
        writeln!(
            out,
            "  {:<34}{:>w$}\n",
            "Total",
            fmt_amount(d.total()),
            w = AMOUNT_WIDTH + 2
        )?;
    }

    if !doc.refund_records.is_empty() {
        writeln!(out, "Refunds ({}):\n", doc.refund_records.len())?;
        for r in &doc.refund_records {
            writeln!(
                out,
                "  {:<14} {:<12} {:>w$} {:>w$} {:>w$}",
                r.num_expte,
                r.num_resolucion,
                fmt_amount(r.total_devolucion),
                fmt_amount(r.entidad),
                fmt_amount(r.diputacion),
                w = AMOUNT_WIDTH
            )?;
        }
        writeln!(out)?;
    }

    for w in &doc.warnings {
        writeln!(out, "  warning: {w}")?;
    }
    Ok(())
}

/// Human-readable rendering of the validation outcome.
fn write_validation(out: &mut impl Write, report: &ValidationReport) -> io::Result<()> {
    if report.exercises.is_empty() {
        writeln!(out, "No year totals found; nothing to check per year.\n")?;
    }
    for (year, v) in &report.exercises {
        let status = if v.is_valid { "OK" } else { "MISMATCH" };
        writeln!(out, "  Ejercicio {year}: {status}")?;
        for e in &v.errors {
            writeln!(out, "    {e}")?;
        }
    }
    writeln!(out)?;

    if report.totals_errors.is_empty() {
        writeln!(out, "  Grand totals: OK")?;
    } else {
        writeln!(out, "  Grand totals: MISMATCH")?;
        for e in &report.totals_errors {
            writeln!(out, "    {e}")?;
        }
    }

    for w in &report.warnings {
        writeln!(out, "  warning: {w}")?;
    }
    writeln!(
        out,
        "\n{}",
        if report.is_valid {
            "Document is consistent."
        } else {
            "Document has validation errors."
        }
    )
}

fn amount_headings() -> String {
    AMOUNT_HEADINGS
        .iter()
        .map(|h| format!("{:>w$}", h, w = AMOUNT_WIDTH))
        .collect()
}

fn amount_cells(amounts: &Amounts) -> String {
    AmountField::ALL
        .iter()
        .map(|f| format!("{:>w$}", fmt_amount(amounts.get(*f)), w = AMOUNT_WIDTH))
        .collect()
}

fn fmt_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width - 1).collect();
    short.push('…');
    short
}
