//! Cross-checks between reconstructed records and the figures the
//! document declares for itself.

use crate::model::{AmountField, Amounts, LiquidationDocument};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Largest difference accepted between a computed and a declared amount.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Outcome of checking one fiscal year against its `TOTAL EJERCICIO` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseValidation {
    pub ejercicio: i32,
    pub is_valid: bool,
    /// Sum of the year's tribute records.
    pub calculated: Amounts,
    /// What the summary row declares.
    pub documented: Amounts,
    /// One message per field outside tolerance.
    pub errors: Vec<String>,
}

impl LiquidationDocument {
    /// Compare every year summary with the sum of that year's records.
    pub fn validate_exercise_summaries(&self) -> BTreeMap<i32, ExerciseValidation> {
        self.exercise_summaries
            .iter()
            .map(|summary| {
                let calculated: Amounts = self
                    .records_by_year(summary.ejercicio)
                    .into_iter()
                    .map(|r| &r.amounts)
                    .sum();
                let errors = amount_mismatches(&calculated, &summary.amounts, "");
                let validation = ExerciseValidation {
                    ejercicio: summary.ejercicio,
                    is_valid: errors.is_empty(),
                    calculated,
                    documented: summary.amounts,
                    errors,
                };
                (summary.ejercicio, validation)
            })
            .collect()
    }

    pub fn has_exercise_validation_errors(&self) -> bool {
        self.validate_exercise_summaries()
            .values()
            .any(|v| !v.is_valid)
    }

    /// Compare all records with the grand totals, and check that the net
    /// amount minus deductions equals the amount to settle.
    pub fn validate_totals(&self) -> Vec<String> {
        let mut errors = amount_mismatches(&self.records_sum(), &self.totals.amounts, " total");

        let deductions = self
            .deductions
            .as_ref()
            .map(|d| d.total())
            .unwrap_or_default();
        let expected = self.totals.amounts.liquido - deductions;
        if !within_tolerance(expected, self.totals.a_liquidar) {
            errors.push(format!(
                "A liquidar: líquido {} minus deductions {} is {} vs documented {}",
                self.totals.amounts.liquido, deductions, expected, self.totals.a_liquidar
            ));
        }
        errors
    }
}

fn amount_mismatches(calculated: &Amounts, documented: &Amounts, suffix: &str) -> Vec<String> {
    AmountField::ALL
        .iter()
        .filter(|f| !within_tolerance(calculated.get(**f), documented.get(**f)))
        .map(|f| {
            format!(
                "{}{}: calculated {} vs documented {}",
                f.label(),
                suffix,
                calculated.get(*f),
                documented.get(*f)
            )
        })
        .collect()
}

fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeductionDetail, ExerciseSummary, GrandTotals, TributeRecord};
    use rust_decimal_macros::dec;

    fn amounts(voluntaria: Decimal, recargo: Decimal) -> Amounts {
        Amounts {
            voluntaria,
            recargo,
            diputacion_voluntaria: voluntaria / dec!(10),
            liquido: voluntaria + recargo - voluntaria / dec!(10),
            ..Amounts::default()
        }
    }

    fn record(ejercicio: i32, a: Amounts) -> TributeRecord {
        TributeRecord {
            concepto: "IBI URBANA".into(),
            clave_contabilidad: format!("{ejercicio}/U/1"),
            clave_recaudacion: format!("026/{ejercicio}/20/100/208"),
            amounts: a,
            ejercicio,
        }
    }

    /// Records for two years whose summaries and grand totals add up exactly.
    fn reconciled() -> LiquidationDocument {
        let r2023 = [amounts(dec!(100.00), dec!(5.00)), amounts(dec!(33.33), dec!(0))];
        let r2024 = [
            amounts(dec!(1234.56), dec!(12.34)),
            amounts(dec!(0.10), dec!(0.01)),
            amounts(dec!(250.00), dec!(0)),
        ];
        let s2023: Amounts = r2023.iter().sum();
        let s2024: Amounts = r2024.iter().sum();
        let grand = s2023 + s2024;

        let mut tribute_records: Vec<TributeRecord> =
            r2023.iter().map(|a| record(2023, *a)).collect();
        tribute_records.extend(r2024.iter().map(|a| record(2024, *a)));

        let deductions = DeductionDetail {
            tasa_voluntaria: dec!(15.00),
            anticipos: dec!(100.00),
            ..DeductionDetail::default()
        };

        LiquidationDocument {
            tribute_records,
            exercise_summaries: vec![
                ExerciseSummary {
                    ejercicio: 2023,
                    amounts: s2023,
                },
                ExerciseSummary {
                    ejercicio: 2024,
                    amounts: s2024,
                },
            ],
            totals: GrandTotals {
                amounts: grand,
                a_liquidar: grand.liquido - dec!(115.00),
            },
            deductions: Some(deductions),
            ..LiquidationDocument::default()
        }
    }

    #[test]
    fn test_reconciled_document_is_clean() {
        let doc = reconciled();
        let by_year = doc.validate_exercise_summaries();
        assert_eq!(by_year.keys().copied().collect::<Vec<_>>(), [2023, 2024]);
        assert!(by_year.values().all(|v| v.is_valid && v.errors.is_empty()));
        assert!(!doc.has_exercise_validation_errors());
        assert_eq!(doc.validate_totals(), Vec::<String>::new());
    }

    #[test]
    fn test_within_one_cent_is_valid() {
        let mut doc = reconciled();
        doc.exercise_summaries[0].amounts.voluntaria += dec!(0.01);
        assert!(!doc.has_exercise_validation_errors());
    }

    #[test]
    fn test_year_mismatch_reports_each_field() {
        let mut doc = reconciled();
        doc.exercise_summaries[1].amounts.voluntaria += dec!(1.00);
        doc.exercise_summaries[1].amounts.liquido -= dec!(0.02);
        let by_year = doc.validate_exercise_summaries();
        assert!(by_year[&2023].is_valid);
        let v = &by_year[&2024];
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 2);
        assert!(v.errors[0].starts_with("Voluntaria:"));
        assert!(v.errors[1].starts_with("Líquido:"));
        assert!(doc.has_exercise_validation_errors());
    }

    #[test]
    fn test_summary_without_records() {
        let mut doc = reconciled();
        doc.exercise_summaries.push(ExerciseSummary {
            ejercicio: 2019,
            amounts: amounts(dec!(1.00), dec!(0)),
        });
        let v = &doc.validate_exercise_summaries()[&2019];
        assert!(!v.is_valid);
        assert_eq!(v.calculated, Amounts::default());
    }

    #[test]
    fn test_grand_total_mismatch() {
        let mut doc = reconciled();
        doc.totals.amounts.recargo += dec!(0.05);
        let errors = doc.validate_totals();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Recargo total:"));
    }

    #[test]
    fn test_a_liquidar_mismatch() {
        let mut doc = reconciled();
        doc.totals.a_liquidar += dec!(1.00);
        let errors = doc.validate_totals();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("A liquidar:"));
    }

    #[test]
    fn test_absent_deductions_count_as_zero() {
        let mut doc = reconciled();
        doc.deductions = None;
        doc.totals.a_liquidar = doc.totals.amounts.liquido;
        assert!(doc.validate_totals().is_empty());
    }

    #[test]
    fn test_tolerance_is_one_cent() {
        assert_eq!(TOLERANCE, dec!(0.01));
    }
}
