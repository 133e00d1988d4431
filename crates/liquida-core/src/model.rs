use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// The seven monetary columns shared by records, year summaries and grand totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amounts {
    pub voluntaria: Decimal,
    pub ejecutiva: Decimal,
    pub recargo: Decimal,
    pub diputacion_voluntaria: Decimal,
    pub diputacion_ejecutiva: Decimal,
    pub diputacion_recargo: Decimal,
    pub liquido: Decimal,
}

/// Names one of the seven amount columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
    Voluntaria,
    Ejecutiva,
    Recargo,
    DiputacionVoluntaria,
    DiputacionEjecutiva,
    DiputacionRecargo,
    Liquido,
}

impl AmountField {
    /// Column order as printed in the liquidación tables (indices 3..=9).
    pub const ALL: [AmountField; 7] = [
        AmountField::Voluntaria,
        AmountField::Ejecutiva,
        AmountField::Recargo,
        AmountField::DiputacionVoluntaria,
        AmountField::DiputacionEjecutiva,
        AmountField::DiputacionRecargo,
        AmountField::Liquido,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AmountField::Voluntaria => "Voluntaria",
            AmountField::Ejecutiva => "Ejecutiva",
            AmountField::Recargo => "Recargo",
            AmountField::DiputacionVoluntaria => "Diputación voluntaria",
            AmountField::DiputacionEjecutiva => "Diputación ejecutiva",
            AmountField::DiputacionRecargo => "Diputación recargo",
            AmountField::Liquido => "Líquido",
        }
    }
}

impl fmt::Display for AmountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Amounts {
    pub fn get(&self, field: AmountField) -> Decimal {
        match field {
            AmountField::Voluntaria => self.voluntaria,
            AmountField::Ejecutiva => self.ejecutiva,
            AmountField::Recargo => self.recargo,
            AmountField::DiputacionVoluntaria => self.diputacion_voluntaria,
            AmountField::DiputacionEjecutiva => self.diputacion_ejecutiva,
            AmountField::DiputacionRecargo => self.diputacion_recargo,
            AmountField::Liquido => self.liquido,
        }
    }

    pub fn get_mut(&mut self, field: AmountField) -> &mut Decimal {
        match field {
            AmountField::Voluntaria => &mut self.voluntaria,
            AmountField::Ejecutiva => &mut self.ejecutiva,
            AmountField::Recargo => &mut self.recargo,
            AmountField::DiputacionVoluntaria => &mut self.diputacion_voluntaria,
            AmountField::DiputacionEjecutiva => &mut self.diputacion_ejecutiva,
            AmountField::DiputacionRecargo => &mut self.diputacion_recargo,
            AmountField::Liquido => &mut self.liquido,
        }
    }

    /// Build from values in column order; missing trailing values are zero.
    pub fn from_columns(values: impl IntoIterator<Item = Decimal>) -> Amounts {
        let mut amounts = Amounts::default();
        for (field, value) in AmountField::ALL.into_iter().zip(values) {
            *amounts.get_mut(field) = value;
        }
        amounts
    }
}

impl Add for Amounts {
    type Output = Amounts;

    fn add(mut self, rhs: Amounts) -> Amounts {
        self += rhs;
        self
    }
}

impl AddAssign for Amounts {
    fn add_assign(&mut self, rhs: Amounts) {
        for field in AmountField::ALL {
            *self.get_mut(field) += rhs.get(field);
        }
    }
}

impl Sum for Amounts {
    fn sum<I: Iterator<Item = Amounts>>(iter: I) -> Amounts {
        iter.fold(Amounts::default(), Add::add)
    }
}

impl<'a> Sum<&'a Amounts> for Amounts {
    fn sum<I: Iterator<Item = &'a Amounts>>(iter: I) -> Amounts {
        iter.copied().sum()
    }
}

/// One accounting line of the main liquidación table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TributeRecord {
    pub concepto: String,
    pub clave_contabilidad: String,
    pub clave_recaudacion: String,
    pub amounts: Amounts,
    pub ejercicio: i32,
}

impl TributeRecord {
    /// Concept code: the last segment of the collection key
    /// (`026/2024/20/100/208` -> `208`).
    pub fn concept_code(&self) -> &str {
        self.clave_recaudacion
            .rsplit('/')
            .next()
            .map(str::trim)
            .unwrap_or("")
    }
}

/// A "TOTAL EJERCICIO" row: what the document declares for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub ejercicio: i32,
    pub amounts: Amounts,
}

/// Deduction breakdown from the totals page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionDetail {
    // Recaudación
    pub tasa_voluntaria: Decimal,
    pub tasa_ejecutiva: Decimal,
    pub tasa_ejecutiva_sin_recargo: Decimal,
    pub tasa_baja_organo_gestor_deleg: Decimal,
    // Gestión tributaria
    pub tasa_gestion_tributaria: Decimal,
    pub tasa_gestion_censal: Decimal,
    pub tasa_gestion_catastral: Decimal,
    // Multas y sanciones
    pub tasa_sancion_tributaria: Decimal,
    pub tasa_sancion_recaudacion: Decimal,
    pub tasa_sancion_inspeccion: Decimal,
    pub tasa_multas_trafico: Decimal,
    // Otras deducciones
    pub gastos_repercutidos: Decimal,
    pub anticipos: Decimal,
    pub intereses_por_anticipo: Decimal,
    pub expedientes_compensacion: Decimal,
    pub expedientes_ingresos_indebidos: Decimal,
}

/// Names one field of [`DeductionDetail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeductionField {
    TasaVoluntaria,
    TasaEjecutiva,
    TasaEjecutivaSinRecargo,
    TasaBajaOrganoGestorDeleg,
    TasaGestionTributaria,
    TasaGestionCensal,
    TasaGestionCatastral,
    TasaSancionTributaria,
    TasaSancionRecaudacion,
    TasaSancionInspeccion,
    TasaMultasTrafico,
    GastosRepercutidos,
    Anticipos,
    InteresesPorAnticipo,
    ExpedientesCompensacion,
    ExpedientesIngresosIndebidos,
}

impl DeductionField {
    pub const ALL: [DeductionField; 16] = [
        DeductionField::TasaVoluntaria,
        DeductionField::TasaEjecutiva,
        DeductionField::TasaEjecutivaSinRecargo,
        DeductionField::TasaBajaOrganoGestorDeleg,
        DeductionField::TasaGestionTributaria,
        DeductionField::TasaGestionCensal,
        DeductionField::TasaGestionCatastral,
        DeductionField::TasaSancionTributaria,
        DeductionField::TasaSancionRecaudacion,
        DeductionField::TasaSancionInspeccion,
        DeductionField::TasaMultasTrafico,
        DeductionField::GastosRepercutidos,
        DeductionField::Anticipos,
        DeductionField::InteresesPorAnticipo,
        DeductionField::ExpedientesCompensacion,
        DeductionField::ExpedientesIngresosIndebidos,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DeductionField::TasaVoluntaria => "Tasa voluntaria",
            DeductionField::TasaEjecutiva => "Tasa ejecutiva",
            DeductionField::TasaEjecutivaSinRecargo => "Tasa ejecutiva sin recargo",
            DeductionField::TasaBajaOrganoGestorDeleg => "Tasa baja órgano gestor deleg.",
            DeductionField::TasaGestionTributaria => "Tasa gestión tributaria",
            DeductionField::TasaGestionCensal => "Tasa gestión censal",
            DeductionField::TasaGestionCatastral => "Tasa gestión catastral",
            DeductionField::TasaSancionTributaria => "Tasa sanción tributaria",
            DeductionField::TasaSancionRecaudacion => "Tasa sanción recaudación",
            DeductionField::TasaSancionInspeccion => "Tasa sanción inspección",
            DeductionField::TasaMultasTrafico => "Tasa multas de tráfico",
            DeductionField::GastosRepercutidos => "Gastos repercutidos",
            DeductionField::Anticipos => "Anticipos",
            DeductionField::InteresesPorAnticipo => "Intereses por anticipo",
            DeductionField::ExpedientesCompensacion => "Expedientes compensación",
            DeductionField::ExpedientesIngresosIndebidos => "Expedientes ingresos indebidos",
        }
    }
}

impl DeductionDetail {
    pub fn get(&self, field: DeductionField) -> Decimal {
        match field {
            DeductionField::TasaVoluntaria => self.tasa_voluntaria,
            DeductionField::TasaEjecutiva => self.tasa_ejecutiva,
            DeductionField::TasaEjecutivaSinRecargo => self.tasa_ejecutiva_sin_recargo,
            DeductionField::TasaBajaOrganoGestorDeleg => self.tasa_baja_organo_gestor_deleg,
            DeductionField::TasaGestionTributaria => self.tasa_gestion_tributaria,
            DeductionField::TasaGestionCensal => self.tasa_gestion_censal,
            DeductionField::TasaGestionCatastral => self.tasa_gestion_catastral,
            DeductionField::TasaSancionTributaria => self.tasa_sancion_tributaria,
            DeductionField::TasaSancionRecaudacion => self.tasa_sancion_recaudacion,
            DeductionField::TasaSancionInspeccion => self.tasa_sancion_inspeccion,
            DeductionField::TasaMultasTrafico => self.tasa_multas_trafico,
            DeductionField::GastosRepercutidos => self.gastos_repercutidos,
            DeductionField::Anticipos => self.anticipos,
            DeductionField::InteresesPorAnticipo => self.intereses_por_anticipo,
            DeductionField::ExpedientesCompensacion => self.expedientes_compensacion,
            DeductionField::ExpedientesIngresosIndebidos => self.expedientes_ingresos_indebidos,
        }
    }

    pub fn get_mut(&mut self, field: DeductionField) -> &mut Decimal {
        match field {
            DeductionField::TasaVoluntaria => &mut self.tasa_voluntaria,
            DeductionField::TasaEjecutiva => &mut self.tasa_ejecutiva,
            DeductionField::TasaEjecutivaSinRecargo => &mut self.tasa_ejecutiva_sin_recargo,
            DeductionField::TasaBajaOrganoGestorDeleg => &mut self.tasa_baja_organo_gestor_deleg,
            DeductionField::TasaGestionTributaria => &mut self.tasa_gestion_tributaria,
            DeductionField::TasaGestionCensal => &mut self.tasa_gestion_censal,
            DeductionField::TasaGestionCatastral => &mut self.tasa_gestion_catastral,
            DeductionField::TasaSancionTributaria => &mut self.tasa_sancion_tributaria,
            DeductionField::TasaSancionRecaudacion => &mut self.tasa_sancion_recaudacion,
            DeductionField::TasaSancionInspeccion => &mut self.tasa_sancion_inspeccion,
            DeductionField::TasaMultasTrafico => &mut self.tasa_multas_trafico,
            DeductionField::GastosRepercutidos => &mut self.gastos_repercutidos,
            DeductionField::Anticipos => &mut self.anticipos,
            DeductionField::InteresesPorAnticipo => &mut self.intereses_por_anticipo,
            DeductionField::ExpedientesCompensacion => &mut self.expedientes_compensacion,
            DeductionField::ExpedientesIngresosIndebidos => {
                &mut self.expedientes_ingresos_indebidos
            }
        }
    }

    /// Sum of every deduction field.
    pub fn total(&self) -> Decimal {
        DeductionField::ALL.iter().map(|f| self.get(*f)).sum()
    }
}

/// Per-year advance breakdown ("anticipos") on the totals page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceBreakdown {
    pub ejercicio: i32,
    pub urbana: Decimal,
    pub rustica: Decimal,
    pub vehiculos: Decimal,
    pub bice: Decimal,
    pub iae: Decimal,
    pub tasas: Decimal,
    pub ejecutiva: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRecord {
    pub num_expte: String,
    pub num_resolucion: String,
    pub num_solic: u32,
    pub total_devolucion: Decimal,
    pub entidad: Decimal,
    pub diputacion: Decimal,
    pub intereses: Decimal,
    pub comp_trib: Decimal,
    pub a_deducir: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundSummary {
    pub concepto: String,
    pub total_devolucion: Decimal,
    pub entidad: Decimal,
    pub diputacion: Decimal,
    pub intereses: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub ejercicio: Option<i32>,
    pub mandamiento_pago: Option<String>,
    pub fecha_mandamiento: Option<NaiveDate>,
    pub numero_liquidacion: Option<String>,
    pub entidad: Option<String>,
    pub codigo_entidad: Option<String>,
    pub codigo_verificacion: Option<String>,
    pub firmado_por: Option<String>,
    pub fecha_firma: Option<NaiveDateTime>,
}

/// Grand totals declared on the totals page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrandTotals {
    pub amounts: Amounts,
    pub a_liquidar: Decimal,
}

/// The aggregate extracted from one liquidación PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiquidationDocument {
    pub header: DocumentHeader,
    pub tribute_records: Vec<TributeRecord>,
    pub exercise_summaries: Vec<ExerciseSummary>,
    pub totals: GrandTotals,
    pub deductions: Option<DeductionDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advance_breakdown: Vec<AdvanceBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refund_records: Vec<RefundRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refund_summaries: Vec<RefundSummary>,
    /// Non-fatal findings: skipped pages, missing totals, missing header fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl LiquidationDocument {
    pub fn records_by_year(&self, ejercicio: i32) -> Vec<&TributeRecord> {
        self.tribute_records
            .iter()
            .filter(|r| r.ejercicio == ejercicio)
            .collect()
    }

    pub fn records_by_concept(&self, concepto: &str) -> Vec<&TributeRecord> {
        self.tribute_records
            .iter()
            .filter(|r| r.concepto == concepto)
            .collect()
    }

    /// Distinct fiscal years found in the records, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.tribute_records.iter().map(|r| r.ejercicio).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn total_records(&self) -> usize {
        self.tribute_records.len()
    }

    /// Field-wise sum of all record amounts.
    pub fn records_sum(&self) -> Amounts {
        self.tribute_records.iter().map(|r| &r.amounts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(ejercicio: i32, liquido: Decimal) -> TributeRecord {
        TributeRecord {
            concepto: "IBI URBANA".into(),
            clave_contabilidad: "2024/U/0000001".into(),
            clave_recaudacion: "026/2024/20/100/208".into(),
            amounts: Amounts {
                voluntaria: liquido,
                liquido,
                ..Amounts::default()
            },
            ejercicio,
        }
    }

    #[test]
    fn test_amounts_from_columns_in_order() {
        let a = Amounts::from_columns([dec!(1), dec!(2), dec!(3)]);
        assert_eq!(a.voluntaria, dec!(1));
        assert_eq!(a.ejecutiva, dec!(2));
        assert_eq!(a.recargo, dec!(3));
        assert_eq!(a.liquido, Decimal::ZERO);
    }

    #[test]
    fn test_amounts_sum_is_fieldwise() {
        let a = Amounts::from_columns([dec!(1.10); 7]);
        let b = Amounts::from_columns([dec!(2.05); 7]);
        let total: Amounts = [a, b].into_iter().sum();
        for field in AmountField::ALL {
            assert_eq!(total.get(field), dec!(3.15));
        }
    }

    #[test]
    fn test_concept_code() {
        let r = record(2024, dec!(1));
        assert_eq!(r.concept_code(), "208");
    }

    #[test]
    fn test_deduction_total() {
        let d = DeductionDetail {
            tasa_voluntaria: dec!(10.50),
            anticipos: dec!(100),
            expedientes_compensacion: dec!(0.25),
            ..DeductionDetail::default()
        };
        assert_eq!(d.total(), dec!(110.75));
    }

    #[test]
    fn test_years_sorted_and_distinct() {
        let doc = LiquidationDocument {
            tribute_records: vec![
                record(2024, dec!(1)),
                record(2022, dec!(1)),
                record(2024, dec!(1)),
            ],
            ..LiquidationDocument::default()
        };
        assert_eq!(doc.years(), vec![2022, 2024]);
        assert_eq!(doc.records_by_year(2024).len(), 2);
        assert_eq!(doc.total_records(), 3);
        assert_eq!(doc.records_sum().liquido, dec!(3));
    }
}
