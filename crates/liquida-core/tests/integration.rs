//! Integration tests for extract_pdf() end-to-end pipeline.
//!
//! Uses a MockDetector that returns pre-built PageContent without invoking
//! pdfplumber, so these tests run without Python.

use liquida_core::error::LiquidaError;
use liquida_core::extraction::{PageContent, Row, Table, TableDetector};
use liquida_core::settings::builtin::load_preset;
use liquida_core::settings::TableSettings;
use liquida_core::{extract, extract_pdf};
use rust_decimal_macros::dec;
use std::sync::Mutex;

struct MockDetector {
    pages: Vec<PageContent>,
    seen_settings: Mutex<Option<TableSettings>>,
}

impl MockDetector {
    fn new(pages: Vec<PageContent>) -> Self {
        MockDetector {
            pages,
            seen_settings: Mutex::new(None),
        }
    }
}

impl TableDetector for MockDetector {
    fn detect_pages(
        &self,
        _pdf_bytes: &[u8],
        settings: &TableSettings,
    ) -> Result<Vec<PageContent>, LiquidaError> {
        *self.seen_settings.lock().unwrap() = Some(settings.clone());
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct FailingDetector;

impl TableDetector for FailingDetector {
    fn detect_pages(
        &self,
        _pdf_bytes: &[u8],
        _settings: &TableSettings,
    ) -> Result<Vec<PageContent>, LiquidaError> {
        Err(LiquidaError::DetectorNotFound("python3".into()))
    }

    fn backend_name(&self) -> &str {
        "failing"
    }
}

fn row(cells: &[&str]) -> Row {
    cells
        .iter()
        .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
        .collect()
}

fn page(number: usize, text: &str, tables: Vec<Table>) -> PageContent {
    PageContent {
        page_number: number,
        text: text.into(),
        tables,
        error: None,
    }
}

fn column_header() -> Row {
    row(&[
        "CONCEPTO",
        "CLAVE CONTABILIDAD",
        "CLAVE RECAUDACIÓN",
        "VOLUNTARIA",
        "EJECUTIVA",
        "RECARGO",
        "DIP. VOLUNTARIA",
        "DIP. EJECUTIVA",
        "DIP. RECARGO",
        "LÍQUIDO",
    ])
}

const HEADER_TEXT: &str = "\
DOCUMENTO DE LIQUIDACIÓN EJERCICIO 2025
Mandamiento de pago: 2025/1234
Fecha de mandamiento: 14/03/2025
Número de liquidación: 623
(016) AYUNTAMIENTO DE EJEMPLO";

fn records_page_one() -> PageContent {
    page(
        1,
        HEADER_TEXT,
        vec![vec![
            column_header(),
            row(&[
                "IBI URBANA",
                "2024/U/0000001",
                "026/2024/20/100/208",
                "1.000,00",
                "0,00",
                "0,00",
                "100,00",
                "0,00",
                "0,00",
                "900,00",
            ]),
            row(&[
                "IAE",
                "2024/A/0000002",
                "026/2024/30/100/210",
                "200,00",
                "50,00",
                "5,00",
                "20,00",
                "5,00",
                "0,50",
                "229,50",
            ]),
            row(&[
                "TOTAL EJERCICIO",
                "",
                "2024",
                "1.200,00",
                "50,00",
                "5,00",
                "120,00",
                "5,00",
                "0,50",
                "1.129,50",
            ]),
            row(&[
                "TASA",
                "2025/T/0000003",
                "026/2025/40/100/300",
                "300,00",
                "0,00",
                "0,00",
                "30,00",
                "0,00",
                "0,00",
                "270,00",
            ]),
        ]],
    )
}

fn records_page_two() -> PageContent {
    page(
        2,
        "",
        vec![vec![
            column_header(),
            // Tail of the last record on page one.
            row(&["BASURAS", "", "", "", "", "", "", "", "", ""]),
            row(&[
                "MULTAS\nTRAFICO",
                "2025/M/0000731\n2025/M/0000732",
                "026/2025/40/100/400",
                "10,00\n20,00",
                "",
                "",
                "1,00\n2,00",
                "",
                "",
                "9,00\n18,00",
            ]),
            row(&[
                "TOTAL EJERCICIO",
                "",
                "2025",
                "330,00",
                "0,00",
                "0,00",
                "33,00",
                "0,00",
                "0,00",
                "297,00",
            ]),
        ]],
    )
}

fn totals_page(number: usize) -> PageContent {
    page(
        number,
        "RESUMEN\nIMPORTE A LIQUIDAR 1.000,00",
        vec![
            vec![
                row(&["TOTAL", ""]),
                row(&[
                    "VOLUNTARIA 1.530,00\nEJECUTIVA 50,00\nRECARGO 5,00\n\
                     DIPUTACIÓN VOLUNTARIA 153,00\nDIPUTACIÓN EJECUTIVA 5,00\n\
                     DIPUTACIÓN RECARGO 0,50",
                    "",
                ]),
                row(&["LÍQUIDO 1.426,50", ""]),
            ],
            vec![
                row(&["DEDUCCIONES"]),
                row(&["RECAUDACIÓN\n- TASA VOLUNTARIA 26,50\n- ANTICIPOS 400,00"]),
            ],
            vec![
                row(&["EJERCICIO", "URBANA", "RUSTICA", "VEHICULOS", "BICE", "IAE", "TASAS", "EJECUTIVA"]),
                row(&["2025", "300,00", "20,00", "50,00", "0,00", "25,00", "5,00", "0,00"]),
            ],
            vec![
                row(&["Nº EXPTE", "RESOLUCIÓN", "SOLIC", "TOTAL", "ENTIDAD", "DIPUTACIÓN", "INTERESES"]),
                row(&["2025/77", "R-1", "1", "50,00", "45,00", "5,00", "0,00"]),
                row(&["URBANA", "50,00", "45,00", "5,00", "0,00", "", ""]),
            ],
        ],
    )
}

fn three_page_document() -> MockDetector {
    MockDetector::new(vec![records_page_one(), records_page_two(), totals_page(3)])
}

// ---------------------------------------------------------------------------
// Test 1: Full document reconstructs, reconciles and carries every section
// ---------------------------------------------------------------------------
#[test]
fn full_document_reconstructs_and_validates() {
    let doc = extract_pdf(&[], &three_page_document(), &TableSettings::new()).unwrap();

    assert_eq!(doc.header.ejercicio, Some(2025));
    assert_eq!(doc.header.numero_liquidacion.as_deref(), Some("623"));
    assert_eq!(doc.header.codigo_entidad.as_deref(), Some("016"));

    let concepts: Vec<&str> = doc
        .tribute_records
        .iter()
        .map(|r| r.concepto.as_str())
        .collect();
    assert_eq!(
        concepts,
        ["IBI URBANA", "IAE", "TASA BASURAS", "MULTAS TRAFICO", "MULTAS TRAFICO"]
    );
    assert_eq!(doc.years(), [2024, 2025]);
    assert_eq!(doc.records_by_year(2025).len(), 3);

    assert_eq!(doc.exercise_summaries.len(), 2);
    assert_eq!(doc.totals.amounts.voluntaria, dec!(1530.00));
    assert_eq!(doc.totals.amounts.diputacion_voluntaria, dec!(153.00));
    assert_eq!(doc.totals.amounts.liquido, dec!(1426.50));
    assert_eq!(doc.totals.a_liquidar, dec!(1000.00));
    assert_eq!(doc.deductions.as_ref().unwrap().total(), dec!(426.50));

    assert_eq!(doc.advance_breakdown.len(), 1);
    assert_eq!(doc.advance_breakdown[0].urbana, dec!(300.00));
    assert_eq!(doc.refund_records.len(), 1);
    assert_eq!(doc.refund_records[0].num_expte, "2025/77");
    assert_eq!(doc.refund_summaries.len(), 1);

    assert!(!doc.has_exercise_validation_errors());
    assert!(doc.validate_totals().is_empty(), "{:?}", doc.validate_totals());
    assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);
}

// ---------------------------------------------------------------------------
// Test 2: Cross-page backward merge replaces the anchor's record
// ---------------------------------------------------------------------------
#[test]
fn cross_page_backward_merge_drops_exactly_one_record() {
    let doc = extract_pdf(&[], &three_page_document(), &TableSettings::new()).unwrap();

    // Page one emits 3 records, page two emits 1 merged + 2 split records.
    assert_eq!(doc.total_records(), 3 + 3 - 1);
    let merged = &doc.records_by_concept("TASA BASURAS");
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].clave_contabilidad, "2025/T/0000003");
    assert_eq!(merged[0].amounts.liquido, dec!(270.00));
    assert!(doc.records_by_concept("TASA").is_empty());
}

// ---------------------------------------------------------------------------
// Test 3: Multi-record row yields distinct keys with per-line amounts
// ---------------------------------------------------------------------------
#[test]
fn merged_records_split_per_line() {
    let doc = extract_pdf(&[], &three_page_document(), &TableSettings::new()).unwrap();

    let multas = doc.records_by_concept("MULTAS TRAFICO");
    assert_eq!(multas.len(), 2);
    assert_eq!(multas[0].clave_contabilidad, "2025/M/0000731");
    assert_eq!(multas[1].clave_contabilidad, "2025/M/0000732");
    assert_eq!(multas[0].amounts.voluntaria, dec!(10.00));
    assert_eq!(multas[1].amounts.liquido, dec!(18.00));
    assert!(multas.iter().all(|r| r.clave_recaudacion == "026/2025/40/100/400"));
}

// ---------------------------------------------------------------------------
// Test 4: Same input, same output
// ---------------------------------------------------------------------------
#[test]
fn extraction_is_idempotent() {
    let detector = three_page_document();
    let settings = load_preset("lines").unwrap().settings;
    let first = extract_pdf(&[], &detector, &settings).unwrap();
    let second = extract_pdf(&[], &detector, &settings).unwrap();

    assert_eq!(first.tribute_records, second.tribute_records);
    assert_eq!(first.totals, second.totals);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Test 5: Settings reach the detector unmodified
// ---------------------------------------------------------------------------
#[test]
fn settings_passed_through_to_detector() {
    let detector = three_page_document();
    let mut settings = load_preset("lines-strict").unwrap().settings;
    settings.apply_override("snap_tolerance=4").unwrap();
    settings.apply_override("custom_key=kept").unwrap();

    extract_pdf(&[], &detector, &settings).unwrap();

    let seen = detector.seen_settings.lock().unwrap().clone();
    assert_eq!(seen, Some(settings));
}

// ---------------------------------------------------------------------------
// Test 6: A page the detector could not read is skipped, state survives
// ---------------------------------------------------------------------------
#[test]
fn failed_page_is_skipped_with_warning() {
    let mut broken = records_page_two();
    broken.error = Some("malformed content stream".into());
    let continuation = page(
        3,
        "",
        vec![vec![row(&["RECOGIDA", "", "", "", "", "", "", "", "", ""])]],
    );
    let detector = MockDetector::new(vec![
        records_page_one(),
        broken,
        continuation,
        totals_page(4),
    ]);

    let doc = extract_pdf(&[], &detector, &TableSettings::new()).unwrap();

    assert!(doc
        .warnings
        .iter()
        .any(|w| w.contains("page 2") && w.contains("malformed content stream")));
    // The anchor from page one still absorbs the partial row on page three.
    let concepts: Vec<&str> = doc
        .tribute_records
        .iter()
        .map(|r| r.concepto.as_str())
        .collect();
    assert_eq!(concepts, ["IBI URBANA", "IAE", "TASA RECOGIDA"]);
}

// ---------------------------------------------------------------------------
// Test 7: Concept-only row before any record waits for its data
// ---------------------------------------------------------------------------
#[test]
fn leading_partial_row_merges_forward_across_pages() {
    let detector = MockDetector::new(vec![
        page(
            1,
            HEADER_TEXT,
            vec![vec![
                column_header(),
                row(&["IMPUESTO VEHICULOS", "", "", "", "", "", "", "", "", ""]),
            ]],
        ),
        page(
            2,
            "",
            vec![vec![
                column_header(),
                row(&[
                    "TRACCION MECANICA",
                    "2025/V/0000010",
                    "026/2025/50/100/500",
                    "80,00",
                    "",
                    "",
                    "8,00",
                    "",
                    "",
                    "72,00",
                ]),
            ]],
        ),
        totals_page(3),
    ]);

    let doc = extract_pdf(&[], &detector, &TableSettings::new()).unwrap();

    assert_eq!(doc.total_records(), 1);
    assert_eq!(
        doc.tribute_records[0].concepto,
        "IMPUESTO VEHICULOS TRACCION MECANICA"
    );
    assert_eq!(doc.tribute_records[0].amounts.liquido, dec!(72.00));
}

// ---------------------------------------------------------------------------
// Test 8: Missing totals table degrades to zero totals plus a warning
// ---------------------------------------------------------------------------
#[test]
fn missing_totals_is_a_warning() {
    let detector = MockDetector::new(vec![records_page_one()]);
    let doc = extract_pdf(&[], &detector, &TableSettings::new()).unwrap();

    assert_eq!(doc.total_records(), 3);
    assert_eq!(doc.totals.amounts.liquido, dec!(0));
    assert!(doc.deductions.is_none());
    assert!(doc.warnings.iter().any(|w| w.contains("totals table not found")));
    assert!(!doc.validate_totals().is_empty());
}

// ---------------------------------------------------------------------------
// Test 9: Page with no tables is skipped
// ---------------------------------------------------------------------------
#[test]
fn page_without_tables_is_skipped() {
    let detector = MockDetector::new(vec![
        records_page_one(),
        page(2, "Página en blanco", vec![]),
        totals_page(3),
    ]);
    let doc = extract_pdf(&[], &detector, &TableSettings::new()).unwrap();

    assert_eq!(doc.total_records(), 3);
    assert!(doc.warnings.iter().any(|w| w == "no tables found on page 2"));
}

// ---------------------------------------------------------------------------
// Test 10: Missing header fields are reported
// ---------------------------------------------------------------------------
#[test]
fn missing_header_fields_are_warnings() {
    let mut first = records_page_one();
    first.text = "EJERCICIO 2025".into();
    let detector = MockDetector::new(vec![first, totals_page(2)]);
    let doc = extract_pdf(&[], &detector, &TableSettings::new()).unwrap();

    assert_eq!(doc.header.ejercicio, Some(2025));
    assert!(doc
        .warnings
        .iter()
        .any(|w| w == "header field not found: mandamiento de pago"));
}

// ---------------------------------------------------------------------------
// Test 11: Fatal errors
// ---------------------------------------------------------------------------
#[test]
fn document_without_pages_is_an_error() {
    let detector = MockDetector::new(vec![]);
    let err = extract_pdf(&[], &detector, &TableSettings::new()).unwrap_err();
    assert!(matches!(err, LiquidaError::InvalidPdf(_)));
}

#[test]
fn detector_failure_propagates() {
    let err = extract_pdf(&[], &FailingDetector, &TableSettings::new()).unwrap_err();
    assert!(matches!(err, LiquidaError::DetectorNotFound(_)));
}

#[test]
fn extract_wraps_errors_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.pdf");
    let err = extract(&missing, &TableSettings::new(), &three_page_document()).unwrap_err();
    match err {
        LiquidaError::Extraction { path, source } => {
            assert_eq!(path, missing);
            assert!(matches!(*source, LiquidaError::Io(_)));
        }
        other => panic!("expected Extraction error, got {other:?}"),
    }
}

#[test]
fn extract_reads_file_and_wraps_detector_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("liquidacion.pdf");
    std::fs::write(&file, b"%PDF-1.4\n").unwrap();

    let doc = extract(&file, &TableSettings::new(), &three_page_document()).unwrap();
    assert_eq!(doc.total_records(), 5);

    let err = extract(&file, &TableSettings::new(), &FailingDetector).unwrap_err();
    assert!(err.to_string().contains("liquidacion.pdf"));
}
