pub mod assemble;
pub mod classify;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod reconstruct;
pub mod settings;
pub mod totals;
pub mod validate;

use error::LiquidaError;
use extraction::{PageContent, TableDetector};
use model::LiquidationDocument;
use reconstruct::{reconstruct_page, ReconstructionState};
use settings::TableSettings;
use std::path::Path;

/// Extract a liquidación document from a PDF file.
///
/// Any failure is reported as [`LiquidaError::Extraction`] carrying `path`.
pub fn extract(
    path: impl AsRef<Path>,
    settings: &TableSettings,
    detector: &dyn TableDetector,
) -> Result<LiquidationDocument, LiquidaError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| LiquidaError::from(e).for_document(path))?;
    extract_pdf(&bytes, detector, settings).map_err(|e| e.for_document(path))
}

/// Main API entry point: reconstruct records, summaries and totals from PDF bytes.
///
/// Pages are processed strictly in order. The last page is reserved for
/// totals unless it is the only one. A page the detector could not read is
/// skipped and noted in the document's warnings.
pub fn extract_pdf(
    pdf_bytes: &[u8],
    detector: &dyn TableDetector,
    settings: &TableSettings,
) -> Result<LiquidationDocument, LiquidaError> {
    let pages = detector.detect_pages(pdf_bytes, settings)?;
    let Some(first) = pages.first() else {
        return Err(LiquidaError::InvalidPdf("document has no pages".into()));
    };
    tracing::debug!(
        backend = detector.backend_name(),
        pages = pages.len(),
        "extracting liquidación"
    );

    let mut doc = LiquidationDocument {
        header: parsing::parse_header(&first.text),
        ..LiquidationDocument::default()
    };
    for field in parsing::header::missing_required(&doc.header) {
        doc.warnings.push(format!("header field not found: {field}"));
    }

    let record_pages = match pages.len() {
        1 => &pages[..],
        n => &pages[..n - 1],
    };
    let mut state = ReconstructionState::default();
    for page in record_pages {
        let tables = match page.tables() {
            Ok([]) => {
                tracing::warn!(page = page.page_number, "no tables found; page skipped");
                doc.warnings
                    .push(format!("no tables found on page {}", page.page_number));
                continue;
            }
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!(error = %e, "page skipped");
                doc.warnings.push(e.to_string());
                continue;
            }
        };

        let (next, out) = reconstruct_page(state, tables);
        state = next;
        if out.replaces_previous_record {
            doc.tribute_records.pop();
        }
        doc.tribute_records.extend(out.records);
        doc.exercise_summaries.extend(out.summaries);
    }

    let report = totals::locate_totals(&pages);
    if !report.found() {
        tracing::warn!("totals table not found; totals left at zero");
        doc.warnings
            .push("totals table not found; totals left at zero".into());
    }
    doc.totals = report.totals;
    doc.deductions = report.deductions;
    doc.advance_breakdown = report.advance_breakdown;

    if let Some(page) = refunds_page(&pages) {
        let (records, summaries) = totals::extract_refunds(page.tables()?);
        doc.refund_records = records;
        doc.refund_summaries = summaries;
    }

    Ok(doc)
}

/// Refunds sit on the last page of documents with three or more pages; the
/// third page stands in when the last one could not be read.
fn refunds_page(pages: &[PageContent]) -> Option<&PageContent> {
    if pages.len() < 3 {
        return None;
    }
    let readable = |p: &&PageContent| p.tables().is_ok();
    let page = pages
        .last()
        .filter(readable)
        .or_else(|| pages.get(2).filter(readable));
    if page.is_none() {
        tracing::warn!("refunds page unreadable; refunds skipped");
    }
    page
}
