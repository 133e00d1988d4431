use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount '{raw}': {reason}")]
pub struct AmountError {
    pub raw: String,
    pub reason: String,
}

/// Parse a monetary cell, tolerating both separator conventions.
///
/// Handles formats like:
/// - "1.234,56" -> 1234.56 (European: dot thousands, comma decimal)
/// - "1,234.56" -> 1234.56 (American: comma thousands, dot decimal)
/// - "0,50" -> 0.50 (comma only is always a decimal comma)
/// - "1234.56" -> 1234.56 (dot only is left as-is)
/// - "", "-" -> 0
///
/// When both separators appear, the one occurring last is the decimal point.
pub fn try_parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(Decimal::ZERO);
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    let normalized = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        _ => compact,
    };

    Decimal::from_str(&normalized).map_err(|e| AmountError {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Lenient variant used by extraction: anything unparseable becomes zero.
///
/// A malformed cell must not abort an otherwise valid document; the
/// cross-validator surfaces the resulting total mismatch instead.
pub fn parse_amount(raw: Option<&str>) -> Decimal {
    match raw {
        None => Decimal::ZERO,
        Some(s) => try_parse_amount(s).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "amount coerced to zero");
            Decimal::ZERO
        }),
    }
}
