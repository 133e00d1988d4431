use regex::Regex;
use std::sync::LazyLock;

/// Used when no key carries a year and no total row has been seen yet.
pub const DEFAULT_FISCAL_YEAR: i32 = 2025;

/// Plausible range for a bare 4-digit year inside a reference key.
pub const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 2000..=2030;

static PROVINCE_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"026/(\d{4})/").expect("province year regex"));

static FOUR_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}").expect("four digit regex"));

/// The two reference keys a year can be inferred from.
#[derive(Debug, Clone, Copy)]
pub struct YearSources<'a> {
    pub clave_contabilidad: &'a str,
    pub clave_recaudacion: &'a str,
}

pub type YearRule = fn(&YearSources<'_>) -> Option<i32>;

/// Inference rules, most authoritative first. The collection key is the
/// document's own year source; the accounting key is a secondary signal.
pub const YEAR_RULES: &[YearRule] = &[
    year_from_province_code,
    year_from_collection_key,
    year_from_accounting_key,
];

/// `026/YYYY/...` in the collection key.
pub fn year_from_province_code(src: &YearSources<'_>) -> Option<i32> {
    PROVINCE_YEAR_RE
        .captures(src.clave_recaudacion)
        .and_then(|c| c[1].parse().ok())
}

/// Any plausible bare year in the collection key.
pub fn year_from_collection_key(src: &YearSources<'_>) -> Option<i32> {
    plausible_year(src.clave_recaudacion)
}

/// Any plausible bare year in the accounting key.
pub fn year_from_accounting_key(src: &YearSources<'_>) -> Option<i32> {
    plausible_year(src.clave_contabilidad)
}

fn plausible_year(text: &str) -> Option<i32> {
    FOUR_DIGITS_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .find(|y| PLAUSIBLE_YEARS.contains(y))
}

/// Run the rules in order, then fall back to `hint`, then to [`DEFAULT_FISCAL_YEAR`].
pub fn infer_year(src: &YearSources<'_>, hint: Option<i32>) -> i32 {
    YEAR_RULES
        .iter()
        .find_map(|rule| rule(src))
        .or(hint)
        .unwrap_or(DEFAULT_FISCAL_YEAR)
}

/// First 4-digit run in `text`, without range checks (total rows print the
/// year verbatim).
pub fn first_four_digits(text: &str) -> Option<i32> {
    FOUR_DIGITS_RE.find(text).and_then(|m| m.as_str().parse().ok())
}
