use crate::model::DocumentHeader;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static EJERCICIO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"EJERCICIO\s+(\d{4})").expect("ejercicio regex"));
static MANDAMIENTO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mandamiento de pago:\s*([\d/]+)").expect("mandamiento regex"));
static FECHA_MANDAMIENTO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Fecha de mandamiento:\s*(\d{2}/\d{2}/\d{4})").expect("fecha mandamiento regex")
});
static NUMERO_LIQUIDACION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"N[úu]mero de liquidaci[óo]n:\s*(\d+)").expect("numero liquidacion regex")
});
static ENTIDAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\((\d+)\)[ \t]+(.+?)[ \t]*$").expect("entidad regex"));
static VERIFICACION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"C[óo]digo Seguro [Dd]e Verificaci[óo]n:\s*(\S+)").expect("verificacion regex")
});
static FIRMADO_POR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Firmado Por\s+(.+?)\s+Firmado").expect("firmado por regex"));
static FECHA_FIRMA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Firmado\s+(\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}:\d{2})").expect("fecha firma regex")
});

/// Extract the document header from the first page's text.
pub fn parse_header(text: &str) -> DocumentHeader {
    DocumentHeader {
        ejercicio: capture(&EJERCICIO_RE, text).and_then(|s| s.parse().ok()),
        mandamiento_pago: capture(&MANDAMIENTO_RE, text).map(str::to_string),
        fecha_mandamiento: capture(&FECHA_MANDAMIENTO_RE, text)
            .and_then(|s| NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()),
        numero_liquidacion: capture(&NUMERO_LIQUIDACION_RE, text).map(str::to_string),
        codigo_entidad: capture(&ENTIDAD_RE, text).map(str::to_string),
        entidad: ENTIDAD_RE
            .captures(text)
            .map(|c| c[2].trim().to_string())
            .filter(|s| !s.is_empty()),
        codigo_verificacion: capture(&VERIFICACION_RE, text).map(str::to_string),
        firmado_por: capture(&FIRMADO_POR_RE, text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        fecha_firma: capture(&FECHA_FIRMA_RE, text).and_then(parse_timestamp),
    }
}

/// Header fields every liquidación is expected to print.
pub fn missing_required(header: &DocumentHeader) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if header.ejercicio.is_none() {
        missing.push("ejercicio");
    }
    if header.mandamiento_pago.is_none() {
        missing.push("mandamiento de pago");
    }
    if header.fecha_mandamiento.is_none() {
        missing.push("fecha de mandamiento");
    }
    if header.numero_liquidacion.is_none() {
        missing.push("número de liquidación");
    }
    if header.entidad.is_none() {
        missing.push("entidad");
    }
    missing
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let compact = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&compact, "%d/%m/%Y %H:%M:%S").ok()
}
