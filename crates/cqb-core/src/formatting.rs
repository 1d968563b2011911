use serde_json::Value;

use crate::domain::QuoteRecord;

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a scalar JSON field for display. Strings lose their quotes, absent or
/// null fields become `-`.
pub fn display_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One bullet line per caución: term, rate and last price.
pub fn format_caucion_line(record: &QuoteRecord) -> String {
    let plazo = escape_html(&display_field(record.field("plazo")));
    let tasa = escape_html(&display_field(record.field("tasa")));
    let ultimo = escape_html(&display_field(record.field("ultimoPrecio")));
    format!("• Plazo: {plazo} días | Tasa: {tasa}% | Último: {ultimo}")
}

/// Reply body for the `/cauciones` command. Callers pick how many rows to pass.
pub fn format_cauciones(records: &[QuoteRecord], market: &str) -> String {
    let mut out = format!(
        "📊 <b>Cauciones disponibles en {}:</b>\n\n",
        escape_html(market)
    );

    if records.is_empty() {
        out.push_str("No hay cauciones disponibles en este momento.");
        return out;
    }

    let lines = records
        .iter()
        .map(format_caucion_line)
        .collect::<Vec<_>>()
        .join("\n");
    out.push_str(&lines);
    out
}
