use crate::stats::MetricKind;

/// Thousands-grouped rendering with at most three fraction digits,
/// e.g. `1234567.891` → `1,234,567.891`, `1000` → `1,000`.
pub fn format_grouped(v: f64) -> String {
    if !v.is_finite() {
        return "-".to_string();
    }
    let fixed = format!("{:.3}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = v < 0.0 && (int_part != "0" || !frac.is_empty());
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

/// Two decimals with a trailing `%` for percentage metrics, grouped otherwise.
pub fn format_value(v: f64, kind: MetricKind) -> String {
    match kind {
        MetricKind::Percentage => format!("{:.2}%", v),
        MetricKind::Plain => format_grouped(v),
    }
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
