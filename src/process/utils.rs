use once_cell::sync::Lazy;
use regex::Regex;

/// Cells the tokenizer types as numbers.
static NUMERIC_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?\s*$").expect("numeric cell regex")
});

/// Longest leading float literal, after leading whitespace.
static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("float prefix regex")
});

const CURRENCY_GLYPHS: &[char] = &['¥', '￥', '$', '€', '£'];

/// Whether the tokenizer should auto-type `s` as a number.
pub fn looks_numeric(s: &str) -> bool {
    NUMERIC_CELL.is_match(s)
}

/// Drop currency glyphs and thousands separators.
pub fn strip_currency(s: &str) -> String {
    s.chars()
        .filter(|c| *c != ',' && !CURRENCY_GLYPHS.contains(c))
        .collect()
}

/// Lenient float parse: leading whitespace skipped, the longest numeric
/// prefix wins and trailing junk is ignored. `"12abc"` → 12.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let (sign, body) = match s.chars().next() {
        Some('-') => (-1.0, &s[1..]),
        Some('+') => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if body.starts_with("Infinity") {
        return Some(sign * f64::INFINITY);
    }
    let m = FLOAT_PREFIX.find(s)?;
    m.as_str().parse().ok()
}
