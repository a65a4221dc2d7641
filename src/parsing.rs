use serde_json::Value;

const MISSING_SENTINELS: &[&str] = &["", "-", "na", "n/a", "nan", "none", "null", "#n/a"];

pub fn is_missing_sentinel(raw: &str) -> bool {
    let s = raw.trim().to_ascii_lowercase();
    MISSING_SENTINELS.contains(&s.as_str())
}

/// Parses a spreadsheet cell into a number. Sentinels and malformed text are missing, never zero.
pub fn parse_cell(raw: &str) -> Option<f64> {
    if is_missing_sentinel(raw) {
        return None;
    }
    let s = raw.trim().trim_end_matches('%').trim();
    // Sheets in a French locale export decimals with a comma.
    let cleaned = if s.contains(',') && !s.contains('.') {
        s.replace(',', ".")
    } else {
        s.replace(',', "")
    };
    let v = cleaned.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

pub fn parse_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_cell(s),
        _ => None,
    }
}

pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if is_missing_sentinel(s) => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

pub fn text_cell(raw: &str) -> Option<String> {
    if is_missing_sentinel(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

/// Leading four-digit year of `1998-04-02`, `1998` or `1998.0`.
pub fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse::<i32>().ok()
}
