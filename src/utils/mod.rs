use chrono::{DateTime, Utc};
use serde_json::Value;

/// Offset from an uppercase ASCII letter to its Unicode regional indicator
/// (`'A'` + 0x1F1A5 = U+1F1E6).
pub const REGIONAL_INDICATOR_OFFSET: u32 = 127_397;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Returns the normalized URL when it is an absolute `http`/`https` URL, or an
/// empty string for anything else.
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match reqwest::Url::parse(trimmed) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
            parsed.to_string()
        }
        _ => String::new(),
    }
}

pub fn country_flag(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() != 2 || !chars.iter().all(|c| c.is_ascii_alphabetic()) {
        return String::new();
    }
    chars
        .iter()
        .filter_map(|c| char::from_u32(c.to_ascii_uppercase() as u32 + REGIONAL_INDICATOR_OFFSET))
        .collect()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a number with `,` thousands separators and at most three fraction
/// digits.
pub fn format_decimal(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let rounded = format!("{:.3}", n.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');
    let mut out = String::new();
    if n < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Coerces a JSON value to a number the way a loosely-typed form field would:
/// blanks and `null` are zero, numeric strings parse, anything else is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Formats a count; values that are not numeric pass through as text.
pub fn format_count(value: Option<&Value>) -> String {
    let value = value.unwrap_or(&Value::Null);
    match coerce_number(value) {
        Some(n) => format_decimal(n),
        None => display_value(value),
    }
}

/// Formats an epoch timestamp. Values of up to ten digits are seconds, longer
/// ones milliseconds. Zero, missing and non-numeric values give an empty string.
pub fn format_timestamp(value: Option<&Value>) -> String {
    let n = match value.and_then(coerce_number) {
        Some(n) if n != 0.0 => n,
        _ => return String::new(),
    };
    let digits = format_decimal(n).replace(',', "");
    let millis = if digits.len() <= 10 { n * 1000.0 } else { n };
    match DateTime::<Utc>::from_timestamp_millis(millis as i64) {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => String::new(),
    }
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    format!("{} UTC", dt.format(TIMESTAMP_FORMAT))
}

/// Loose truthiness of a JSON value: `null`, `false`, `0`, `""` are false.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Returns the first truthy field among `keys`, rendered as text.
pub fn first_truthy(record: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| record.get(*k))
        .find(|v| is_truthy(*v))
        .flatten()
        .map(display_value)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_html_replaces_all_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn sanitize_url_keeps_http_and_https() {
        assert_eq!(
            sanitize_url("https://example.com/a?b=1"),
            "https://example.com/a?b=1"
        );
        assert_eq!(sanitize_url("http://example.com"), "http://example.com/");
    }

    #[test]
    fn sanitize_url_rejects_other_schemes_and_relative() {
        assert_eq!(sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_url("data:text/html,<b>x</b>"), "");
        assert_eq!(sanitize_url("/relative/path"), "");
        assert_eq!(sanitize_url("   "), "");
        assert_eq!(sanitize_url("snssdk1233://user/profile/1"), "");
    }

    #[test]
    fn country_flag_for_two_letters() {
        assert_eq!(country_flag("US"), "\u{1F1FA}\u{1F1F8}");
        assert_eq!(country_flag("gb"), "\u{1F1EC}\u{1F1E7}");
    }

    #[test]
    fn country_flag_rejects_other_lengths() {
        assert_eq!(country_flag("USA"), "");
        assert_eq!(country_flag(""), "");
        assert_eq!(country_flag("1A"), "");
    }

    #[test]
    fn format_decimal_groups_thousands() {
        assert_eq!(format_decimal(0.0), "0");
        assert_eq!(format_decimal(999.0), "999");
        assert_eq!(format_decimal(1500.0), "1,500");
        assert_eq!(format_decimal(1234567.0), "1,234,567");
        assert_eq!(format_decimal(-1234.5), "-1,234.5");
        assert_eq!(format_decimal(1.23456), "1.235");
    }

    #[test]
    fn format_count_passes_non_numeric_through() {
        assert_eq!(format_count(Some(&json!(1500))), "1,500");
        assert_eq!(format_count(Some(&json!("2000"))), "2,000");
        assert_eq!(format_count(Some(&json!("1.2K"))), "1.2K");
        assert_eq!(format_count(None), "0");
    }

    #[test]
    fn format_timestamp_seconds_and_millis() {
        assert_eq!(
            format_timestamp(Some(&json!(1_700_000_000))),
            "2023-11-14 22:13:20"
        );
        assert_eq!(
            format_timestamp(Some(&json!(1_700_000_000_000i64))),
            "2023-11-14 22:13:20"
        );
        assert_eq!(format_timestamp(Some(&json!(0))), "");
        assert_eq!(format_timestamp(None), "");
        assert_eq!(format_timestamp(Some(&json!("soon"))), "");
    }

    #[test]
    fn truthiness_follows_loose_rules() {
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(is_truthy(Some(&json!("x"))));
        assert!(is_truthy(Some(&json!({}))));
    }
}
