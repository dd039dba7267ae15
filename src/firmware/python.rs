//! Python literal rendering for generated CircuitPython sources.

use std::fmt::Write;

/// Renders `value` as a double-quoted Python string literal.
///
/// Backslashes, quotes and control characters are escaped; anything
/// outside printable ASCII becomes a `\x`, `\u` or `\U` escape so the
/// output file is pure ASCII.
#[must_use]
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(c),
            c if u32::from(c) <= 0xFF => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c if u32::from(c) <= 0xFFFF => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => {
                let _ = write!(out, "\\U{:08x}", u32::from(c));
            }
        }
    }
    out.push('"');
    out
}

/// Renders a Python boolean.
#[must_use]
pub const fn bool_literal(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Renders a float so Python always reads it back as a float (`1` → `1.0`).
#[must_use]
pub fn float_literal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(string_literal("hi"), "\"hi\"");
    }

    #[test]
    fn test_escapes_quotes_and_backslashes() {
        assert_eq!(string_literal(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn test_escapes_control_and_non_ascii() {
        assert_eq!(string_literal("a\nb\tc\u{7}"), "\"a\\nb\\tc\\x07\"");
        assert_eq!(string_literal("café"), "\"caf\\xe9\"");
        assert_eq!(string_literal("→"), "\"\\u2192\"");
        assert_eq!(string_literal("🙂"), "\"\\U0001f642\"");
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(0.0), "0.0");
    }

    #[test]
    fn test_bool_literal() {
        assert_eq!(bool_literal(true), "True");
        assert_eq!(bool_literal(false), "False");
    }
}
