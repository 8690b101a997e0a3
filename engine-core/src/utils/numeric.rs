//! Locale-aware amount parsing for OCR'd statement cells.
//!
//! Indonesian statements write `5.000.000,25` (thousands `.`, decimal `,`);
//! English-layout exports write `5,000,000.25`; negatives appear as
//! parentheses, a leading minus, or a trailing minus.

use rust_decimal::Decimal;

/// Parse a monetary cell into a `Decimal`.
///
/// Returns `None` for cells that are not plausibly an amount; callers treat
/// that as a per-row failure, never a document error.
pub fn parse_amount(cell: &str) -> Option<Decimal> {
    let mut s = cell.trim().to_string();
    if s.is_empty() || s == "-" {
        return None;
    }

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if let Some(stripped) = s.strip_prefix('-') {
        negative = true;
        s = stripped.to_string();
    }
    if let Some(stripped) = s.strip_suffix('-') {
        negative = true;
        s = stripped.to_string();
    }

    // Currency markers and stray whitespace inside the cell.
    for prefix in ["Rp.", "Rp", "IDR", "USD"] {
        if let Some(stripped) = s.trim_start().strip_prefix(prefix) {
            s = stripped.to_string();
            break;
        }
    }
    s.retain(|c| !c.is_whitespace());

    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let normalized = normalize_separators(&s)?;
    let value: Decimal = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Rewrite a digit string with locale separators into plain `1234.56` form.
fn normalize_separators(s: &str) -> Option<String> {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    let decimal_sep = match (last_dot, last_comma) {
        // Both present: whichever comes last is the decimal separator.
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        // Comma only: decimal when a single comma is followed by 1-2 digits,
        // thousands otherwise ("1,234,567").
        (None, Some(c)) => {
            let tail = s.len() - c - 1;
            if s.matches(',').count() == 1 && (1..=2).contains(&tail) {
                Some(',')
            } else {
                None
            }
        }
        // Dot only: Indonesian thousands unless the tail is not a group of
        // three ("1.234" stays thousands, "1234.5" is a decimal).
        (Some(d), None) => {
            let tail = s.len() - d - 1;
            if s.matches('.').count() == 1 && tail != 3 {
                Some('.')
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let mut out = String::with_capacity(s.len());
    match decimal_sep {
        Some(sep) => {
            let (int_part, frac_part) = s.rsplit_once(sep)?;
            for c in int_part.chars().filter(|c| c.is_ascii_digit()) {
                out.push(c);
            }
            if !frac_part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            out.push('.');
            out.push_str(frac_part);
        }
        None => {
            for c in s.chars().filter(|c| c.is_ascii_digit()) {
                out.push(c);
            }
        }
    }

    if out.is_empty() || out == "." {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn indonesian_format() {
        assert_eq!(parse_amount("5.000.000,25"), Some(dec("5000000.25")));
        assert_eq!(parse_amount("1.234"), Some(dec("1234")));
        assert_eq!(parse_amount("750.000,00"), Some(dec("750000.00")));
    }

    #[test]
    fn english_format() {
        assert_eq!(parse_amount("5,000,000.25"), Some(dec("5000000.25")));
        assert_eq!(parse_amount("1,234"), Some(dec("1234")));
    }

    #[test]
    fn negatives() {
        assert_eq!(parse_amount("(250.000,00)"), Some(dec("-250000.00")));
        assert_eq!(parse_amount("-1.500"), Some(dec("-1500")));
        assert_eq!(parse_amount("1.500-"), Some(dec("-1500")));
    }

    #[test]
    fn currency_prefixes() {
        assert_eq!(parse_amount("Rp 2.500.000"), Some(dec("2500000")));
        assert_eq!(parse_amount("IDR 100,50"), Some(dec("100.50")));
    }

    #[test]
    fn rejects_non_amounts() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("TRANSFER"), None);
        assert_eq!(parse_amount("12/01/2024"), None);
    }
}
