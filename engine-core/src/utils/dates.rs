//! Flexible date parsing for OCR'd statement cells.

use chrono::NaiveDate;

/// Month-name tokens seen on Indonesian and English statement layouts.
const MONTHS: &[(&str, u32)] = &[
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MEI", 5),
    ("MAY", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AGU", 8),
    ("AGS", 8),
    ("AUG", 8),
    ("SEP", 9),
    ("OKT", 10),
    ("OCT", 10),
    ("NOV", 11),
    ("DES", 12),
    ("DEC", 12),
];

/// Parse a statement date cell.
///
/// `year_hint` resolves day/month-only layouts (BCA writes `01/03`); it is the
/// statement period year taken from the document header.
pub fn parse_statement_date(cell: &str, year_hint: Option<i32>) -> Option<NaiveDate> {
    let s = cell.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Some(date) = parse_named_month(s) {
        return Some(date);
    }

    // Day/month only: "01/03" or "01-03", year from the statement period.
    if let Some(year) = year_hint {
        let parts: Vec<&str> = s.split(['/', '-']).collect();
        if parts.len() == 2 {
            let day: u32 = parts[0].parse().ok()?;
            let month: u32 = parts[1].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }

    None
}

/// "12 AGU 2024", "12-Agu-2024", "12 DES 24".
fn parse_named_month(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split([' ', '-']).filter(|p| !p.is_empty()).collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let token = parts[1].to_uppercase();
    let month = MONTHS
        .iter()
        .find(|(name, _)| token.starts_with(name))
        .map(|(_, m)| *m)?;
    let mut year: i32 = parts[2].parse().ok()?;
    if year < 100 {
        year += 2000;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}
