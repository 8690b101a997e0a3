//! Amount-sign inference for layouts with a single unsigned amount column
//! and no D/C flag.
//!
//! This is a known-imprecise heuristic: the default direction applies
//! whenever no keyword matches, and real statements should be checked before
//! trusting it. Keyword sets are data, not code, so a new bank's vocabulary
//! is added without touching parsing logic.

use engine_core::models::Direction;
use engine_core::utils::text;

#[derive(Debug, Clone)]
pub struct DirectionHints {
    pub debit_keywords: Vec<&'static str>,
    pub credit_keywords: Vec<&'static str>,
    /// Applied when no keyword matches. Overridable per adapter instance.
    pub default: Direction,
}

impl Default for DirectionHints {
    fn default() -> Self {
        Self {
            debit_keywords: vec![
                "TARIK", "BAYAR", "PEMBAYARAN", "BIAYA", "ADMIN", "PAJAK", "TRF KELUAR",
            ],
            credit_keywords: vec!["SETOR", "TERIMA", "PENERIMAAN", "BUNGA", "TRF MASUK"],
            default: Direction::Credit,
        }
    }
}

impl DirectionHints {
    /// Debit keywords take precedence over credit keywords; the default
    /// applies only when neither set matches.
    pub fn infer(&self, description: &str) -> Direction {
        let haystack = text::normalize(description);
        if self.debit_keywords.iter().any(|k| haystack.contains(k)) {
            Direction::Debit
        } else if self.credit_keywords.iter().any(|k| haystack.contains(k)) {
            Direction::Credit
        } else {
            self.default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_keywords_win() {
        let hints = DirectionHints::default();
        assert_eq!(hints.infer("TARIK TUNAI ATM"), Direction::Debit);
        assert_eq!(hints.infer("bayar listrik PLN"), Direction::Debit);
    }

    #[test]
    fn credit_keywords() {
        let hints = DirectionHints::default();
        assert_eq!(hints.infer("SETOR TUNAI"), Direction::Credit);
        assert_eq!(hints.infer("TERIMA TRANSFER"), Direction::Credit);
    }

    #[test]
    fn ambiguous_falls_to_default() {
        let hints = DirectionHints::default();
        assert_eq!(hints.infer("QR 0123456789"), Direction::Credit);

        let debit_default = DirectionHints {
            default: Direction::Debit,
            ..Default::default()
        };
        assert_eq!(debit_default.infer("QR 0123456789"), Direction::Debit);
    }
}
