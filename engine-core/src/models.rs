//! Canonical data model shared by the extraction and matching engines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rounding tolerance for the balance-chain check, in account currency units.
pub const BALANCE_TOLERANCE: &str = "0.01";

/// Direction of a bank transaction. Exactly one of debit/credit is non-zero
/// per row; this enum names which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

/// Canonical bank transaction, normalized from any supported statement layout.
///
/// Immutable once validated: corrections produce a replacement record with a
/// higher `extraction_confidence` rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedTransaction {
    pub transaction_date: NaiveDate,
    pub posting_date: Option<NaiveDate>,
    pub description: String,
    pub transaction_type: Option<String>,
    pub reference_number: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
    pub branch_code: Option<String>,
    pub additional_info: Option<String>,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    /// 1-based page of the source statement this row came from.
    pub source_page: u32,
    /// 0.0 - 1.0; rows below the pipeline's accept threshold go to fallback.
    pub extraction_confidence: f64,
}

impl StandardizedTransaction {
    /// Which side of the ledger this row moves, if it is well-formed.
    /// Returns `None` when the exclusivity invariant is violated (both or
    /// neither of debit/credit non-zero).
    pub fn direction(&self) -> Option<Direction> {
        match (self.debit.is_zero(), self.credit.is_zero()) {
            (false, true) => Some(Direction::Debit),
            (true, false) => Some(Direction::Credit),
            _ => None,
        }
    }

    /// The non-zero movement amount, regardless of direction.
    pub fn amount(&self) -> Decimal {
        if self.debit.is_zero() {
            self.credit
        } else {
            self.debit
        }
    }

    /// Exclusivity invariant: exactly one of debit/credit is non-zero, and
    /// neither is negative.
    pub fn is_exclusive(&self) -> bool {
        !self.debit.is_sign_negative()
            && !self.credit.is_sign_negative()
            && self.direction().is_some()
    }

    /// Balance-chain invariant against the previous row's balance:
    /// `balance == previous - debit + credit` within `tolerance`.
    pub fn follows_balance(&self, previous: Decimal, tolerance: Decimal) -> bool {
        let expected = previous - self.debit + self.credit;
        (self.balance - expected).abs() <= tolerance
    }

    /// The balance delta this row claims versus what its amounts imply.
    /// Zero for a chain-consistent row.
    pub fn balance_drift(&self, previous: Decimal) -> Decimal {
        self.balance - (previous - self.debit + self.credit)
    }
}

/// Walk an ordered transaction sequence and return the indices of every row
/// whose posted balance does not follow from the prior balance.
///
/// The first row is checked against `opening_balance` when the statement
/// header carries one; otherwise its balance is treated as carried forward
/// and the chain starts there.
pub fn balance_chain_violations(
    transactions: &[StandardizedTransaction],
    opening_balance: Option<Decimal>,
    tolerance: Decimal,
) -> Vec<usize> {
    let mut violations = Vec::new();
    let mut previous = match opening_balance {
        Some(opening) => opening,
        None => match transactions.first() {
            Some(first) => first.balance + first.debit - first.credit,
            None => return violations,
        },
    };

    for (i, txn) in transactions.iter().enumerate() {
        if !txn.follows_balance(previous, tolerance) {
            violations.push(i);
        }
        previous = txn.balance;
    }

    violations
}
