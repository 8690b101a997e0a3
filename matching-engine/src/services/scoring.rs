//! Weighted invoice/transaction pair scoring.
//!
//! Four components with fixed weights: amount 0.50, date 0.25, vendor 0.15,
//! reference 0.10. Each component is a step function so near-misses (rounding,
//! settlement lag, truncated vendor names) still score, while genuinely
//! different pairs fall to zero.

use crate::models::{MatchScore, ProjectTransaction, TaxInvoice};
use engine_core::utils::text;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const WEIGHT_AMOUNT: f64 = 0.50;
pub const WEIGHT_DATE: f64 = 0.25;
pub const WEIGHT_VENDOR: f64 = 0.15;
pub const WEIGHT_REFERENCE: f64 = 0.10;

/// Amount proximity between the invoice total and the transaction's non-zero
/// movement, as a fraction of the invoice total.
pub fn amount_score(invoice_total: Decimal, txn_amount: Decimal) -> f64 {
    if invoice_total.is_zero() {
        return 0.0;
    }
    if invoice_total == txn_amount {
        return 1.0;
    }

    let ratio = ((txn_amount - invoice_total).abs() / invoice_total.abs())
        .to_f64()
        .unwrap_or(f64::MAX);
    if ratio <= 0.01 {
        0.95
    } else if ratio <= 0.05 {
        0.85
    } else if ratio <= 0.10 {
        0.70
    } else {
        0.0
    }
}

/// Date proximity in calendar days, either direction. Bank settlement
/// commonly lags the invoice date by a few days.
pub fn date_score(invoice_date: chrono::NaiveDate, txn_date: chrono::NaiveDate) -> f64 {
    let days = (txn_date - invoice_date).num_days().abs();
    match days {
        0 => 1.0,
        1 => 0.95,
        2..=3 => 0.85,
        4..=7 => 0.70,
        _ => 0.0,
    }
}

/// How much of the vendor name appears in the transaction description,
/// case-insensitive and diacritics-folded.
pub fn vendor_score(vendor_name: &str, description: &str) -> f64 {
    text::containment_ratio(vendor_name, description)
}

/// Invoice number lookup: full score when it appears in the bank reference
/// field, partial when it only appears in the free-text description.
pub fn reference_score(
    invoice_number: &str,
    reference_number: Option<&str>,
    description: &str,
) -> f64 {
    let needle = text::normalize(invoice_number);
    if needle.is_empty() {
        return 0.0;
    }
    if let Some(reference) = reference_number {
        if text::normalize(reference).contains(&needle) {
            return 1.0;
        }
    }
    if text::normalize(description).contains(&needle) {
        0.80
    } else {
        0.0
    }
}

/// Weighted total for one pair.
pub fn score_pair(invoice: &TaxInvoice, transaction: &ProjectTransaction) -> MatchScore {
    let amount = amount_score(invoice.total_amount, transaction.txn.amount());
    let date = date_score(invoice.invoice_date, transaction.txn.transaction_date);
    let vendor = vendor_score(&invoice.vendor_name, &transaction.txn.description);
    let reference = reference_score(
        &invoice.invoice_number,
        transaction.txn.reference_number.as_deref(),
        &transaction.txn.description,
    );

    MatchScore {
        amount_score: amount,
        date_score: date,
        vendor_score: vendor,
        reference_score: reference,
        total_score: amount * WEIGHT_AMOUNT
            + date * WEIGHT_DATE
            + vendor * WEIGHT_VENDOR
            + reference * WEIGHT_REFERENCE,
    }
}
