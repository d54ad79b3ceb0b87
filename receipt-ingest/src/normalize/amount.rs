//! Amount extraction.
//!
//! Tie-break order: labeled "Bill Total" > last currency-marked token >
//! bare `NNN.00` token > zero. Totals tend to follow line items, hence
//! last-token-wins. No plausibility checks are applied.

use regex::Regex;
use std::sync::LazyLock;

use receipt_core::sanitize_amount;

// ₹ and ¥ symbols, or Rs / Rs. / INR prefixes
const CURRENCY: &str = r"(?:[₹¥]|\bRs\.?|\bINR)";

static BILL_TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)Bill\s+Total\s*{CURRENCY}\s*(\d+(?:\.\d{{2}})?)"))
        .expect("bill total pattern")
});

static CURRENCY_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){CURRENCY}\s*(\d+(?:\.\d{{2}})?)")).expect("currency token pattern")
});

static DECIMAL_FALLBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.00\b").expect("decimal fallback pattern"));

/// Which rule produced an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSource {
    BillTotal,
    LastCurrencyToken,
    DecimalFallback,
    None,
}

/// Extract the expense amount from noisy receipt text.
pub fn extract_amount(text: &str) -> f64 {
    extract_amount_with_source(text).0
}

pub fn extract_amount_with_source(text: &str) -> (f64, AmountSource) {
    if let Some(v) = BILL_TOTAL_RE
        .captures(text)
        .and_then(|c| parse_number(&c[1]))
    {
        return (v, AmountSource::BillTotal);
    }

    if let Some(v) = CURRENCY_TOKEN_RE
        .captures_iter(text)
        .filter_map(|c| parse_number(&c[1]))
        .last()
    {
        return (v, AmountSource::LastCurrencyToken);
    }

    if let Some(v) = DECIMAL_FALLBACK_RE
        .captures(text)
        .and_then(|c| parse_number(&c[1]))
    {
        return (v, AmountSource::DecimalFallback);
    }

    (0.0, AmountSource::None)
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().map(sanitize_amount)
}
