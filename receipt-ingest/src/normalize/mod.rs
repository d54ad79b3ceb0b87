//! Text normalizer: noisy OCR/AI text -> [`ExpenseRecord`] fields.
//!
//! Each field is extracted independently. The only dependency between steps
//! is the platform override, which runs after description detection and may
//! replace the keyword category.

pub mod amount;
pub mod category_rules;
pub mod date;
pub mod merchant;
pub mod platform;

use chrono::NaiveDate;
use receipt_core::ExpenseRecord;

pub use amount::{AmountSource, extract_amount};
pub use category_rules::{classify, match_category};
pub use date::extract_date;
pub use merchant::{UNKNOWN_MERCHANT, detect_merchant, find_merchant};
pub use platform::{Platform, detect_platform, platform_category};

pub const UNKNOWN_EXPENSE: &str = "Unknown expense";

/// Description for the text: platform label, else merchant, else "Unknown expense".
pub fn detect_description(text: &str) -> String {
    if let Some(p) = detect_platform(text) {
        return p.description().to_string();
    }
    find_merchant(text).unwrap_or_else(|| UNKNOWN_EXPENSE.to_string())
}

/// Category with the platform override applied on top of keyword rules.
pub fn detect_category(text: &str) -> receipt_core::Category {
    platform_category(text).unwrap_or_else(|| classify(text))
}

/// Build a full record from raw receipt text.
pub fn parse_expense_from_text(text: &str, today: NaiveDate) -> ExpenseRecord {
    let (amount, source) = amount::extract_amount_with_source(text);
    let record = ExpenseRecord::new(
        detect_description(text),
        amount,
        detect_category(text),
        extract_date(text, today),
    )
    .with_merchant(detect_merchant(text))
    .with_raw_text(text);

    tracing::debug!(
        description = %record.description,
        amount = record.amount,
        amount_source = ?source,
        category = %record.category,
        date = %record.date,
        "normalized receipt text"
    );
    record
}
