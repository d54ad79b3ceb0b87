//! receipt-ingest: heuristic normalization of receipt text and AI output into expense records.

pub mod ai_output;
pub mod normalize;

pub use ai_output::{UnparseableOutput, interpret_ai_output};
pub use normalize::{
    UNKNOWN_EXPENSE, UNKNOWN_MERCHANT, classify, detect_category, detect_description,
    detect_merchant, extract_amount, extract_date, parse_expense_from_text,
};
