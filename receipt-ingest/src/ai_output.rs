//! Interpretation of AI/OCR provider output.
//!
//! Providers are asked for a JSON object but often wrap it in prose or a
//! ```json fence, use the old `expense` field name, quote the amount or
//! return a full timestamp. Plain OCR text is routed through the normalizer
//! when text fallback is enabled.

use chrono::{Datelike, NaiveDate};
use receipt_core::{Category, ExpenseRecord};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::normalize::{self, date::find_date};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnparseableOutput {
    #[error("provider returned no text")]
    Empty,

    #[error("provider output is not a JSON expense: {0}")]
    NotJson(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooseRecord {
    #[serde(alias = "expense")]
    description: Option<String>,
    amount: Option<Value>,
    category: Option<String>,
    date: Option<String>,
    merchant: Option<String>,
    raw_text: Option<String>,
}

/// Turn provider output into a record.
pub fn interpret_ai_output(
    content: &str,
    today: NaiveDate,
    text_fallback: bool,
) -> Result<ExpenseRecord, UnparseableOutput> {
    let content = content.trim();
    if content.is_empty() {
        return Err(UnparseableOutput::Empty);
    }

    if let Some(loose) = json_object(content) {
        return Ok(from_loose(loose, content, today));
    }

    if text_fallback {
        tracing::debug!("provider output is not JSON; normalizing as receipt text");
        return Ok(normalize::parse_expense_from_text(content, today));
    }

    Err(UnparseableOutput::NotJson(preview(content)))
}

fn json_object(content: &str) -> Option<LooseRecord> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&content[start..=end]).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn from_loose(loose: LooseRecord, content: &str, today: NaiveDate) -> ExpenseRecord {
    let description = loose
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| normalize::detect_description(content));

    let amount = loose.amount.as_ref().and_then(amount_value).unwrap_or(0.0);

    let category = loose
        .category
        .as_deref()
        .and_then(|c| c.parse::<Category>().ok())
        .unwrap_or_else(|| normalize::detect_category(&description));

    let date = loose
        .date
        .as_deref()
        .and_then(|d| date_value(d, today))
        .unwrap_or(today);

    let mut record = ExpenseRecord::new(description, amount, category, date)
        .with_raw_text(loose.raw_text.unwrap_or_else(|| content.to_string()));
    record.merchant = loose.merchant.filter(|m| !m.trim().is_empty());
    record
}

fn amount_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            // currency marks before the number, e.g. "₹1,250.00", "Rs. 40", "-₹20"
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let (prefix, number) = s.split_at(start);
            let digits: String = number
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let value: f64 = digits.parse().ok()?;
            Some(if prefix.contains('-') { -value } else { value })
        }
        _ => None,
    }
}

fn date_value(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim();
    s.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .or_else(|| find_date(s, today.year()))
}

fn preview(s: &str) -> String {
    const MAX: usize = 120;
    match s.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
