//! Expense record types shared by the normalizer, the remote clients and the CLI.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expense categories, in the order the UI lists them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "entertainment")]
    Entertainment,
    #[serde(rename = "groceries")]
    Groceries,
    #[serde(rename = "food&drink")]
    #[default]
    FoodAndDrink,
    #[serde(rename = "housing")]
    Housing,
    #[serde(rename = "transport")]
    Transport,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Entertainment,
        Category::Groceries,
        Category::FoodAndDrink,
        Category::Housing,
        Category::Transport,
    ];

    /// Wire name, as stored in the Notion `category` select.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Entertainment => "entertainment",
            Category::Groceries => "groceries",
            Category::FoodAndDrink => "food&drink",
            Category::Housing => "housing",
            Category::Transport => "transport",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Normalized output of receipt parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    /// Human-readable description, e.g. "Swiggy order"
    #[serde(alias = "expense")]
    pub description: String,
    /// Currency units, two-decimal precision, never negative
    pub amount: f64,
    pub category: Category,
    /// Serialized as YYYY-MM-DD
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
}

impl ExpenseRecord {
    /// Create a record; the amount is coerced with [`sanitize_amount`].
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount: sanitize_amount(amount),
            category,
            date,
            source_file: None,
            raw_text: None,
            merchant: None,
        }
    }

    /// Placeholder shown while a file waits for extraction.
    pub fn placeholder(file_name: &str, today: NaiveDate) -> Self {
        let mut r = Self::new(file_name, 0.0, Category::default(), today);
        r.source_file = Some(file_name.to_string());
        r
    }

    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    /// Date as zero-padded `YYYY-MM-DD`.
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Round to cents. Negative and non-finite inputs become 0.
pub fn sanitize_amount(amount: f64) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&Category::FoodAndDrink).unwrap(),
            "\"food&drink\""
        );
        assert_eq!("Transport".parse::<Category>().unwrap(), Category::Transport);
        assert_eq!(" food&drink ".parse::<Category>().unwrap(), Category::FoodAndDrink);
        assert!("travel".parse::<Category>().is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let r = ExpenseRecord::new("Swiggy order", 412.5, Category::FoodAndDrink, d(2026, 8, 29))
            .with_source_file("r1.png");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["description"], "Swiggy order");
        assert_eq!(v["date"], "2026-08-29");
        assert_eq!(v["sourceFile"], "r1.png");
        assert!(v.get("rawText").is_none());
    }

    #[test]
    fn test_record_accepts_expense_alias() {
        let r: ExpenseRecord = serde_json::from_str(
            r#"{"expense":"Auto ride","amount":88,"category":"transport","date":"2026-01-05"}"#,
        )
        .unwrap();
        assert_eq!(r.description, "Auto ride");
        assert_eq!(r.category, Category::Transport);
        assert_eq!(r.iso_date(), "2026-01-05");
    }

    #[test]
    fn test_sanitize_amount() {
        assert_eq!(sanitize_amount(12.346), 12.35);
        assert_eq!(sanitize_amount(-4.0), 0.0);
        assert_eq!(sanitize_amount(f64::NAN), 0.0);
        assert_eq!(ExpenseRecord::new("x", -1.0, Category::Housing, d(2026, 1, 1)).amount, 0.0);
    }
}
