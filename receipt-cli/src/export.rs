//! CSV export of a session's expenses.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use receipt_core::{ExpenseStatus, TrackedExpense};

#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    status: ExpenseStatus,
    description: &'a str,
    amount: String,
    category: &'a str,
    date: String,
    merchant: &'a str,
    source_file: &'a str,
    error: &'a str,
}

impl<'a> From<&'a TrackedExpense> for Row<'a> {
    fn from(e: &'a TrackedExpense) -> Self {
        Row {
            id: &e.id,
            status: e.status,
            description: &e.record.description,
            amount: format!("{:.2}", e.record.amount),
            category: e.record.category.as_str(),
            date: e.record.iso_date(),
            merchant: e.record.merchant.as_deref().unwrap_or(""),
            source_file: e.record.source_file.as_deref().unwrap_or(""),
            error: e.error.as_deref().unwrap_or(""),
        }
    }
}

pub fn write_csv(path: &Path, expenses: &[TrackedExpense]) -> Result<usize> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for e in expenses {
        wtr.serialize(Row::from(e))?;
    }
    wtr.flush()?;
    Ok(expenses.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use receipt_core::{Category, ExpenseRecord};

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("expenses.csv");

        let ok = TrackedExpense {
            status: ExpenseStatus::Extracted,
            ..TrackedExpense::pending(
                ExpenseRecord::new(
                    "Swiggy order",
                    462.35,
                    Category::FoodAndDrink,
                    NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
                )
                .with_merchant("Swiggy, Bundl Technologies")
                .with_source_file("a.jpg"),
            )
        };
        let mut failed = TrackedExpense::pending(ExpenseRecord::placeholder(
            "b.jpg",
            NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        ));
        failed.status = ExpenseStatus::Error;
        failed.error = Some("Failed to extract data from image".to_string());

        assert_eq!(write_csv(&p, &[ok.clone(), failed]).unwrap(), 2);

        let mut rdr = csv::Reader::from_path(&p).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["id", "status", "description", "amount", "category", "date", "merchant", "source_file", "error"]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], ok.id.as_str());
        assert_eq!(&rows[0][1], "extracted");
        assert_eq!(&rows[0][3], "462.35");
        assert_eq!(&rows[0][4], "food&drink");
        assert_eq!(&rows[0][6], "Swiggy, Bundl Technologies");
        assert_eq!(&rows[1][1], "error");
        assert_eq!(&rows[1][3], "0.00");
        assert_eq!(&rows[1][8], "Failed to extract data from image");
    }
}
