//! Interactive review of extracted expenses (`process --review`).

use anyhow::Result;
use chrono::NaiveDate;
use std::io::{BufRead, Write};

use receipt_core::{Category, ExpenseRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Keep,
    Edited(ExpenseRecord),
    Remove,
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<String> {
    write!(out, "{}: ", label)?;
    out.flush().ok();
    let mut s = String::new();
    input.read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// Prompt until `parse` accepts the answer. Blank input keeps `current`.
fn prompt_field<R, W, T>(
    input: &mut R,
    out: &mut W,
    label: &str,
    current: T,
    shown: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T>
where
    R: BufRead,
    W: Write,
{
    loop {
        let answer = prompt(input, out, &format!("{label} [{shown}]"))?;
        if answer.is_empty() {
            return Ok(current);
        }
        match parse(&answer) {
            Ok(v) => return Ok(v),
            Err(msg) => writeln!(out, "  {msg}")?,
        }
    }
}

fn parse_amount(s: &str) -> Result<f64, String> {
    match s.trim_start_matches('₹').trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok((v * 100.0).round() / 100.0),
        _ => Err("amount must be a non-negative number".to_string()),
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse::<Category>().map_err(|_| {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!("choose one of: {}", names.join(", "))
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| "date must be YYYY-MM-DD".to_string())
}

/// Show one record and let the user keep, edit or remove it.
pub fn review_expense<R: BufRead, W: Write>(
    current: &ExpenseRecord,
    input: &mut R,
    out: &mut W,
) -> Result<ReviewOutcome> {
    writeln!(out)?;
    writeln!(
        out,
        "{} | ₹{:.2} | {} | {}",
        current.description,
        current.amount,
        current.category,
        current.iso_date()
    )?;
    if let Some(file) = &current.source_file {
        writeln!(out, "  from {file}")?;
    }

    let action = prompt(input, out, "Edit? [y/N, d=delete]")?.to_lowercase();
    match action.as_str() {
        "d" | "delete" => return Ok(ReviewOutcome::Remove),
        "y" | "yes" => {}
        _ => return Ok(ReviewOutcome::Keep),
    }

    let mut next = current.clone();
    next.description = prompt_field(
        input,
        out,
        "Description",
        current.description.clone(),
        &current.description,
        |s| Ok(s.to_string()),
    )?;
    next.amount = prompt_field(
        input,
        out,
        "Amount",
        current.amount,
        &format!("{:.2}", current.amount),
        parse_amount,
    )?;
    next.category = prompt_field(
        input,
        out,
        "Category",
        current.category,
        current.category.as_str(),
        parse_category,
    )?;
    next.date = prompt_field(input, out, "Date", current.date, &current.iso_date(), parse_date)?;

    if &next == current {
        Ok(ReviewOutcome::Keep)
    } else {
        Ok(ReviewOutcome::Edited(next))
    }
}
