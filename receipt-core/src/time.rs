//! Time utilities: "today" in the user's timezone.

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;

/// Today's calendar date in an IANA timezone like "Asia/Kolkata",
/// or in the machine's local zone when `tz` is `None`.
pub fn today_in(tz: Option<&str>) -> Result<NaiveDate> {
    match tz {
        Some(name) => {
            let tz: Tz = name
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))?;
            Ok(Utc::now().with_timezone(&tz).date_naive())
        }
        None => Ok(Local::now().date_naive()),
    }
}

/// Today in the local zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Zero-padded `YYYY-MM-DD`.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_timezone() {
        assert!(today_in(Some("Mars/Olympus")).is_err());
        assert!(today_in(Some("Asia/Kolkata")).is_ok());
    }

    #[test]
    fn test_iso_date_zero_pads() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(iso_date(d), "2026-03-04");
    }
}
