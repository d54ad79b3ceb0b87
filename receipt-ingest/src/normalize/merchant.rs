//! Merchant detection from label-style receipt lines.

use regex::Regex;
use std::sync::LazyLock;

pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";

// Names are single-line: letters, digits, spaces/tabs and '&'.
static MERCHANT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(?:store|restaurant|shop):[ \t]*([A-Za-z0-9 \t&]+)").expect("label pattern"),
        Regex::new(r"(?i)([A-Za-z0-9 \t&]+?)[ \t]+(?:pvt\.?[ \t]+ltd\.?|limited)")
            .expect("company suffix pattern"),
        Regex::new(r"(?i)([A-Za-z0-9 \t&]+?)[ \t]+receipt").expect("receipt suffix pattern"),
    ]
});

/// Detected merchant name, if any pattern matches.
pub fn find_merchant(text: &str) -> Option<String> {
    MERCHANT_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .map(|c| c[1].trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

/// Merchant name, or "Unknown Merchant".
pub fn detect_merchant(text: &str) -> String {
    find_merchant(text).unwrap_or_else(|| UNKNOWN_MERCHANT.to_string())
}
