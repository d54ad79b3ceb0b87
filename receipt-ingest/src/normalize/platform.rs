//! Known service brands that override the generic description and category.

use receipt_core::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Swiggy,
    Zomato,
    RideHailing,
}

const RIDE_HAILING_KEYWORDS: &[&str] = &["uber", "ola", "rapido", "auto ride", "cab ride"];

impl Platform {
    pub fn description(self) -> &'static str {
        match self {
            Platform::Swiggy => "Swiggy order",
            Platform::Zomato => "Zomato order",
            Platform::RideHailing => "Auto ride",
        }
    }
}

/// Platform named in the text. Food delivery brands are checked first.
pub fn detect_platform(text: &str) -> Option<Platform> {
    let lower = text.to_lowercase();
    if lower.contains("swiggy") {
        Some(Platform::Swiggy)
    } else if lower.contains("zomato") {
        Some(Platform::Zomato)
    } else if mentions_ride_hailing(&lower) {
        Some(Platform::RideHailing)
    } else {
        None
    }
}

fn mentions_ride_hailing(lower: &str) -> bool {
    RIDE_HAILING_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Category forced by a platform mention, overriding keyword rules.
///
/// Any ride-hailing keyword forces transport, even on a food delivery
/// receipt; a food delivery brand alone forces food&drink.
pub fn platform_category(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    if mentions_ride_hailing(&lower) {
        Some(Category::Transport)
    } else if lower.contains("swiggy") || lower.contains("zomato") {
        Some(Category::FoodAndDrink)
    } else {
        None
    }
}
