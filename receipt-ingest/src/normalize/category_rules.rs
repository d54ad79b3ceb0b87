//! Keyword rules mapping receipt text to an expense [`Category`].
//!
//! The table is ordered: the first category with a matching keyword wins,
//! so transport beats food&drink for text mentioning both "uber" and "cafe".

use receipt_core::Category;

/// (category, keywords) pairs, matched as lowercase substrings.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Transport,
        &["uber", "ola", "cab", "auto", "metro", "bus", "train", "fuel", "petrol", "diesel"],
    ),
    (
        Category::FoodAndDrink,
        &["swiggy", "zomato", "restaurant", "cafe", "food", "coffee", "tea", "lunch", "dinner"],
    ),
    (
        Category::Entertainment,
        &["movie", "netflix", "spotify", "amazon prime", "theatre", "concert"],
    ),
    (
        Category::Housing,
        &["rent", "maintenance", "electricity", "water", "gas", "internet"],
    ),
    (
        Category::Groceries,
        &["bigbasket", "grocery", "kirana", "supermarket", "vegetables", "fruits"],
    ),
];

/// First matching category, if any keyword occurs in `text`.
pub fn match_category(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
}

/// Classify text; food&drink when nothing matches.
pub fn classify(text: &str) -> Category {
    match_category(text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category() {
        assert_eq!(classify("METRO card recharge"), Category::Transport);
        assert_eq!(classify("Third Wave Coffee"), Category::FoodAndDrink);
        assert_eq!(classify("Netflix monthly"), Category::Entertainment);
        assert_eq!(classify("Electricity bill BESCOM"), Category::Housing);
        assert_eq!(classify("BigBasket order"), Category::Groceries);
    }

    #[test]
    fn test_table_order_breaks_ties() {
        // "uber" (transport) and "cafe" (food&drink) both present
        assert_eq!(classify("Uber to the cafe"), Category::Transport);
        // "dinner" (food&drink) and "movie" (entertainment)
        assert_eq!(classify("movie and dinner"), Category::FoodAndDrink);
    }

    #[test]
    fn test_substring_semantics() {
        // "tea" inside "steam" still counts
        assert_eq!(classify("steam iron"), Category::FoodAndDrink);
        assert_eq!(match_category("steam iron"), Some(Category::FoodAndDrink));
    }

    #[test]
    fn test_default_is_food_and_drink() {
        assert_eq!(match_category("₹45 paid"), None);
        assert_eq!(classify("₹45 paid"), Category::FoodAndDrink);
    }
}
