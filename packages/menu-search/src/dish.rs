//! Dish matching over located menu text.
//!
//! Thin stateful wrapper around the pure [`crate::text`] functions:
//! finds the dish, anchors price extraction at the match, and
//! reconstructs a human-readable item label from the surrounding
//! words.

use tracing::debug;

use crate::config::MatcherConfig;
use crate::text::{extract_price, find_dish, normalize};
use crate::types::menu::DishMatch;
use crate::types::place::MenuItem;

/// Matches one dish against menu text.
#[derive(Debug, Clone, Default)]
pub struct DishMatcher {
    config: MatcherConfig,
}

impl DishMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Search `text` for `dish_name` and, on a hit, for a price near
    /// the match.
    pub fn match_dish(&self, dish_name: &str, text: &str) -> DishMatch {
        let Some(offset) = find_dish(dish_name, text, &self.config) else {
            return DishMatch::not_found();
        };
        let norm = normalize(text);
        let found = DishMatch::found_at(offset);
        match extract_price(&norm, offset, &self.config) {
            Some(price) => {
                debug!(dish = %dish_name, value = price.value, raw = %price.raw, "price extracted");
                found.with_price(price)
            }
            None => {
                debug!(dish = %dish_name, "dish found without a price");
                found
            }
        }
    }

    /// Build the public menu item for a positive match: the menu's
    /// own wording of the dish plus the extracted price.
    pub fn menu_item(&self, dish_name: &str, text: &str, matched: &DishMatch) -> Option<MenuItem> {
        let offset = matched.offset?;
        let norm = normalize(text);
        let name = reconstruct_label(&norm, offset, dish_name);
        Some(MenuItem {
            name,
            price: matched.price.as_ref().map(|p| p.value),
            price_raw: matched.price.as_ref().map(|p| p.raw.clone()),
        })
    }
}

/// Take the words following the match as the item label, stopping at
/// the price column (a bare number) or after the dish's own length
/// plus two qualifier words.
fn reconstruct_label(norm: &str, offset: usize, dish_name: &str) -> String {
    let tail: String = norm.chars().skip(offset).take(80).collect();
    let budget = dish_name.split_whitespace().count() + 2;
    let mut words: Vec<&str> = Vec::new();
    for raw in tail.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() {
            continue;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            break;
        }
        words.push(word);
        if words.len() >= budget {
            break;
        }
    }
    if words.is_empty() {
        title_case(dish_name)
    } else {
        words.join(" ")
    }
}

/// Uppercase the first letter of every word, for presenting the raw
/// query when the menu's own wording could not be recovered.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = "Супы\n\
        Куриный суп с лапшой — 350 ₽\n\
        Борщ со сметаной — 290 ₽\n\
        Горячее\n\
        Котлета по-киевски с пюре — 520 ₽";

    #[test]
    fn finds_dish_with_price() {
        let matcher = DishMatcher::default();
        let matched = matcher.match_dish("куриный суп", MENU);
        assert!(matched.found);
        let price = matched.price.as_ref().expect("price");
        assert_eq!(price.value, 350.0);
    }

    #[test]
    fn reconstructs_menu_wording() {
        let matcher = DishMatcher::default();
        let matched = matcher.match_dish("куриный суп", MENU);
        let item = matcher.menu_item("куриный суп", MENU, &matched).unwrap();
        assert_eq!(item.name, "куриный суп с лапшой");
        assert_eq!(item.price, Some(350.0));
    }

    #[test]
    fn found_without_price() {
        let matcher = DishMatcher::default();
        let text = "Сегодня в меню: куриный суп и свежий хлеб";
        let matched = matcher.match_dish("куриный суп", text);
        assert!(matched.found);
        assert!(matched.price.is_none());
    }

    #[test]
    fn absent_dish_is_not_found() {
        let matcher = DishMatcher::default();
        let matched = matcher.match_dish("паста карбонара", MENU);
        assert!(!matched.found);
        assert!(matcher.menu_item("паста карбонара", MENU, &matched).is_none());
    }

    #[test]
    fn label_falls_back_to_title_cased_request() {
        // Match right at a price column leaves no words to take.
        assert_eq!(reconstruct_label("350 руб", 0, "борщ"), "Борщ");
        assert_eq!(reconstruct_label("", 0, "куриный суп"), "Куриный Суп");
    }
}
