//! Dish-name matching over normalized menu text.

use crate::config::MatcherConfig;

use super::normalize::{normalize, normalize_for_search, SearchText};
use super::translit::transliterate;

/// Bilingual/synonym variant groups. Matching any entry of a group
/// makes every other entry a retry candidate. Domain-specific and
/// deliberately small; the transliterated form of the query is always
/// added as one more variant.
const VARIANT_GROUPS: &[&[&str]] = &[
    &["зеленый салат", "green salad", "insalata verde", "салат зеленый"],
    &["куриный суп", "chicken soup", "суп куриный"],
    &["салат цезарь", "цезарь", "caesar salad", "caesar"],
    &["борщ", "borscht", "borsch"],
    &["пицца маргарита", "margherita", "pizza margherita"],
    &["паста карбонара", "карбонара", "carbonara", "pasta carbonara"],
    &["том ям", "tom yam", "tom yum"],
    &["оливье", "olivier", "russian salad"],
    &["греческий салат", "greek salad", "salade grecque"],
    &["грибной суп", "mushroom soup", "суп грибной"],
];

/// Known spelling variants for a dish name, search-normalized, the
/// query itself excluded. Always includes the transliterated form
/// when it differs.
pub fn dish_variants(dish_name: &str) -> Vec<String> {
    let needle = normalize_for_search(dish_name);
    let mut variants: Vec<String> = Vec::new();

    for group in VARIANT_GROUPS {
        if group.iter().any(|v| normalize_for_search(v) == needle) {
            for v in *group {
                let v = normalize_for_search(v);
                if v != needle && !variants.contains(&v) {
                    variants.push(v);
                }
            }
        }
    }

    let translit = normalize_for_search(&transliterate(&needle));
    if translit != needle && !variants.contains(&translit) {
        variants.push(translit);
    }

    variants
}

/// Find a dish name in text.
///
/// Returns the char offset of the match in [`normalize`]`(text)`, or
/// `None`. Strategies are tried in order and the first hit wins:
/// exact substring, proximity (all significant words near the first),
/// longest-word fallback, then the same three for each known variant.
pub fn find_dish(dish_name: &str, text: &str, cfg: &MatcherConfig) -> Option<usize> {
    let norm = normalize(text);
    let st = SearchText::from_normalized(&norm);
    if st.search.is_empty() {
        return None;
    }

    let needle = normalize_for_search(dish_name);
    if needle.is_empty() {
        return None;
    }

    if let Some(offset) = find_one(&needle, &st, cfg) {
        return Some(offset);
    }

    for variant in dish_variants(dish_name) {
        if let Some(offset) = find_one(&variant, &st, cfg) {
            return Some(offset);
        }
    }

    None
}

/// Strategies (a)-(c) for one spelling of the dish.
fn find_one(needle: &str, st: &SearchText, cfg: &MatcherConfig) -> Option<usize> {
    // (a) exact substring
    if let Some(byte_pos) = st.search.find(needle) {
        return Some(st.to_norm_offset(char_offset(&st.search, byte_pos)));
    }

    let words: Vec<&str> = needle
        .split(' ')
        .filter(|w| w.chars().count() >= cfg.min_word_len)
        .collect();
    if words.is_empty() {
        return None;
    }

    // (b) proximity: every occurrence of the first word, all other
    // words within the configured window around it.
    let first = words[0];
    let total_chars = st.search.chars().count();
    for (byte_pos, _) in st.search.match_indices(first) {
        let pos = char_offset(&st.search, byte_pos);
        let start = pos.saturating_sub(cfg.proximity_before);
        let end = (pos + cfg.proximity_after).min(total_chars);
        let region: String = st.search.chars().skip(start).take(end - start).collect();
        if words.iter().all(|w| region.contains(w)) {
            return Some(st.to_norm_offset(pos));
        }
    }

    // (c) longest word alone, if long enough to be distinctive.
    let main = words.iter().max_by_key(|w| w.chars().count())?;
    if main.chars().count() >= cfg.min_main_word_len {
        if let Some(byte_pos) = st.search.find(main) {
            return Some(st.to_norm_offset(char_offset(&st.search, byte_pos)));
        }
    }

    None
}

fn char_offset(s: &str, byte_pos: usize) -> usize {
    s[..byte_pos].chars().count()
}
