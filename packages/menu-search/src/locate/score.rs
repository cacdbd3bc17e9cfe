//! Link scoring and menu-page heuristics.

use crate::config::LocateConfig;
use crate::fetch::Link;

/// Count distinct menu indicators present in `text` (already assumed
/// mixed-case; matching is case-insensitive).
pub fn indicator_hits(text: &str, cfg: &LocateConfig) -> usize {
    let lower = text.to_lowercase();
    cfg.menu_indicators
        .iter()
        .filter(|i| lower.contains(i.as_str()))
        .count()
}

/// Whether a fetched page reads like a menu.
///
/// A page on a `/menu`-style path qualifies with a single indicator;
/// any other page needs `min_indicator_hits`. Either way the text must
/// be long enough to be worth matching against.
pub fn looks_like_menu(text: &str, url: &str, cfg: &LocateConfig) -> bool {
    if text.chars().count() < cfg.min_content_len {
        return false;
    }
    let hits = indicator_hits(text, cfg);
    if url_is_menu_path(url, cfg) {
        return hits >= 1;
    }
    hits >= cfg.min_indicator_hits
}

/// Whether a URL's path contains one of the configured menu segments.
pub fn url_is_menu_path(url: &str, cfg: &LocateConfig) -> bool {
    let lower = url.to_lowercase();
    cfg.menu_path_segments
        .iter()
        .any(|seg| lower.contains(seg.as_str()))
}

/// Score a link as a menu candidate. `None` means the link is
/// navigation noise (cart, booking, contacts) or scored zero.
pub fn score_link(link: &Link, cfg: &LocateConfig) -> Option<i32> {
    let text = link.text.to_lowercase();
    let href = link.href.to_lowercase();
    if cfg
        .ignore_keywords
        .iter()
        .any(|k| text.contains(k.as_str()) || href.contains(k.as_str()))
    {
        return None;
    }

    let mut score = 0;
    if cfg.menu_keywords.iter().any(|k| text.contains(k.as_str())) {
        score += cfg.text_keyword_score;
    }
    if cfg.menu_keywords.iter().any(|k| href.contains(k.as_str())) {
        score += cfg.url_keyword_score;
    }
    if url_is_menu_path(&href, cfg) {
        score += cfg.path_bonus;
    }
    (score > 0).then_some(score)
}

/// Whether the page carries a same-page menu anchor (`#menu` style).
///
/// Weaker evidence than a real menu link: the menu, if any, is a
/// section of this very page, so the page's own text is the
/// candidate.
pub fn has_menu_fragment(html: &str, cfg: &LocateConfig) -> bool {
    crate::fetch::fragment_anchors(html).iter().any(|link| {
        let text = link.text.to_lowercase();
        let href = link.href.to_lowercase();
        cfg.menu_keywords
            .iter()
            .any(|k| text.contains(k.as_str()) || href.contains(k.as_str()))
    })
}

/// Rank a page's links as menu candidates, best first, deduplicated
/// by href. Ties keep document order.
pub fn rank_links(links: &[Link], cfg: &LocateConfig) -> Vec<Link> {
    let mut seen = std::collections::HashSet::new();
    let mut scored: Vec<(i32, Link)> = links
        .iter()
        .filter_map(|link| {
            let score = score_link(link, cfg)?;
            seen.insert(link.href.clone()).then(|| (score, link.clone()))
        })
        .collect();
    scored.sort_by_key(|(score, _)| -score);
    scored.into_iter().map(|(_, link)| link).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: &str, text: &str) -> Link {
        Link {
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn menu_path_wins_over_keyword_only() {
        let cfg = LocateConfig::default();
        let by_path = score_link(&link("https://a.example/menu", "стр"), &cfg).unwrap();
        let by_text = score_link(&link("https://a.example/page2", "наше меню"), &cfg).unwrap();
        // path bonus (15) + url keyword (5) beats text keyword (10)
        assert!(by_path > by_text);
    }

    #[test]
    fn ignore_keywords_disqualify() {
        let cfg = LocateConfig::default();
        assert!(score_link(&link("https://a.example/cart", "корзина меню"), &cfg).is_none());
        assert!(score_link(&link("https://a.example/delivery", "доставка"), &cfg).is_none());
    }

    #[test]
    fn unrelated_links_score_nothing() {
        let cfg = LocateConfig::default();
        assert!(score_link(&link("https://a.example/gallery", "фотографии"), &cfg).is_none());
    }

    #[test]
    fn ranking_is_descending_and_deduplicated() {
        let cfg = LocateConfig::default();
        let links = vec![
            link("https://a.example/page2", "наше меню"),
            link("https://a.example/menu", "кухня"),
            link("https://a.example/menu", "кухня"),
        ];
        let ranked = rank_links(&links, &cfg);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].href, "https://a.example/menu");
    }

    #[test]
    fn menu_page_heuristic() {
        let cfg = LocateConfig::default();
        let menu_text = format!(
            "{} Салат Цезарь 450 руб, суп дня 350 руб, десерт тирамису 400",
            "х".repeat(300)
        );
        assert!(looks_like_menu(&menu_text, "https://a.example/page", &cfg));

        let thin = format!("{} салат", "х".repeat(300));
        assert!(!looks_like_menu(&thin, "https://a.example/page", &cfg));
        // one hit is enough on a menu path
        assert!(looks_like_menu(&thin, "https://a.example/menu", &cfg));

        assert!(!looks_like_menu("салат суп цена", "https://a.example/menu", &cfg));
    }
}
