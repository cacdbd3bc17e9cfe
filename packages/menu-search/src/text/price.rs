//! Heuristic price extraction near a dish match.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MatcherConfig;
use crate::types::PriceMatch;

/// Ordered numeric patterns, most specific first. Group 1 is the
/// value unless noted. The bare-number pattern captures a trailing
/// unit so weights can be rejected in code (the regex crate has no
/// lookahead).
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // 650 ₽ / 650₽
        Regex::new(r"(\d{2,5})\s*₽").unwrap(),
        // 650 руб / 650руб.
        Regex::new(r"(\d{2,5})\s*руб\.?").unwrap(),
        // 650 р / 650р.
        Regex::new(r"(\d{2,5})\s*р\.?\b").unwrap(),
        // weight-then-price: 250/450, 250 г / 450 (price after the slash)
        Regex::new(r"\d{2,4}\s*(?:г|гр|g)?\s*/\s*(\d{2,5})\b").unwrap(),
        // separator-prefixed: — 650, : 650
        Regex::new(r"[—–\-:]\s*(\d{2,5})\b").unwrap(),
        // decimal: 650.00 / 650,00
        Regex::new(r"\b(\d{2,5})[.,](\d{2})\b").unwrap(),
        // range takes the first number: от 650 до 800
        Regex::new(r"от\s*(\d{2,5})\s*до\s*\d{2,5}").unwrap(),
        // bare 3-4 digit number; group 2 catches weight/volume units
        Regex::new(r"\b(\d{3,4})(?:\s*(г|гр|мл|ml|g|kcal|ккал))?\b").unwrap(),
    ]
});

/// Index of the decimal pattern.
const DECIMAL_PATTERN: usize = 5;
/// Index of the bare-number pattern with the unit-reject group.
const BARE_PATTERN: usize = 7;

#[derive(Debug)]
struct Candidate {
    score: usize,
    pattern: usize,
    value: f64,
    raw: String,
}

/// Extract a price near `anchor` (a char offset into text that has
/// been through [`normalize`](super::normalize)).
///
/// Looks in a window biased toward text after the anchor, collects
/// every pattern match, and returns the candidate closest to the
/// anchor whose value is plausible. Before-anchor matches carry an
/// extra distance penalty. `None` is an expected outcome, not an
/// error.
pub fn extract_price(text: &str, anchor: usize, cfg: &MatcherConfig) -> Option<PriceMatch> {
    if text.is_empty() {
        return None;
    }

    let total_chars = text.chars().count();
    let window_start = anchor.saturating_sub(cfg.price_window_before);
    let window_end = (anchor + cfg.price_window_after).min(total_chars);
    if window_start >= window_end {
        return None;
    }
    let window: String = text
        .chars()
        .skip(window_start)
        .take(window_end - window_start)
        .collect();

    let mut best: Option<Candidate> = None;

    for (pattern_idx, re) in PATTERNS.iter().enumerate() {
        for caps in re.captures_iter(&window) {
            let Some(candidate) =
                candidate_from_captures(&caps, pattern_idx, &window, window_start, anchor, cfg)
            else {
                continue;
            };
            let better = match &best {
                None => true,
                Some(b) => (candidate.score, candidate.pattern) < (b.score, b.pattern),
            };
            if better {
                best = Some(candidate);
            }
        }
    }

    best.map(|c| PriceMatch {
        value: c.value,
        raw: c.raw,
    })
}

fn candidate_from_captures(
    caps: &regex::Captures<'_>,
    pattern_idx: usize,
    window: &str,
    window_start: usize,
    anchor: usize,
    cfg: &MatcherConfig,
) -> Option<Candidate> {
    // Bare numbers followed by a unit are weights, not prices.
    if pattern_idx == BARE_PATTERN && caps.get(2).is_some() {
        return None;
    }

    let value = if pattern_idx == DECIMAL_PATTERN {
        let int_part = caps.get(1)?.as_str();
        let frac = caps.get(2)?.as_str();
        format!("{int_part}.{frac}").parse::<f64>().ok()?
    } else {
        caps.get(1)?.as_str().parse::<f64>().ok()?
    };

    if value < cfg.min_price || value > cfg.max_price {
        return None;
    }

    let m = caps.get(0)?;
    let pos = window_start + window[..m.start()].chars().count();
    let score = if pos >= anchor {
        pos - anchor
    } else {
        (anchor - pos) + cfg.before_anchor_penalty
    };

    Some(Candidate {
        score,
        pattern: pattern_idx,
        value,
        raw: m.as_str().trim().to_string(),
    })
}
