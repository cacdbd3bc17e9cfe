//! Text normalization.

use unicode_normalization::UnicodeNormalization;

/// Normalize text for comparison: NFKC, lowercase, collapse
/// whitespace, trim. Punctuation and currency marks are preserved.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize for search matching: [`normalize`] plus strip everything
/// that is not a word character or a space.
///
/// Idempotent: applying it twice equals applying it once.
pub fn normalize_for_search(text: &str) -> String {
    let kept: String = normalize(text)
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == ' ')
        .collect();
    // Stripping punctuation can leave doubled spaces behind.
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Search-normalized text with a mapping back into the plain
/// normalized text, so match offsets found in punctuation-free space
/// can anchor price extraction in punctuation-preserving space.
pub(crate) struct SearchText {
    /// `normalize_for_search` form.
    pub search: String,
    /// For each char of `search`, the char offset in `normalize(text)`.
    pub offsets: Vec<usize>,
}

impl SearchText {
    /// Build from already-normalized text.
    pub fn from_normalized(norm: &str) -> Self {
        let mut search = String::with_capacity(norm.len());
        let mut offsets = Vec::with_capacity(norm.len());
        let mut pending_space = false;
        for (char_idx, c) in norm.chars().enumerate() {
            if c == ' ' {
                pending_space = !search.is_empty();
                continue;
            }
            if c.is_alphanumeric() || c == '_' {
                if pending_space {
                    search.push(' ');
                    // The space maps to the char that forced it.
                    offsets.push(char_idx);
                    pending_space = false;
                }
                search.push(c);
                offsets.push(char_idx);
            }
            // Punctuation neither emits nor clears a pending space:
            // "суп, борщ" still gets one separator.
        }
        Self { search, offsets }
    }

    /// Map a char offset in `search` back to the normalized text.
    pub fn to_norm_offset(&self, search_char_offset: usize) -> usize {
        self.offsets
            .get(search_char_offset)
            .copied()
            .unwrap_or_else(|| self.offsets.last().copied().unwrap_or(0))
    }
}
