//! Regex-based HTML stripping and link extraction.
//!
//! Good enough for menu pages: the downstream matcher works on
//! normalized text, so structural fidelity does not matter, only that
//! visible text and anchor hrefs survive.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BLOCK_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:br\s*/?|/p|/div|/li|/tr|/h[1-6]|/section|/article)>").unwrap()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap()
});
static BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// An anchor from a page: absolute href plus its visible text.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Absolute URL after resolving against the page URL.
    pub href: String,

    /// Visible anchor text, tags stripped, whitespace collapsed.
    pub text: String,
}

/// Strip an HTML document down to its visible text.
///
/// Block-level closers become newlines so menu lines stay on separate
/// lines; everything else collapses to single spaces.
pub fn html_to_text(html: &str) -> String {
    let no_script = SCRIPT_RE.replace_all(html, " ");
    let no_style = STYLE_RE.replace_all(&no_script, " ");
    let no_comment = COMMENT_RE.replace_all(&no_style, " ");
    let with_breaks = BLOCK_END_RE.replace_all(&no_comment, "\n");
    let no_tags = TAG_RE.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&no_tags);
    let spaced = SPACE_RE.replace_all(&decoded, " ");
    let collapsed = BLANK_RE.replace_all(&spaced, "\n");
    collapsed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract anchors from an HTML document, resolving relative hrefs
/// against `base_url`. Non-navigational schemes (`javascript:`,
/// `mailto:`, `tel:`) and pure fragments are dropped.
pub fn extract_links(html: &str, base_url: &str) -> Vec<Link> {
    let base = match Url::parse(base_url) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };
    let mut links = Vec::new();
    for caps in ANCHOR_RE.captures_iter(html) {
        let href = caps[1].trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        let text = html_to_text(&caps[2]).replace('\n', " ").trim().to_string();
        links.push(Link {
            href: resolved.to_string(),
            text,
        });
    }
    links
}

/// Same-page anchors (`href="#menu"` style). Their href keeps the
/// leading `#`; they point at a section of the page they sit on.
pub fn fragment_anchors(html: &str) -> Vec<Link> {
    let mut links = Vec::new();
    for caps in ANCHOR_RE.captures_iter(html) {
        let href = caps[1].trim();
        if !href.starts_with('#') || href.len() < 2 {
            continue;
        }
        let text = html_to_text(&caps[2]).replace('\n', " ").trim().to_string();
        links.push(Link {
            href: href.to_string(),
            text,
        });
    }
    links
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&laquo;", "«")
        .replace("&raquo;", "»")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_style_and_tags() {
        let html = r#"<html><head><style>body{color:red}</style>
            <script>var x = "<b>not text</b>";</script></head>
            <body><h1>Меню</h1><p>Борщ &mdash; 350 &#8381;</p></body></html>"#;
        let text = html_to_text(html);
        assert!(text.contains("Меню"));
        assert!(text.contains("Борщ"));
        assert!(!text.contains("color:red"));
        assert!(!text.contains("not text"));
    }

    #[test]
    fn block_closers_become_newlines() {
        let text = html_to_text("<div>Суп дня</div><div>Салат Цезарь</div>");
        assert_eq!(text, "Суп дня\nСалат Цезарь");
    }

    #[test]
    fn decodes_common_entities() {
        let text = html_to_text("<p>Fish&nbsp;&amp;&nbsp;Chips</p>");
        assert_eq!(text, "Fish & Chips");
    }

    #[test]
    fn extracts_and_resolves_links() {
        let html = r##"<a href="/menu">Наше <b>меню</b></a>
            <a href="https://other.example/card.pdf">Карта блюд</a>
            <a href="#top">Наверх</a>
            <a href="mailto:info@cafe.example">Почта</a>"##;
        let links = extract_links(html, "https://cafe.example/about");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "https://cafe.example/menu");
        assert_eq!(links[0].text, "Наше меню");
        assert_eq!(links[1].href, "https://other.example/card.pdf");
    }

    #[test]
    fn bad_base_yields_nothing() {
        assert!(extract_links("<a href=\"/x\">x</a>", "nope").is_empty());
    }
}
