use regex::Regex;
use std::sync::LazyLock;

macro_rules! re {
    ($pat:expr) => {
        LazyLock::new(|| Regex::new($pat).unwrap())
    };
}

static RE_SCRIPT: LazyLock<Regex> = re!(r"(?is)<script\b.*?</script>");
static RE_STYLE: LazyLock<Regex> = re!(r"(?is)<style\b.*?</style>");
static RE_TAG: LazyLock<Regex> = re!(r"<[^>]+>");
static RE_SPACE: LazyLock<Regex> = re!(r"\s+");

/// Decode the HTML entities feeds commonly double-escape inside CDATA.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub fn collapse_whitespace(s: &str) -> String {
    RE_SPACE.replace_all(s, " ").trim().to_string()
}

/// Remove scripts, styles and tags, then collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let without_scripts = RE_SCRIPT.replace_all(html, " ");
    let without_styles = RE_STYLE.replace_all(&without_scripts, " ");
    let without_tags = RE_TAG.replace_all(&without_styles, " ");
    collapse_whitespace(&without_tags)
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
