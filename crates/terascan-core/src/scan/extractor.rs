// Allow non_std_lazy_statics because we use lazy_regex! macro which uses once_cell internally
#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;

/// Marker every extracted link must contain (case-insensitive)
pub const LINK_MARKER: &str = "tera";

/// Zero-width spaces, joiners, word joiner and BOM
static RE_ZERO_WIDTH: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"[\x{200B}-\x{200D}\x{FEFF}\x{2060}]");

/// Runs of whitespace
static RE_WHITESPACE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\s+");

/// `http(s)://`, optional `www.`, then a non-whitespace run containing the marker
static RE_LINK: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(?i)https?://(?:www\.)?\S*tera\S*");

const fn is_link_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-')
}

fn is_candidate(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    lower.starts_with("http") && lower.contains(LINK_MARKER)
}

/// Extract marker links from a message text, in order of appearance.
///
/// Zero-width characters become spaces and whitespace is collapsed before
/// matching, so they separate links rather than glue them together.
/// Each match is cut at the first character outside `[A-Za-z0-9/:._-]`, and
/// scanning resumes right after the cut, so links glued together by
/// punctuation are found one by one. Duplicates are kept.
///
/// # Examples
///
/// ```
/// use terascan_core::scan::extract_links;
///
/// let links = extract_links("see https://terabox.com/s/abc, and (https://www.1024tera.com/s/x)");
/// assert_eq!(links, vec!["https://terabox.com/s/abc", "https://www.1024tera.com/s/x"]);
/// ```
#[must_use]
pub fn extract_links(text: &str) -> Vec<String> {
    let stripped = RE_ZERO_WIDTH.replace_all(text, " ");
    let collapsed = RE_WHITESPACE.replace_all(&stripped, " ");
    let normalized = collapsed.trim();

    let mut links = Vec::new();
    let mut pos = 0;
    while let Some(m) = RE_LINK.find_at(normalized, pos) {
        let raw = m.as_str();
        let end = raw.find(|c: char| !is_link_char(c)).unwrap_or(raw.len());
        let candidate = &raw[..end];
        if is_candidate(candidate) {
            links.push(candidate.to_string());
        }
        // A match always starts with "http", so `end` is never zero
        pos = m.start() + end.max(1);
    }
    links
}
