//! Card extraction (spec §4.3.4): turn a chunk of directory-page HTML into
//! `{name, profile_url, email?}` records.
//!
//! Grounded on the source scraper's `_parse_faculty_from_soup` for the
//! block/container enumeration and link-validation rules, and on the
//! deleted `content_saver` markdown converter's `LazyLock<Selector>` idiom
//! for compiling CSS selectors once.

use crate::utils::{clean_name, is_valid_name_format, resolve_url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// A single faculty directory entry, deduplicated by `profile_url` upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub profile_url: String,
    pub email: Option<String>,
}

const PRIORITY_CLASSES: &[&str] = &[
    "view-content",
    "people-list",
    "faculty-list",
    "directory",
    "staff-list",
    "profiles",
    "people-row",
    "people-item",
    "inner-people-grid",
    "views-view-grid",
    "grid",
    "row",
];

const CONTAINER_TAGS: &[&str] = &["div", "li", "tr", "article", "section", "fieldset"];

const REJECTED_HREF_SUBSTRINGS: &[&str] = &[
    "facebook", "twitter", "linkedin", "mailto:", "tel:", "vcard", "google",
];
const REJECTED_HREF_EXTENSIONS: &[&str] = &[".jpg", ".png", ".pdf", ".docx", ".zip"];

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("BUG: invalid anchor selector"));
static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("BUG: invalid heading selector"));
static MAILTO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href^='mailto:']").expect("BUG: invalid mailto selector"));

static EMAIL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"[A-Za-z0-9._%+-]+@[\w.-]+\.[A-Za-z]{2,}").expect("BUG: invalid email regex")
});

/// Extract candidates from `html`, resolving relative hrefs against `base_url`.
#[must_use]
pub fn extract(html: &str, base_url: &str) -> Vec<Candidate> {
    let document = Html::parse_fragment(html);
    let blocks = priority_blocks(&document);
    let mut seen_urls = HashSet::new();
    let mut out = Vec::new();

    for block in blocks {
        for container in child_containers(block) {
            if let Some(candidate) = extract_from_container(container, base_url)
                && seen_urls.insert(candidate.profile_url.clone())
            {
                out.push(candidate);
            }
        }
    }
    out
}

fn priority_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    let mut blocks = Vec::new();
    for class in PRIORITY_CLASSES {
        let selector = match Selector::parse(&format!(".{class}")) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for element in document.select(&selector) {
            if !has_nav_ancestor(element) {
                blocks.push(element);
            }
        }
    }
    if blocks.is_empty() {
        blocks.push(document.root_element());
    }
    blocks
}

fn has_nav_ancestor(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "nav" | "header" | "footer"))
}

/// Every container-tagged element at or beneath `block`, including `block`
/// itself when its own tag qualifies. Mirrors the original scraper's
/// `block.find_all([...], recursive=True)` plus the block-as-container case:
/// cards nested below an intermediate wrapper (`div.view-content > table >
/// tbody > tr`, `div.view-content > ul > li`) must still be reachable.
fn child_containers(block: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    block
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| CONTAINER_TAGS.contains(&el.value().name()))
        .collect()
}

fn extract_from_container(container: ElementRef<'_>, base_url: &str) -> Option<Candidate> {
    let anchor = container.select(&ANCHOR_SELECTOR).next()?;
    let href = anchor.value().attr("href")?;
    if href.is_empty() || href.starts_with("javascript:") {
        return None;
    }
    let lower = href.to_lowercase();
    if REJECTED_HREF_SUBSTRINGS.iter().any(|s| lower.contains(s)) {
        return None;
    }
    if REJECTED_HREF_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return None;
    }

    let profile_url = resolve_url(base_url, href)?;
    let raw_name = pick_candidate_name(container, anchor)?;
    if !is_valid_name_format(&raw_name) {
        return None;
    }
    let name = clean_name(&raw_name);
    let email = extract_email(container);

    Some(Candidate {
        name,
        profile_url,
        email,
    })
}

/// Tries each name source in priority order, but only accepts a tier when its
/// text passes `is_valid_name_format` — an invalid heading (a section label,
/// say) must fall through to the next tier rather than winning by default.
fn pick_candidate_name(container: ElementRef<'_>, anchor: ElementRef<'_>) -> Option<String> {
    if let Some(text) = container
        .select(&HEADING_SELECTOR)
        .map(collapse_text)
        .find(|t| is_valid_name_format(t))
    {
        return Some(text);
    }

    if let Some(text) = container
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| class_matches(el, "name") || class_matches(el, "title"))
        .map(collapse_text)
        .find(|t| is_valid_name_format(t))
    {
        return Some(text);
    }

    if let Some(text) = container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "strong" | "b" | "a"))
        .map(collapse_text)
        .find(|t| is_valid_name_format(t))
    {
        return Some(text);
    }

    let text = collapse_text(anchor);
    if text.is_empty() { None } else { Some(text) }
}

fn class_matches(element: &ElementRef<'_>, needle: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|c| c.to_lowercase().contains(needle))
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_email(container: ElementRef<'_>) -> Option<String> {
    if let Some(anchor) = container.select(&MAILTO_SELECTOR).next() {
        return anchor
            .value()
            .attr("href")
            .and_then(|h| h.strip_prefix("mailto:"))
            .map(|s| s.trim().to_string());
    }

    let text = collapse_text(container);
    if let Some(m) = EMAIL_REGEX.find(&text) {
        return Some(m.as_str().to_string());
    }

    let deobfuscated = text.replace("[at]", "@").replace("(at)", "@").replace("[dot]", ".").replace("(dot)", ".");
    EMAIL_REGEX.find(&deobfuscated).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_url_and_mailto_email() {
        let html = r#"
            <div class="view-content">
                <div class="views-row">
                    <h3><a href="/people/jane-smith">Jane Smith, PhD</a></h3>
                    <a href="mailto:jane@example.edu">Email</a>
                </div>
            </div>
        "#;
        let out = extract(html, "https://example.edu/faculty");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Jane Smith");
        assert_eq!(out[0].profile_url, "https://example.edu/people/jane-smith");
        assert_eq!(out[0].email.as_deref(), Some("jane@example.edu"));
    }

    #[test]
    fn rejects_social_and_asset_links() {
        let html = r#"
            <div class="people-list">
                <div class="people-item"><a href="https://facebook.com/dept">Follow Us</a></div>
                <div class="people-item"><a href="/cv/smith.pdf">Jane Smith CV</a></div>
            </div>
        "#;
        assert!(extract(html, "https://example.edu").is_empty());
    }

    #[test]
    fn deduplicates_by_profile_url() {
        let html = r#"
            <div class="staff-list">
                <div><h4><a href="/p/jane">Jane A. Smith</a></h4></div>
                <div><h4><a href="/p/jane">Jane A. Smith</a></h4></div>
            </div>
        "#;
        let out = extract(html, "https://example.edu");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn falls_back_to_whole_document_without_priority_blocks() {
        let html = r#"<li><a href="/bio/john-doe">John Doe, Professor</a></li>"#;
        let out = extract(html, "https://example.edu");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "John Doe");
    }

    #[test]
    fn extracts_cards_nested_below_a_table_wrapper() {
        let html = r#"
            <div class="view-content">
                <table>
                    <tbody>
                        <tr><td><a href="/people/jane">Jane Table Row</a></td></tr>
                        <tr><td><a href="/people/john">John Table Row</a></td></tr>
                    </tbody>
                </table>
            </div>
        "#;
        let out = extract(html, "https://example.edu");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn extracts_cards_nested_below_a_list_wrapper() {
        let html = r#"
            <div class="view-content">
                <ul>
                    <li><a href="/people/amy">Amy Nested List</a></li>
                </ul>
            </div>
        "#;
        let out = extract(html, "https://example.edu");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Amy Nested List");
    }

    #[test]
    fn falls_through_to_name_class_when_heading_is_invalid() {
        let html = r#"
            <div class="people-item">
                <h3>Overview</h3>
                <span class="name">Jane Heading Fallback</span>
                <a href="/people/jane-heading">profile</a>
            </div>
        "#;
        let out = extract(html, "https://example.edu");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Jane Heading Fallback");
    }
}
