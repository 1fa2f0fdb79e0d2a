//! Traversal target discovery (spec §4.3.5): alphabetical index, pagination,
//! and scripted-endpoint heuristics, unioned and capped.
//!
//! Grounded on the source scraper's `_discover_traversal_targets`.

use crate::utils::resolve_url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

const MAX_TARGETS: usize = 50;
const ALPHABETICAL_THRESHOLD: usize = 15;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("BUG: invalid anchor selector"));
static PAGER_CONTAINER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class]").expect("BUG: invalid pager container selector"));
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script:not([src])").expect("BUG: invalid script selector"));

static SCRIPT_LETTER_PATTERNS: LazyLock<Vec<regex::Regex>> = LazyLock::new(|| {
    ["letter", "initial", "alpha", "filter"]
        .iter()
        .map(|key| {
            regex::Regex::new(&format!(r#"["']([^"']*[?&]{key}=)[A-Za-z]([^"']*)["']"#))
                .expect("BUG: invalid script-letter regex")
        })
        .collect()
});
static SCRIPT_PAGE_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"["'](/api/[^"']*[?&]page=)\d+([^"']*)["']"#).expect("BUG: invalid script-page regex")
});
static PAGER_CLASS_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?i)page|pager|pagination|nav").expect("BUG: invalid pager-class regex"));

/// Discover candidate hrefs to traverse next, resolved against `base_url` and
/// deduplicated, capped at [`MAX_TARGETS`].
#[must_use]
pub fn discover(document: &Html, base_url: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for href in alphabetical_index(document)
        .into_iter()
        .chain(pagination_links(document))
        .chain(scripted_endpoints(document))
    {
        let Some(resolved) = resolve_url(base_url, &href) else {
            continue;
        };
        if seen.insert(resolved.clone()) {
            out.push(resolved);
            if out.len() >= MAX_TARGETS {
                break;
            }
        }
    }
    out
}

fn alphabetical_index(document: &Html) -> Vec<String> {
    let anchors: Vec<_> = document
        .select(&ANCHOR_SELECTOR)
        .filter(|a| {
            let text: String = a.text().collect::<String>().trim().to_string();
            text.len() == 1 && text.chars().next().is_some_and(|c| c.is_alphabetic())
        })
        .collect();

    if anchors.len() < ALPHABETICAL_THRESHOLD {
        return Vec::new();
    }
    anchors
        .into_iter()
        .filter_map(|a| a.value().attr("href").map(str::to_string))
        .collect()
}

fn pagination_links(document: &Html) -> Vec<String> {
    let mut out = Vec::new();
    for container in document.select(&PAGER_CONTAINER_SELECTOR) {
        let Some(class) = container.value().attr("class") else {
            continue;
        };
        if !PAGER_CLASS_PATTERN.is_match(class) {
            continue;
        }
        for anchor in container.select(&ANCHOR_SELECTOR) {
            let text: String = anchor.text().collect::<String>().trim().to_string();
            let lower = text.to_lowercase();
            let looks_like_page_link = text.chars().all(|c| c.is_ascii_digit()) && !text.is_empty()
                || lower.contains("next")
                || text.contains('>')
                || text.contains('»')
                || text.contains('→');
            if looks_like_page_link
                && let Some(href) = anchor.value().attr("href")
            {
                out.push(href.to_string());
            }
        }
    }
    out
}

fn scripted_endpoints(document: &Html) -> Vec<String> {
    let mut out = Vec::new();
    for script in document.select(&SCRIPT_SELECTOR) {
        let text: String = script.text().collect();

        for pattern in SCRIPT_LETTER_PATTERNS.iter() {
            for cap in pattern.captures_iter(&text) {
                let prefix = &cap[1];
                let suffix = &cap[2];
                for letter in 'A'..='Z' {
                    out.push(format!("{prefix}{letter}{suffix}"));
                }
            }
        }

        for cap in SCRIPT_PAGE_PATTERN.captures_iter(&text) {
            let prefix = &cap[1];
            let suffix = &cap[2];
            for n in 1..=6 {
                out.push(format!("{prefix}{n}{suffix}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_alphabetical_index_when_above_threshold() {
        let letters = ('A'..='Z')
            .map(|c| format!("<a href=\"/people?letter={c}\">{c}</a>"))
            .collect::<String>();
        let html = format!("<div>{letters}</div>");
        let document = Html::parse_document(&html);
        let targets = discover(&document, "https://example.edu");
        assert_eq!(targets.len(), 26);
    }

    #[test]
    fn ignores_alphabetical_anchors_below_threshold() {
        let html = r#"<div><a href="/a">A</a><a href="/b">B</a></div>"#;
        let document = Html::parse_document(html);
        assert!(discover(&document, "https://example.edu").is_empty());
    }

    #[test]
    fn finds_pagination_next_link() {
        let html = r#"<nav class="pager"><a href="/people?page=2">Next &raquo;</a></nav>"#;
        let document = Html::parse_document(html);
        let targets = discover(&document, "https://example.edu");
        assert!(targets.iter().any(|t| t.contains("page=2")));
    }

    #[test]
    fn finds_next_link_with_no_arrow_glyph_case_insensitively() {
        let html = r#"<div class="pagination"><a href="/people?page=2">Next</a></div>"#;
        let document = Html::parse_document(html);
        let targets = discover(&document, "https://example.edu");
        assert!(targets.iter().any(|t| t.contains("page=2")));
    }

    #[test]
    fn expands_scripted_letter_endpoints() {
        let html = r#"<script>fetch('/api/people?letter=A');</script>"#;
        let document = Html::parse_document(html);
        let targets = discover(&document, "https://example.edu");
        assert_eq!(targets.len(), 26);
        assert!(targets.iter().any(|t| t.ends_with("letter=Z")));
    }
}
