//! Shared constants and string/URL helpers used across the harvester.

use url::Url;

/// Chrome user agent string, shared by the HTTP client and browser renderer so
/// both collaborators present as the same browser to a target server.
///
/// Updated: 2025-01-29 to Chrome 132 (current stable).
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Default HTTP rate-limit delay between requests to the same domain.
pub const DEFAULT_RATE_LIMIT_SECS: f64 = 0.5;

/// Hard safety cap on the number of profiles a single harvest may return.
pub const MAX_PROFILES: usize = 250;

/// Academic titles/suffixes stripped from a candidate name during cleaning.
const NAME_PREFIXES: &[&str] = &[
    "Prof.",
    "Professor",
    "Dr-Ing.",
    "Dr.",
    "MD",
    "PhD",
    "M.Sc.",
    "Associate",
    "Assistant",
    "Emeritus",
    "Visiting",
    "Junior",
    "Senior",
];

/// Tokens that disqualify a candidate string from being a person's name —
/// site-navigation chrome rather than a faculty card.
pub const NAME_BLACKLIST: &[&str] = &[
    "Calendar",
    "Events",
    "News",
    "Contact",
    "Give",
    "Social",
    "Mission",
    "Values",
    "Diversity",
    "Search",
    "Login",
    "Resources",
    "Safety",
    "COVID",
    "History",
    "Map",
    "Jobs",
    "Career",
    "Colloquia",
    "Seminars",
    "About",
    "Home",
    "Student",
    "Alumni",
    "Portal",
    "Accessibility",
    "Privacy",
    "Statement",
    "Language",
    "Services",
    "Department",
    "Faculty Directory",
    "People Search",
    "Staff",
    "Overview",
];

/// Resolve `href` against `base`, returning `None` if either fails to parse.
#[must_use]
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Whether `text` plausibly names a person, per the source scraper's heuristic:
/// length 5-60, contains a space or comma, at least one alphabetic char, at
/// most four words, and no blacklisted navigation token.
#[must_use]
pub fn is_valid_name_format(text: &str) -> bool {
    let len = text.len();
    if !(5..=60).contains(&len) {
        return false;
    }
    if NAME_BLACKLIST.iter().any(|word| text.contains(word)) {
        return false;
    }
    if !text.contains(' ') && !text.contains(',') {
        return false;
    }
    if !text.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    if text.split_whitespace().count() > 4 {
        return false;
    }
    true
}

/// Strip academic prefixes/suffixes and trim stray punctuation from a name
/// already confirmed by [`is_valid_name_format`].
#[must_use]
pub fn clean_name(text: &str) -> String {
    let mut cleaned = text.to_string();
    for prefix in NAME_PREFIXES {
        cleaned = replace_case_insensitive(&cleaned, prefix, "");
    }
    cleaned.trim().trim_matches(',').trim().to_string()
}

fn replace_case_insensitive(haystack: &str, needle: &str, replacement: &str) -> String {
    let lower_haystack = haystack.to_lowercase();
    let lower_needle = needle.to_lowercase();
    if !lower_haystack.contains(&lower_needle) {
        return haystack.to_string();
    }
    let mut result = String::with_capacity(haystack.len());
    let mut rest = haystack;
    let mut lower_rest = lower_haystack.as_str();
    while let Some(idx) = lower_rest.find(&lower_needle) {
        result.push_str(&rest[..idx]);
        result.push_str(replacement);
        let end = idx + needle.len();
        rest = &rest[end..];
        lower_rest = &lower_rest[end..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_and_blacklisted_text() {
        assert!(!is_valid_name_format("Dr."));
        assert!(!is_valid_name_format("Faculty Directory Overview"));
        assert!(!is_valid_name_format("NoSpaceOrCommaHere1234"));
    }

    #[test]
    fn accepts_plausible_name() {
        assert!(is_valid_name_format("Jane A. Smith"));
        assert!(is_valid_name_format("Smith, Jane"));
    }

    #[test]
    fn cleans_academic_titles() {
        assert_eq!(clean_name("Prof. Jane Smith"), "Jane Smith");
        assert_eq!(clean_name("Jane Smith, PhD"), "Jane Smith");
    }

    #[test]
    fn resolves_relative_urls() {
        assert_eq!(
            resolve_url("https://example.com/dept/", "profile/jane").unwrap(),
            "https://example.com/dept/profile/jane"
        );
    }
}
