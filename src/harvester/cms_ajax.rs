//! Drupal-flavored CMS-AJAX protocol (spec §4.3.3).
//!
//! Grounded on the source scraper's `_try_drupal_ajax_crawl`/`_select_best_view`:
//! the dual `view_name`/`_view_name` spelling, the CSRF/form-state extraction,
//! and the "insert command" response shape are all carried over unchanged.

use crate::harvester::card_extractor::{self, Candidate};
use crate::http_client::HttpClient;
use crate::utils::resolve_url;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[data-drupal-selector='drupal-settings-json']").expect("BUG: invalid script selector"));
static PAGER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='pager']").expect("BUG: invalid pager selector"));
static EXPOSED_FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form.views-exposed-form").expect("BUG: invalid form selector"));
static FORM_INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("BUG: invalid input selector"));
static FORM_SELECT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select").expect("BUG: invalid select selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("BUG: invalid anchor selector"));

const MAX_PAGES: u32 = 50;

/// Whether `document` carries a parseable `drupal-settings-json` script with
/// a non-empty `views.ajaxViews` map.
#[must_use]
pub fn detect(document: &Html) -> Option<Value> {
    let script = document.select(&SCRIPT_SELECTOR).next()?;
    let text: String = script.text().collect();
    let settings: Value = serde_json::from_str(&text).ok()?;
    let views = settings.get("views")?.get("ajaxViews")?;
    if views.as_object().is_some_and(|o| !o.is_empty()) {
        Some(settings)
    } else {
        None
    }
}

/// Run the AJAX pagination loop, returning every candidate harvested across
/// all pages. Never returns `Err` — any failure simply ends the loop early
/// with whatever was accumulated.
pub async fn crawl(
    client: &HttpClient,
    document: &Html,
    settings: &Value,
    directory_url: &str,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_hashes: HashSet<u64> = HashSet::new();

    let Some(view) = select_best_view(document, settings) else {
        return out;
    };
    let form_state = extract_form_state(document);
    let ajax_path = settings
        .get("views")
        .and_then(|v| v.get("ajax_path"))
        .and_then(Value::as_str)
        .unwrap_or("/views/ajax");
    let Some(endpoint) = resolve_url(directory_url, ajax_path) else {
        return out;
    };

    // If the primary endpoint ever answers with something other than JSON,
    // retry exactly once against the directory URL itself as the AJAX
    // endpoint before giving up on pagination entirely.
    let mut endpoint = endpoint;
    let mut fell_back_to_directory = false;

    let mut page = 0u32;
    loop {
        if page > MAX_PAGES {
            break;
        }
        let form = build_payload(&view, &form_state, settings, page);
        let response = match client.post_form(&endpoint, directory_url, &form).await {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "AJAX request failed, stopping pagination");
                break;
            }
        };

        let is_json = response
            .headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if !is_json {
            if !fell_back_to_directory && endpoint != directory_url {
                debug!("non-JSON AJAX response, retrying against the directory URL");
                fell_back_to_directory = true;
                endpoint = directory_url.to_string();
                continue;
            }
            debug!("non-JSON AJAX response, stopping pagination");
            break;
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => break,
        };
        let commands: Vec<Value> = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) => break,
        };

        let hash = content_hash(&body);
        if !seen_hashes.insert(hash) {
            debug!(page, "repeated AJAX response, stopping pagination (loop guard)");
            break;
        }

        let mut new_this_page = 0;
        for command in &commands {
            if command.get("command").and_then(Value::as_str) != Some("insert") {
                continue;
            }
            let Some(fragment) = command.get("data").and_then(Value::as_str) else {
                continue;
            };
            for candidate in card_extractor::extract(fragment, directory_url) {
                if seen_urls.insert(candidate.profile_url.clone()) {
                    new_this_page += 1;
                    out.push(candidate);
                }
            }
        }

        if new_this_page == 0 && page > 0 {
            break;
        }
        page += 1;
    }

    out
}

struct ViewTarget {
    dom_id: String,
    name: String,
    display_id: String,
    args: String,
    path: String,
}

fn select_best_view(document: &Html, settings: &Value) -> Option<ViewTarget> {
    let views = settings.get("views")?.get("ajaxViews")?.as_object()?;
    let mut best: Option<(usize, ViewTarget)> = None;

    for config in views.values() {
        let Some(dom_id) = config.get("view_dom_id").and_then(Value::as_str) else {
            continue;
        };
        let selector_str = format!(".js-view-dom-id-{dom_id}");
        let Ok(selector) = Selector::parse(&selector_str) else {
            continue;
        };
        let Some(view_el) = document.select(&selector).next() else {
            continue;
        };

        let count = view_el
            .select(&ANCHOR_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| {
                href.len() > 5
                    && !href.starts_with("http")
                    && !href.starts_with("mailto:")
                    && href != &"#"
            })
            .count();

        if best.as_ref().is_none_or(|(best_count, _)| count > *best_count) {
            let target = ViewTarget {
                dom_id: dom_id.to_string(),
                name: config.get("view_name").and_then(Value::as_str).unwrap_or_default().to_string(),
                display_id: config.get("view_display_id").and_then(Value::as_str).unwrap_or_default().to_string(),
                args: config.get("view_args").and_then(Value::as_str).unwrap_or_default().to_string(),
                path: config.get("view_path").and_then(Value::as_str).unwrap_or_default().to_string(),
            };
            best = Some((count, target));
        }
    }

    best.map(|(_, target)| target)
}

fn extract_form_state(document: &Html) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(form) = document.select(&EXPOSED_FORM_SELECTOR).next() {
        for input in form.select(&FORM_INPUT_SELECTOR) {
            if let Some(name) = input.value().attr("name") {
                let value = input.value().attr("value").unwrap_or_default();
                pairs.push((name.to_string(), value.to_string()));
            }
        }
        for select in form.select(&FORM_SELECT_SELECTOR) {
            if let Some(name) = select.value().attr("name") {
                pairs.push((name.to_string(), String::new()));
            }
        }
    }
    if !pairs.iter().any(|(k, _)| k == "form_id") {
        pairs.push(("form_id".to_string(), "views_exposed_form".to_string()));
    }
    pairs
}

fn build_payload(
    view: &ViewTarget,
    form_state: &[(String, String)],
    settings: &Value,
    page: u32,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("view_name".to_string(), view.name.clone()),
        ("view_display_id".to_string(), view.display_id.clone()),
        ("_view_name".to_string(), view.name.clone()),
        ("_view_display_id".to_string(), view.display_id.clone()),
        ("view_args".to_string(), view.args.clone()),
        ("view_path".to_string(), view.path.clone()),
        ("view_dom_id".to_string(), view.dom_id.clone()),
        ("pager_element".to_string(), "0".to_string()),
        ("page".to_string(), page.to_string()),
        ("_drupal_ajax".to_string(), "1".to_string()),
    ];

    if let Some(page_state) = settings.get("ajaxPageState") {
        for key in ["theme", "theme_token", "libraries"] {
            if let Some(value) = page_state.get(key).and_then(Value::as_str) {
                form.push((format!("ajax_page_state[{key}]"), value.to_string()));
            }
        }
    }

    for (key, value) in form_state {
        if let Some(slot) = form.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.clone();
        } else {
            form.push((key.clone(), value.clone()));
        }
    }

    form
}

fn content_hash(body: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    body.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_drupal_settings_with_ajax_views() {
        let html = r#"
            <script data-drupal-selector="drupal-settings-json">
                {"views":{"ajaxViews":{"views_dom_id:1":{"view_name":"faculty","view_display_id":"page_1","view_dom_id":"1"}}, "ajax_path":"/views/ajax"}}
            </script>
        "#;
        let document = Html::parse_document(html);
        assert!(detect(&document).is_some());
    }

    #[test]
    fn absent_settings_yield_none() {
        let document = Html::parse_document("<html><body>no settings here</body></html>");
        assert!(detect(&document).is_none());
    }

    #[test]
    fn form_state_injects_default_form_id() {
        let document = Html::parse_document("<form class=\"views-exposed-form\"></form>");
        let state = extract_form_state(&document);
        assert!(state.iter().any(|(k, v)| k == "form_id" && v == "views_exposed_form"));
    }
}
