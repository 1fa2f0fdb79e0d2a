//! Directory Harvester (C3): the S0-S6 strategy state machine (spec §4.3).
//!
//! Grounded on the source scraper's `get_faculty_list`, which tries a fixed
//! strategy order and short-circuits on a sufficiently large yield from any
//! single stage.

pub mod brute_force;
pub mod card_extractor;
pub mod cms_ajax;
pub mod traversal;

use crate::browser_renderer;
use crate::http_client::HttpClient;
use crate::utils::MAX_PROFILES;
use card_extractor::Candidate;
use chromiumoxide::browser::Browser;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

const SHORT_CIRCUIT_HTML_YIELD: usize = 40;
const SHORT_CIRCUIT_AJAX_YIELD: usize = 30;
const HYDRATION_SIGNAL_MIN_YIELD: usize = 15;
const TRAVERSAL_FLOOR: usize = 20;

static CMS_CLASS_HINT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".view-content, .views-view-grid, .people-list, .faculty-list, .directory, .grid, .row")
        .expect("BUG: invalid CMS-hint selector")
});
static PAGER_HINT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class*='pager'], [id*='pager']").expect("BUG: invalid pager-hint selector"));
static DRUPAL_SETTINGS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[data-drupal-selector='drupal-settings-json']")
        .expect("BUG: invalid drupal-settings selector")
});

/// Diagnostic record of which strategies ran and what each yielded, returned
/// alongside the harvest for observability (spec §9).
#[derive(Debug, Clone, Default)]
pub struct HarvestDiagnostics {
    pub stages_run: Vec<&'static str>,
    pub yields: Vec<(&'static str, usize)>,
}

pub struct HarvestOutcome {
    pub candidates: Vec<Candidate>,
    pub diagnostics: HarvestDiagnostics,
}

/// Run the full strategy cascade against `directory_url`. Never raises: every
/// stage failure is logged and treated as a zero-yield stage, and the
/// function always returns whatever it managed to accumulate.
pub async fn harvest(
    client: &HttpClient,
    browser: Option<&Browser>,
    directory_url: &str,
) -> HarvestOutcome {
    let mut accumulated: Vec<Candidate> = Vec::new();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut diagnostics = HarvestDiagnostics::default();

    macro_rules! merge {
        ($stage:expr, $new:expr) => {{
            let new = $new;
            let mut added = 0usize;
            for c in new {
                if seen_urls.insert(c.profile_url.clone()) {
                    accumulated.push(c);
                    added += 1;
                }
            }
            diagnostics.stages_run.push($stage);
            diagnostics.yields.push(($stage, added));
            added
        }};
    }

    // S0/S1: base fetch + card extraction.
    let base_html = match client.fetch(directory_url).await {
        Ok(html) => Some(html),
        Err(e) => {
            debug!(directory_url, error = %e, "S0 base fetch failed");
            None
        }
    };

    if let Some(html) = &base_html {
        merge!("S1", card_extractor::extract(html, directory_url));
    }

    if accumulated.len() > SHORT_CIRCUIT_HTML_YIELD {
        info!(count = accumulated.len(), "S1 short-circuit");
        return finish(accumulated, diagnostics);
    }

    // S2: JS-hydration detection + re-render.
    let mut rendered_html = None;
    if let Some(html) = &base_html
        && let Some(browser) = browser
        && looks_js_hydrated(html, accumulated.len())
    {
        match browser_renderer::render(browser, directory_url).await {
            Ok(html) => {
                merge!("S2", card_extractor::extract(&html, directory_url));
                rendered_html = Some(html);
            }
            Err(e) => warn!(directory_url, error = %e, "S2 browser render failed"),
        }
    }

    if accumulated.len() > SHORT_CIRCUIT_HTML_YIELD {
        info!(count = accumulated.len(), "post-S2 short-circuit");
        return finish(accumulated, diagnostics);
    }

    // S3: CMS-AJAX.
    let document_html = rendered_html.as_deref().or(base_html.as_deref());
    if let Some(html) = document_html {
        let document = Html::parse_document(html);
        if let Some(settings) = cms_ajax::detect(&document) {
            let ajax_candidates =
                cms_ajax::crawl(client, &document, &settings, directory_url).await;
            merge!("S3", ajax_candidates);
        }
    }

    if accumulated.len() > SHORT_CIRCUIT_AJAX_YIELD {
        info!(count = accumulated.len(), "S3 short-circuit");
        return finish(accumulated, diagnostics);
    }

    // S4: traversal target discovery + fetch-and-accumulate.
    let mut traversal_targets = Vec::new();
    if let Some(html) = document_html {
        let document = Html::parse_document(html);
        traversal_targets = traversal::discover(&document, directory_url);
        let mut traversal_candidates = Vec::new();
        for target in &traversal_targets {
            match client.fetch(target).await {
                Ok(html) => traversal_candidates.extend(card_extractor::extract(&html, target)),
                Err(e) => debug!(target, error = %e, "S4 traversal fetch failed"),
            }
        }
        merge!("S4", traversal_candidates);
    }

    if accumulated.len() < TRAVERSAL_FLOOR && traversal_targets.is_empty() {
        // S6: brute-force fallback.
        let brute = brute_force::trial(client, directory_url).await;
        merge!("S6", brute);
    }

    finish(accumulated, diagnostics)
}

fn finish(candidates: Vec<Candidate>, diagnostics: HarvestDiagnostics) -> HarvestOutcome {
    let mut candidates = candidates;
    candidates.truncate(MAX_PROFILES);
    HarvestOutcome {
        candidates,
        diagnostics,
    }
}

/// Spec §4.3.2: all three signals must hold for the Harvester to attempt a
/// browser render of the same URL.
fn looks_js_hydrated(html: &str, card_yield: usize) -> bool {
    if card_yield >= HYDRATION_SIGNAL_MIN_YIELD {
        return false;
    }
    let document = Html::parse_document(html);
    let has_cms_hint = document.select(&CMS_CLASS_HINT_SELECTOR).next().is_some();
    if !has_cms_hint {
        return false;
    }
    let has_settings_or_pager = document.select(&DRUPAL_SETTINGS_SELECTOR).next().is_some()
        || document.select(&PAGER_HINT_SELECTOR).next().is_some();
    has_settings_or_pager
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydration_signal_requires_all_three_conditions() {
        let sparse = r#"<div class="view-content"></div>"#;
        assert!(!looks_js_hydrated(sparse, 0));

        let with_pager = r#"<div class="view-content"><div class="pager"></div></div>"#;
        assert!(looks_js_hydrated(with_pager, 0));

        assert!(!looks_js_hydrated(with_pager, HYDRATION_SIGNAL_MIN_YIELD));
    }
}
