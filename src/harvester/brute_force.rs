//! A-Z brute-force query-parameter trial (spec §4.3.6), the harvester's last
//! resort when traversal discovery finds nothing and yield is still thin.
//!
//! Grounded on the fallback phase of the source scraper's `get_faculty_list`.

use crate::harvester::card_extractor::{self, Candidate};
use crate::http_client::HttpClient;
use std::collections::HashSet;
use tracing::debug;

const PARAM_NAMES: &[&str] = &["letter", "initial", "q"];
const YIELD_CAP: usize = 100;

/// Try `base_url?param=X` for every letter A-Z and each candidate parameter
/// name, parsing the response only when the letter appears in the body (a
/// cheap relevance filter against directories that ignore the parameter and
/// just echo the same page). Stops once cumulative yield reaches [`YIELD_CAP`].
pub async fn trial(client: &HttpClient, base_url: &str) -> Vec<Candidate> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    'outer: for param in PARAM_NAMES {
        for letter in 'A'..='Z' {
            let url = format!("{base_url}?{param}={letter}");
            let body = match client.fetch(&url).await {
                Ok(b) => b,
                Err(e) => {
                    debug!(url, error = %e, "brute-force fetch failed, skipping");
                    continue;
                }
            };
            if !body.contains(letter) {
                continue;
            }
            for candidate in card_extractor::extract(&body, base_url) {
                if seen_urls.insert(candidate.profile_url.clone()) {
                    out.push(candidate);
                }
            }
            if out.len() >= YIELD_CAP {
                break 'outer;
            }
        }
    }
    out
}
