//! Boundary scenario 4: alphabetical index (spec §8).
//!
//! A base page exposing single-character `A..Z` links (above the
//! alphabetical-index threshold) drives S4 traversal; each resolved
//! sub-page carries 3 cards, for a combined yield of 78 deduplicated
//! profiles.

use faculty_ingest::harvester;
use faculty_ingest::http_client::HttpClient;
use mockito::Matcher;
use std::time::Duration;

fn index_page() -> String {
    let letters: String = ('A'..='Z')
        .map(|c| format!(r#"<a href="/people?letter={c}">{c}</a>"#))
        .collect();
    format!(r#"<html><body><div class="index">{letters}</div></body></html>"#)
}

fn letter_subpage(letter: char) -> String {
    let mut cards = String::new();
    for i in 0..3 {
        cards.push_str(&format!(
            r#"<div class="people-item"><h3><a href="/people/{letter}-{i}">Faculty {letter}{i}</a></h3></div>"#
        ));
    }
    format!(r#"<html><body><div class="view-content">{cards}</div></body></html>"#)
}

#[tokio::test]
async fn alphabetical_index_yields_seventy_eight_in_source_order() {
    let mut server = mockito::Server::new_async().await;

    let mut letter_mocks = Vec::new();
    for letter in 'A'..='Z' {
        let mock = server
            .mock("GET", "/people")
            .match_query(Matcher::UrlEncoded("letter".into(), letter.to_string()))
            .with_status(200)
            .with_body(letter_subpage(letter))
            .create_async()
            .await;
        letter_mocks.push(mock);
    }

    let index_mock = server
        .mock("GET", "/people")
        .match_query(Matcher::Missing)
        .with_status(200)
        .with_body(index_page())
        .create_async()
        .await;

    let client = HttpClient::new(Duration::ZERO, Duration::from_secs(5)).unwrap();
    let directory_url = format!("{}/people", server.url());

    let outcome = harvester::harvest(&client, None, &directory_url).await;

    assert_eq!(outcome.candidates.len(), 78);
    assert!(outcome.diagnostics.stages_run.contains(&"S4"));

    // Source order: the first sub-page fetched is letter 'A'.
    assert!(outcome.candidates[0].name.starts_with("Faculty A"));

    index_mock.assert_async().await;
    for mock in &letter_mocks {
        mock.assert_async().await;
    }
}
