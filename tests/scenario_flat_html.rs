//! Boundary scenario 1: flat HTML, 60 faculty (spec §8).
//!
//! A directory page with 60 properly classed cards should be fully resolved
//! by S1 card extraction alone; the harvester must short-circuit before
//! reaching the CMS-AJAX or traversal stages.

use faculty_ingest::harvester;
use faculty_ingest::http_client::HttpClient;
use std::time::Duration;

fn flat_faculty_page(count: usize) -> String {
    let mut cards = String::new();
    for i in 0..count {
        cards.push_str(&format!(
            r#"<div class="people-item"><h3><a href="/people/faculty-{i}">Jane Smith {i}</a></h3></div>"#
        ));
    }
    format!(r#"<html><body><div class="faculty-list">{cards}</div></body></html>"#)
}

#[tokio::test]
async fn flat_html_sixty_faculty_short_circuits_at_s1() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/faculty")
        .with_status(200)
        .with_body(flat_faculty_page(60))
        .expect(1)
        .create_async()
        .await;

    let client = HttpClient::new(Duration::ZERO, Duration::from_secs(5)).unwrap();
    let directory_url = format!("{}/faculty", server.url());

    let outcome = harvester::harvest(&client, None, &directory_url).await;

    assert_eq!(outcome.candidates.len(), 60);
    assert_eq!(outcome.diagnostics.stages_run, vec!["S1"]);
    mock.assert_async().await;
}
