//! Browser Renderer (C2): single-shot headless render with consent dismissal
//! and "Load More" automation.
//!
//! Grounded on the teacher's `browser_setup::launch_browser` (executable
//! discovery, managed download fallback, launch args) and the source
//! scraper's `_render_with_browser` (consent click, hydration wait, load-more
//! loop, final scroll).

use crate::error::BrowserError;
use crate::utils::CHROME_USER_AGENT;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::{info, trace, warn};

const CARD_SELECTORS: &str =
    ".view-content article, .view-content .views-row, .people-row, .people-item, .inner-people-grid, table tr";
const LOAD_MORE_SELECTOR: &str =
    ".js-pager__items a, .pager__item a";
const CONSENT_TEXTS: &[&str] = &["Accept", "Agree", "I agree", "Allow"];

/// Locate a Chrome/Chromium executable, searching the usual per-platform
/// install paths before falling back to a managed download.
pub async fn find_or_download_browser() -> Result<PathBuf, BrowserError> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &[r"C:\Program Files\Google\Chrome\Application\chrome.exe"]
    } else if cfg!(target_os = "macos") {
        &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ]
    };
    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    return Ok(PathBuf::from(path_str));
                }
            }
        }
    }

    download_managed_browser().await
}

async fn download_managed_browser() -> Result<PathBuf, BrowserError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("faculty_ingest")
        .join("chromium");
    std::fs::create_dir_all(&cache_dir)
        .map_err(|e| BrowserError::ExecutableUnavailable(e.to_string()))?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .map_err(|e| BrowserError::ExecutableUnavailable(e.to_string()))?,
    );
    let revision_info = fetcher
        .fetch()
        .await
        .map_err(|e| BrowserError::ExecutableUnavailable(e.to_string()))?;
    Ok(revision_info.executable_path)
}

/// Launch a headless browser with the same stealth-launch-arg profile as the
/// HTTP client's user agent, so both collaborators present identically.
pub async fn launch(chrome_data_dir: Option<PathBuf>) -> Result<Browser, BrowserError> {
    let chrome_path = find_or_download_browser().await?;
    let user_data_dir = chrome_data_dir
        .unwrap_or_else(|| std::env::temp_dir().join(format!("faculty_ingest_chrome_{}", std::process::id())));
    std::fs::create_dir_all(&user_data_dir)
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    let config = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1920, 1080)
        .user_data_dir(user_data_dir)
        .chrome_executable(chrome_path)
        .headless_mode(HeadlessMode::default())
        .arg(format!("--user-agent={CHROME_USER_AGENT}"))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--no-first-run")
        .arg("--mute-audio")
        .build()
        .map_err(BrowserError::LaunchFailed)?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    tokio::task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let msg = e.to_string();
                let benign = msg.contains("data did not match any variant of untagged enum Message")
                    || msg.contains("Failed to deserialize WS response");
                if benign {
                    trace!("suppressed benign CDP error: {msg}");
                } else {
                    warn!("browser handler error: {msg}");
                }
            }
        }
    });

    Ok(browser)
}

/// Render `url`: navigate, dismiss consent, wait for hydration, exhaust
/// "Load More", scroll, and return the final `outerHTML`. Never raises —
/// a failure at any stage downgrades to whatever HTML was captured so far,
/// or is surfaced as `Err` only when nothing could be captured at all.
pub async fn render(browser: &Browser, url: &str) -> Result<String, BrowserError> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| BrowserError::NavigationFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if tokio::time::timeout(Duration::from_secs(30), page.wait_for_navigation())
        .await
        .is_err()
    {
        warn!(url, "navigation timed out, continuing with partial content");
    }

    dismiss_consent(&page).await;

    if tokio::time::timeout(Duration::from_secs(10), wait_for_any_card(&page))
        .await
        .is_err()
    {
        info!(url, "hydration wait timed out, capturing what's visible");
    }

    exhaust_load_more(&page).await;

    let _ = page.evaluate("window.scrollTo(0, document.body.scrollHeight)").await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let html = page
        .content()
        .await
        .map_err(|e| BrowserError::EvaluationFailed(e.to_string()))?;

    Ok(html)
}

async fn dismiss_consent(page: &chromiumoxide::Page) {
    let script = format!(
        r#"(() => {{
            const texts = {CONSENT_TEXTS:?}.map(x => x.toLowerCase());
            const buttons = Array.from(document.querySelectorAll('button'));
            for (const btn of buttons) {{
                const t = (btn.innerText || '').trim().toLowerCase();
                if (texts.some(x => t.includes(x))) {{
                    btn.click();
                    return true;
                }}
            }}
            return false;
        }})()"#
    );
    let _ = tokio::time::timeout(Duration::from_secs(3), page.evaluate(script)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
}

async fn wait_for_any_card(page: &chromiumoxide::Page) {
    loop {
        let script = format!(
            "document.querySelectorAll('{CARD_SELECTORS}').length > 0"
        );
        if let Ok(result) = page.evaluate(script.as_str()).await
            && let Ok(found) = result.into_value::<bool>()
            && found
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}

async fn current_card_count(page: &chromiumoxide::Page) -> i64 {
    let script = format!(
        "document.querySelectorAll('{}').length",
        ".view-content article, .view-content .views-row, .people-row, .people-item, .inner-people-grid"
    );
    page.evaluate(script.as_str())
        .await
        .ok()
        .and_then(|r| r.into_value::<i64>().ok())
        .unwrap_or(0)
}

async fn exhaust_load_more(page: &chromiumoxide::Page) {
    for trial in 0..25 {
        let click_script = format!(
            r#"(() => {{
                const links = Array.from(document.querySelectorAll('{LOAD_MORE_SELECTOR}'));
                const btn = links.find(a => (a.innerText || '').includes('Load more'));
                if (btn) {{ btn.click(); return true; }}
                return false;
            }})()"#
        );
        let clicked = page
            .evaluate(click_script.as_str())
            .await
            .ok()
            .and_then(|r| r.into_value::<bool>().ok())
            .unwrap_or(false);
        if !clicked {
            break;
        }

        let before = current_card_count(page).await;
        let grew = tokio::time::timeout(Duration::from_secs(8), async {
            loop {
                if current_card_count(page).await > before {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
        })
        .await
        .is_ok();

        if !grew {
            break;
        }
        trace!(trial, "load-more click increased card count");
    }
}
