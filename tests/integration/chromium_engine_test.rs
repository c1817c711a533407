// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use casino_scraper::domain::models::target::Target;
use casino_scraper::engines::chromium_engine::ChromiumLauncher;
use casino_scraper::engines::traits::{
    BrowserLauncher, ClientIdentity, FetchError, FetchOptions,
};
use std::time::Duration;

fn launcher(ready_selector: &str) -> ChromiumLauncher {
    let options = FetchOptions {
        navigation_timeout: Duration::from_secs(20),
        content_ready_timeout: Duration::from_secs(2),
        ready_selector: ready_selector.to_string(),
        identity: ClientIdentity {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Chrome/124.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            viewport_width: 1366,
            viewport_height: 768,
        },
    };
    ChromiumLauncher::new(options, true)
}

const PAGE: &str = "data:text/html,<html><body><h1>Crazy Time</h1><table id='spin-history'><tbody><tr><td>12:01</td></tr></tbody></table></body></html>";

#[tokio::test]
#[ignore = "requires a local Chrome installation"]
async fn test_fetch_renders_page_with_real_browser() {
    let mut fetcher = launcher("table#spin-history tbody tr").launch().await.unwrap();

    let page = fetcher.fetch(&Target::with_label(PAGE, "inline")).await.unwrap();
    fetcher.close().await;

    assert!(page.html.contains("Crazy Time"));
    assert_eq!(page.label.as_deref(), Some("inline"));
}

#[tokio::test]
#[ignore = "requires a local Chrome installation"]
async fn test_missing_ready_selector_times_out() {
    let mut fetcher = launcher("table#biggest-wins").launch().await.unwrap();

    let result = fetcher.fetch(&Target::with_label(PAGE, "inline")).await;
    fetcher.close().await;

    assert!(matches!(result, Err(FetchError::ContentTimeout { .. })));
}
