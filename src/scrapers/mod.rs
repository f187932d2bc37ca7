pub mod espn;
pub mod scores365;
pub mod tennisprediction;

use std::time::Duration;

/// Shared reqwest client shape for the page scrapers: browser-ish user agent
/// and a hard per-request timeout so one dead site cannot stall the chain.
pub(crate) fn scraper_client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}
