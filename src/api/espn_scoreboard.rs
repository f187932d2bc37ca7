use crate::models::{MatchStatus, RawFixture, Source};
use crate::utils::dates::parse_date_loose;
use crate::utils::embedded_json::competitor_name;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use std::time::Duration as StdDuration;
use tracing::debug;

const SCOREBOARD_ENDPOINTS: [&str; 3] = [
    "https://site.api.espn.com/apis/site/v2/sports/tennis/scoreboard",
    "https://site.api.espn.com/apis/site/v2/sports/tennis/atp/scoreboard",
    "https://site.api.espn.com/apis/site/v2/sports/tennis/wta/scoreboard",
];

/// How far ahead the per-day scoreboard queries look.
const DATE_WINDOW_DAYS: i64 = 14;

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Direct JSON API client for the public scoreboard endpoints — the most
/// reliable extractor when reachable, so the chain tries it first. Follows the
/// extractor contract: any failure is logged and yields an empty list.
pub struct EspnScoreboardApi {
    client: reqwest::Client,
}

impl EspnScoreboardApi {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap(),
        }
    }

    /// Walk the known endpoints across the date window, collecting events
    /// until `limit` records have been gathered or the window is exhausted.
    pub async fn fetch_matches(&self, limit: usize) -> Vec<RawFixture> {
        let mut fixtures = Vec::new();
        let today = Utc::now().date_naive();

        'endpoints: for endpoint in SCOREBOARD_ENDPOINTS {
            for offset in 0..=DATE_WINDOW_DAYS {
                let day = today + Duration::days(offset);
                let url = format!("{}?dates={}", endpoint, day.format("%Y%m%d"));
                match self.fetch_day(&url).await {
                    Some(payload) => {
                        parse_scoreboard(&payload, limit, today, &mut fixtures);
                    }
                    None => continue,
                }
                if fixtures.len() >= limit {
                    break 'endpoints;
                }
            }
        }

        fixtures
    }

    async fn fetch_day(&self, url: &str) -> Option<Value> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "scoreboard request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "scoreboard returned non-success");
            return None;
        }
        match response.json::<Value>().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!(url, error = %e, "scoreboard payload was not JSON");
                None
            }
        }
    }
}

/// Parse one scoreboard payload's `events` array into raw fixtures. Tolerant
/// of the shape drift between payload vintages (athlete vs team competitors,
/// date vs startDate vs scheduled).
pub fn parse_scoreboard(
    payload: &Value,
    limit: usize,
    fallback_date: NaiveDate,
    fixtures: &mut Vec<RawFixture>,
) {
    let Some(events) = payload.get("events").and_then(Value::as_array) else {
        return;
    };

    for event in events {
        if fixtures.len() >= limit {
            break;
        }
        let Some(competitors) = event
            .get("competitions")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("competitors"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        if competitors.len() < 2 {
            continue;
        }
        let (Some(player1_name), Some(player2_name)) = (
            competitor_name(&competitors[0]),
            competitor_name(&competitors[1]),
        ) else {
            continue;
        };

        let tournament = ["tournament", "shortName", "name", "league"]
            .iter()
            .find_map(|key| event.get(*key).and_then(Value::as_str))
            .map(str::to_string);

        let date = ["date", "startDate", "scheduled"]
            .iter()
            .find_map(|key| event.get(*key).and_then(Value::as_str))
            .and_then(parse_date_loose);

        let surface = event
            .get("status")
            .and_then(|s| s.get("type"))
            .and_then(|t| t.get("detail"))
            .and_then(Value::as_str)
            .or_else(|| event.get("surface").and_then(Value::as_str))
            .map(str::to_string);

        let external_id = ["id", "uid", "guid"]
            .iter()
            .find_map(|key| event.get(*key))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        fixtures.push(RawFixture {
            player1_name,
            player2_name,
            tournament,
            date: Some(date.unwrap_or(fallback_date)),
            surface,
            status: Some(MatchStatus::Upcoming),
            source: Some(Source::Api),
            external_id,
            ..Default::default()
        });
    }
}
