use crate::models::{MatchStatus, RawFixture, Source};
use crate::scrapers::scraper_client;
use crate::utils::normalize::normalize_player_name;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

const UPCOMING_URL: &str = "https://www.tennisprediction.com/?lng=6";

fn versus_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Z][a-z]+\s+[A-Z][a-z]+)\s+(?i:vs)\.?\s+([A-Z][a-z]+\s+[A-Z][a-z]+)")
            .expect("versus pattern is valid")
    })
}

/// Lines like "Player Name (ITA) 38.74%" mark this site's fixture tables.
fn percent_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z\s\.\-']{3,40})\s+\(.*?\)\s+\d{1,2}\.\d{1,2}%")
            .expect("percent pattern is valid")
    })
}

/// Fixture scraper for tennisprediction.com's upcoming-match listing.
pub struct TennisPredictionScraper {
    client: reqwest::Client,
}

impl TennisPredictionScraper {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: scraper_client(user_agent),
        }
    }

    pub async fn fetch_matches(&self, limit: usize) -> Vec<RawFixture> {
        let response = match self.client.get(UPCOMING_URL).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = UPCOMING_URL, error = %e, "tennisprediction request failed");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            debug!(url = UPCOMING_URL, status = %response.status(),
                "tennisprediction returned non-success");
            return Vec::new();
        }
        match response.text().await {
            Ok(html) => parse_matches(&html, limit),
            Err(_) => Vec::new(),
        }
    }
}

pub fn parse_matches(html: &str, limit: usize) -> Vec<RawFixture> {
    parse_matches_inner(html, limit).unwrap_or_default()
}

fn parse_matches_inner(html: &str, limit: usize) -> Option<Vec<RawFixture>> {
    let document = Html::parse_document(html);
    let block_sel = Selector::parse(".upcoming, .match, .fixture").ok()?;
    let player_sel = Selector::parse(".player, .name").ok()?;

    let mut fixtures = Vec::new();
    for block in document.select(&block_sel) {
        if fixtures.len() >= limit {
            break;
        }
        let players: Vec<String> = block
            .select(&player_sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if players.len() < 2 {
            continue;
        }
        fixtures.push(pair_fixture(&players[0], &players[1]));
    }

    if !fixtures.is_empty() {
        return Some(fixtures);
    }

    // Fallback: fixtures rendered as plain table rows or text with win
    // percentages next to the names.
    let row_sel = Selector::parse("tr, li, div").ok()?;
    for block in document.select(&row_sel) {
        if fixtures.len() >= limit {
            break;
        }
        let text = block.text().collect::<String>();
        let trimmed = text.trim();
        if let Some(caps) = versus_pattern().captures(trimmed) {
            fixtures.push(pair_fixture(&caps[1], &caps[2]));
            continue;
        }
        if percent_pattern().is_match(trimmed) {
            let names: Vec<&str> = percent_pattern()
                .captures_iter(trimmed)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
                .filter(|name| name.len() > 3)
                .collect();
            if names.len() >= 2 {
                fixtures.push(pair_fixture(names[0], names[1]));
            }
        }
    }

    Some(fixtures)
}

fn pair_fixture(p1: &str, p2: &str) -> RawFixture {
    RawFixture {
        player1_name: normalize_player_name(p1),
        player2_name: normalize_player_name(p2),
        status: Some(MatchStatus::Upcoming),
        source: Some(Source::TennisPrediction),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_blocks() {
        let html = r#"
          <div class="upcoming">
            <span class="player">Alexander Zverev</span>
            <span class="player">Stefanos Tsitsipas</span>
          </div>
        "#;
        let fixtures = parse_matches(html, 10);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].player1_name, "Alexander Zverev");
        assert_eq!(fixtures[0].player2_name, "Stefanos Tsitsipas");
        assert_eq!(fixtures[0].source, Some(Source::TennisPrediction));
    }

    #[test]
    fn falls_back_to_versus_rows() {
        let html = r#"<table><tr><td>Casper Ruud vs Holger Rune</td></tr></table>"#;
        let fixtures = parse_matches(html, 10);
        assert!(!fixtures.is_empty());
        assert_eq!(fixtures[0].player1_name, "Casper Ruud");
        assert_eq!(fixtures[0].player2_name, "Holger Rune");
    }

    #[test]
    fn extracts_pairs_from_percentage_lines() {
        let html = r#"<div>Taylor Fritz (USA) 61.20% Tommy Paul (USA) 38.80%</div>"#;
        let fixtures = parse_matches(html, 10);
        assert!(!fixtures.is_empty());
        assert_eq!(fixtures[0].player1_name, "Taylor Fritz");
        assert_eq!(fixtures[0].player2_name, "Tommy Paul");
    }

    #[test]
    fn limit_is_honored() {
        let mut html = String::from("<div class='upcoming'>");
        html.push_str("<span class='player'>First Player</span>");
        html.push_str("<span class='player'>Second Player</span>");
        html.push_str("</div>");
        let html = html.repeat(5);
        let fixtures = parse_matches(&html, 2);
        assert_eq!(fixtures.len(), 2);
    }
}
