use crate::models::{MatchStatus, RawFixture, Source};
use crate::scrapers::scraper_client;
use crate::utils::dates::parse_date_loose;
use crate::utils::normalize::normalize_player_name;
use crate::utils::surface::surface_from_text;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

const TENNIS_URL: &str = "https://www.365scores.com/es/tennis";

/// "Player One vs Player Two" with multi-token capitalized names; accented
/// uppercase starts are common on the Spanish-language pages.
fn versus_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"([A-ZÀ-Ü][a-zà-ü]+(?:\s+[A-ZÀ-Ü][a-zà-ü]+)+)\s+(?i:vs)\.?\s+([A-ZÀ-Ü][a-zà-ü]+(?:\s+[A-ZÀ-Ü][a-zà-ü]+)+)",
        )
        .expect("versus pattern is valid")
    })
}

/// Fixture scraper for the 365Scores tennis page. The markup is dynamic and
/// changes often; structured selectors run first and a free-text "A vs B"
/// scan backs them up.
pub struct Scores365Scraper {
    client: reqwest::Client,
}

impl Scores365Scraper {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: scraper_client(user_agent),
        }
    }

    pub async fn fetch_matches(&self, limit: usize) -> Vec<RawFixture> {
        let response = match self.client.get(TENNIS_URL).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = TENNIS_URL, error = %e, "365scores request failed");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            debug!(url = TENNIS_URL, status = %response.status(), "365scores returned non-success");
            return Vec::new();
        }
        match response.text().await {
            Ok(html) => parse_matches(&html, limit),
            Err(_) => Vec::new(),
        }
    }
}

/// Parse the fixtures page; deduplicates by (player1, player2, date) since the
/// same match card often appears in several page sections.
pub fn parse_matches(html: &str, limit: usize) -> Vec<RawFixture> {
    parse_matches_inner(html, limit).unwrap_or_default()
}

fn parse_matches_inner(html: &str, limit: usize) -> Option<Vec<RawFixture>> {
    let document = Html::parse_document(html);
    let card_sel = Selector::parse(
        ".match, .match-row, .fixture, .event, .game-row, .fixture-row, .scheduled-match, .matchCard, .matchBox",
    )
    .ok()?;
    let home_sel = Selector::parse(
        ".participant--home .participant__name, .home .name, .player-home, .p1, .team-home, .player-left",
    )
    .ok()?;
    let away_sel = Selector::parse(
        ".participant--away .participant__name, .away .name, .player-away, .p2, .team-away, .player-right",
    )
    .ok()?;
    let tournament_sel =
        Selector::parse(".competition, .tournament, .league, .competition-name").ok()?;

    let mut fixtures = Vec::new();
    for card in document.select(&card_sel) {
        if fixtures.len() >= limit {
            break;
        }
        let home = card.select(&home_sel).next().map(|el| element_text(&el));
        let away = card.select(&away_sel).next().map(|el| element_text(&el));
        let (Some(p1), Some(p2)) = (home, away) else {
            continue;
        };
        if p1.is_empty() || p2.is_empty() {
            continue;
        }

        let tournament = card
            .select(&tournament_sel)
            .map(|el| element_text(&el))
            .find(|t| !t.is_empty());
        let card_text = card.text().collect::<String>();
        let surface = surface_from_text(&card_text)
            .or_else(|| tournament.as_deref().and_then(surface_from_text))
            .map(str::to_string);
        let external_id = card
            .value()
            .attr("data-event-id")
            .or_else(|| card.value().attr("data-id"))
            .map(str::to_string);

        fixtures.push(RawFixture {
            player1_name: normalize_player_name(&p1),
            player2_name: normalize_player_name(&p2),
            tournament,
            date: block_date(&card),
            surface,
            status: Some(MatchStatus::Upcoming),
            source: Some(Source::Scores365),
            external_id,
            ..Default::default()
        });
    }

    // Fallback: "A vs B" text scan across broad page blocks.
    if fixtures.is_empty() {
        let broad_sel = Selector::parse("tr, li, div, article, section").ok()?;
        for block in document.select(&broad_sel) {
            if fixtures.len() >= limit {
                break;
            }
            let text = block
                .text()
                .collect::<String>()
                .replace('\u{00A0}', " ");
            let squished = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if let Some(caps) = versus_pattern().captures(&squished) {
                fixtures.push(RawFixture {
                    player1_name: normalize_player_name(&caps[1]),
                    player2_name: normalize_player_name(&caps[2]),
                    status: Some(MatchStatus::Upcoming),
                    source: Some(Source::Scores365),
                    ..Default::default()
                });
            }
        }
    }

    // Dedup by normalized pair + date, first occurrence wins.
    let mut seen = HashSet::new();
    fixtures.retain(|f| {
        seen.insert((
            f.player1_name.to_lowercase(),
            f.player2_name.to_lowercase(),
            f.date,
        ))
    });
    fixtures.truncate(limit);

    Some(fixtures)
}

fn block_date(block: &ElementRef) -> Option<NaiveDate> {
    let time_sel = Selector::parse("time").ok()?;
    if let Some(date) = block
        .select(&time_sel)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .and_then(parse_date_loose)
    {
        return Some(date);
    }
    let date_sel =
        Selector::parse(".date, .event__date, .schedule__date, .match-date, .time").ok()?;
    block
        .select(&date_sel)
        .next()
        .map(|el| element_text(&el))
        .and_then(|text| parse_date_loose(&text))
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_match_cards() {
        let html = r#"
          <div class="match" data-event-id="88421">
            <span class="competition">ATP Masters Cincinnati</span>
            <time datetime="2025-08-12"></time>
            <div class="participant--home"><span class="participant__name">Jannik Sinner</span></div>
            <div class="participant--away"><span class="participant__name">Carlos Alcaraz</span></div>
          </div>
        "#;
        let fixtures = parse_matches(html, 10);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].player1_name, "Jannik Sinner");
        assert_eq!(fixtures[0].player2_name, "Carlos Alcaraz");
        assert_eq!(fixtures[0].external_id.as_deref(), Some("88421"));
        assert_eq!(fixtures[0].source, Some(Source::Scores365));
        assert_eq!(fixtures[0].date, NaiveDate::from_ymd_opt(2025, 8, 12));
    }

    #[test]
    fn falls_back_to_versus_text_scan() {
        let html = r#"
          <ul>
            <li>Daniil Medvedev vs Andrey Rublev - 14:30</li>
            <li>no fixture here</li>
          </ul>
        "#;
        let fixtures = parse_matches(html, 10);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].player1_name, "Daniil Medvedev");
        assert_eq!(fixtures[0].player2_name, "Andrey Rublev");
        assert_eq!(fixtures[0].date, None);
    }

    #[test]
    fn dedupes_repeated_cards() {
        let card = r#"
          <div class="match">
            <div class="participant--home"><span class="participant__name">Holger Rune</span></div>
            <div class="participant--away"><span class="participant__name">Casper Ruud</span></div>
          </div>
        "#;
        let html = format!("{card}{card}{card}");
        let fixtures = parse_matches(&html, 10);
        assert_eq!(fixtures.len(), 1);
    }

    #[test]
    fn accented_names_are_normalized() {
        let html = r#"<li>Félix Auger vs Gaël Monfils</li>"#;
        let fixtures = parse_matches(html, 10);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].player1_name, "Felix Auger");
        assert_eq!(fixtures[0].player2_name, "Gael Monfils");
    }
}
