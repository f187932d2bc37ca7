use crate::models::{MatchStatus, RankingEntry, RawFixture, Source};
use crate::scrapers::scraper_client;
use crate::utils::dates::parse_date_loose;
use crate::utils::embedded_json::{extract_events, extract_json_blocks};
use crate::utils::normalize::normalize_player_name;
use crate::utils::surface::surface_from_text;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const RANKINGS_URL: &str = "https://www.espn.com.ar/tenis/rankings";
const CALENDAR_URL: &str = "https://www.espn.com.ar/tenis/calendario";

/// Embedded payload blobs below this size are noise, not data.
const MIN_EMBEDDED_BLOCK_LEN: usize = 200;

/// HTML scraper for the rankings table and the tournament calendar. Markup
/// varies between deployments, so every field is extracted through a list of
/// fallback selectors.
pub struct EspnScraper {
    client: reqwest::Client,
}

impl EspnScraper {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: scraper_client(user_agent),
        }
    }

    async fn fetch_page(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "page request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "page returned non-success");
            return None;
        }
        response.text().await.ok()
    }

    /// Scrape the singles rankings table, top `limit` rows.
    pub async fn fetch_rankings(&self, limit: usize) -> Vec<RankingEntry> {
        match self.fetch_page(RANKINGS_URL).await {
            Some(html) => parse_rankings(&html, limit),
            None => Vec::new(),
        }
    }

    /// Scrape upcoming matches from the calendar page. Large embedded JSON
    /// payloads are mined first (they carry cleaner data than the markup);
    /// plain HTML parsing is the fallback.
    pub async fn fetch_calendar_matches(&self, limit: usize) -> Vec<RawFixture> {
        let Some(html) = self.fetch_page(CALENDAR_URL).await else {
            return Vec::new();
        };
        let embedded = parse_embedded_payload(&html, limit);
        if !embedded.is_empty() {
            return embedded;
        }
        parse_calendar(&html, limit)
    }

    /// Targeted calendar scan for fixtures naming both players of a pair.
    pub async fn fetch_pair_matches(
        &self,
        player1: &str,
        player2: &str,
        limit: usize,
    ) -> Vec<RawFixture> {
        match self.fetch_page(CALENDAR_URL).await {
            Some(html) => parse_pair_blocks(&html, player1, player2, limit),
            None => Vec::new(),
        }
    }
}

/// Parse the rankings table. Tries the current table markup first and falls
/// back to bare rows; a row yields an entry only when both a rank and a name
/// could be extracted.
pub fn parse_rankings(html: &str, limit: usize) -> Vec<RankingEntry> {
    parse_rankings_inner(html, limit).unwrap_or_default()
}

fn parse_rankings_inner(html: &str, limit: usize) -> Option<Vec<RankingEntry>> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("tr.Table__TR, tr").ok()?;
    let rank_sel = Selector::parse(".rank_column, td:first-child").ok()?;
    let name_sel = Selector::parse("a.AnchorLink, td a").ok()?;
    let img_sel = Selector::parse("img").ok()?;
    let country_sel = Selector::parse(".rankings__teamLogo, .country, .team").ok()?;
    let cell_sel = Selector::parse("td").ok()?;

    let mut entries = Vec::new();
    for row in document.select(&row_sel) {
        if entries.len() >= limit {
            break;
        }

        let rank = match row
            .select(&rank_sel)
            .next()
            .and_then(|cell| digits(&element_text(&cell)))
        {
            Some(rank) => rank,
            None => continue,
        };

        let name = match row.select(&name_sel).next().map(|el| element_text(&el)) {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };

        let country = row
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("title"))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| {
                row.select(&country_sel)
                    .map(|el| element_text(&el))
                    .find(|t| !t.is_empty())
            });

        // Points are the largest number in the row; ranks and ages are small.
        let points = row
            .select(&cell_sel)
            .filter_map(|cell| digits(&element_text(&cell)))
            .max();

        entries.push(RankingEntry {
            name,
            country,
            rank: Some(rank),
            points,
        });
    }

    Some(entries)
}

/// Mine `<script>` bodies for balanced JSON blocks that contain event records.
pub fn parse_embedded_payload(html: &str, limit: usize) -> Vec<RawFixture> {
    parse_embedded_inner(html, limit).unwrap_or_default()
}

fn parse_embedded_inner(html: &str, limit: usize) -> Option<Vec<RawFixture>> {
    let document = Html::parse_document(html);
    let script_sel = Selector::parse("script").ok()?;

    let mut fixtures = Vec::new();
    for script in document.select(&script_sel) {
        if fixtures.len() >= limit {
            break;
        }
        let text = script.text().collect::<String>();
        if text.trim().len() < MIN_EMBEDDED_BLOCK_LEN {
            continue;
        }
        for block in extract_json_blocks(&text) {
            if fixtures.len() >= limit {
                break;
            }
            if block.len() < MIN_EMBEDDED_BLOCK_LEN {
                continue;
            }
            let Ok(parsed) = serde_json::from_str::<serde_json::Value>(block) else {
                continue;
            };
            for event in extract_events(&parsed, limit - fixtures.len()) {
                let surface = event
                    .surface
                    .clone()
                    .or_else(|| {
                        event
                            .tournament
                            .as_deref()
                            .and_then(surface_from_text)
                            .map(str::to_string)
                    });
                fixtures.push(RawFixture {
                    player1_name: event.player1,
                    player2_name: event.player2,
                    tournament: event.tournament,
                    date: event.date,
                    surface,
                    status: Some(MatchStatus::Upcoming),
                    source: Some(Source::Espn),
                    ..Default::default()
                });
            }
        }
    }

    Some(fixtures)
}

/// Plain-markup fallback for the calendar page.
pub fn parse_calendar(html: &str, limit: usize) -> Vec<RawFixture> {
    parse_calendar_inner(html, limit).unwrap_or_default()
}

fn parse_calendar_inner(html: &str, limit: usize) -> Option<Vec<RawFixture>> {
    let document = Html::parse_document(html);
    let event_sel = Selector::parse(
        ".calendar__event, .schedule__item, .event, .card, .match-block, .schedule-item",
    )
    .ok()?;
    let broad_sel = Selector::parse("article, li, div").ok()?;

    let mut fixtures = Vec::new();
    let blocks: Vec<ElementRef> = {
        let specific: Vec<ElementRef> = document.select(&event_sel).collect();
        if specific.is_empty() {
            document.select(&broad_sel).collect()
        } else {
            specific
        }
    };

    for block in blocks {
        if fixtures.len() >= limit {
            break;
        }
        if let Some(fixture) = fixture_from_block(&block) {
            fixtures.push(fixture);
        }
    }

    Some(fixtures)
}

fn fixture_from_block(block: &ElementRef) -> Option<RawFixture> {
    let date = block_date(block);
    let tournament = block_tournament(block);
    let players = block_players(block);
    if players.len() < 2 {
        return None;
    }

    let surface = tournament.as_deref().and_then(surface_from_text);

    Some(RawFixture {
        player1_name: players[0].clone(),
        player2_name: players[1].clone(),
        tournament,
        date,
        surface: surface.map(str::to_string),
        status: Some(MatchStatus::Upcoming),
        source: Some(Source::Espn),
        ..Default::default()
    })
}

/// Scan calendar blocks for ones that mention both players (full name or
/// surname, case-insensitive).
pub fn parse_pair_blocks(
    html: &str,
    player1: &str,
    player2: &str,
    limit: usize,
) -> Vec<RawFixture> {
    parse_pair_inner(html, player1, player2, limit).unwrap_or_default()
}

fn parse_pair_inner(
    html: &str,
    player1: &str,
    player2: &str,
    limit: usize,
) -> Option<Vec<RawFixture>> {
    let document = Html::parse_document(html);
    let block_sel =
        Selector::parse("article, .card, .calendar__event, .schedule__item, .match-row, .event")
            .ok()?;

    let needles1 = name_needles(player1);
    let needles2 = name_needles(player2);

    let mut fixtures = Vec::new();
    for block in document.select(&block_sel) {
        if fixtures.len() >= limit {
            break;
        }
        let text = block.text().collect::<String>().to_lowercase();
        if !needles1.iter().any(|n| text.contains(n)) || !needles2.iter().any(|n| text.contains(n))
        {
            continue;
        }

        let date = block_date(&block);
        let tournament = block_tournament(&block);
        let surface = tournament.as_deref().and_then(surface_from_text);

        fixtures.push(RawFixture {
            player1_name: player1.to_string(),
            player2_name: player2.to_string(),
            tournament,
            date,
            surface: surface.map(str::to_string),
            status: Some(MatchStatus::Upcoming),
            source: Some(Source::Espn),
            ..Default::default()
        });
    }

    Some(fixtures)
}

fn name_needles(name: &str) -> Vec<String> {
    let normalized = normalize_player_name(name).to_lowercase();
    let mut needles = vec![normalized.clone()];
    if let Some(surname) = normalized.split_whitespace().last() {
        if surname != normalized {
            needles.push(surname.to_string());
        }
    }
    needles
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
    let date_sel = Selector::parse(".date, .event__date, .schedule__date, .match-date").ok()?;
    block
        .select(&date_sel)
        .next()
        .map(|el| element_text(&el))
        .and_then(|text| parse_date_loose(&text))
}

fn block_tournament(block: &ElementRef) -> Option<String> {
    let tournament_sel = Selector::parse(
        ".tournament-name, .competition, .tournament, h2, h3, .headline, .card-header",
    )
    .ok()?;
    block
        .select(&tournament_sel)
        .map(|el| element_text(&el))
        .find(|t| !t.is_empty())
}

fn block_players(block: &ElementRef) -> Vec<String> {
    let player_sel = Selector::parse(
        ".participant__name, .name, .player-name, .athlete, .athleteName, .participant",
    );
    let mut players: Vec<String> = match player_sel {
        Ok(sel) => block
            .select(&sel)
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    };

    if players.len() < 2 {
        // Anchor heuristic: player profile links, or short link texts that
        // look like a person's name.
        if let Ok(anchor_sel) = Selector::parse("a") {
            players = block
                .select(&anchor_sel)
                .filter(|a| {
                    let href = a.value().attr("href").unwrap_or_default();
                    let text = element_text(a);
                    href.contains("/player/")
                        || (!text.is_empty() && text.split_whitespace().count() <= 3)
                })
                .map(|a| element_text(&a))
                .filter(|t| !t.is_empty())
                .collect();
        }
    }

    players
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn digits(text: &str) -> Option<u32> {
    let filtered: String = text.chars().filter(char::is_ascii_digit).collect();
    if filtered.is_empty() {
        None
    } else {
        filtered.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANKINGS_HTML: &str = r#"
        <table><tbody>
          <tr class="Table__TR">
            <td class="rank_column">1</td>
            <td><a class="AnchorLink">Jannik Sinner</a>
                <img title="Italy" src="flag.png"/></td>
            <td>11,830</td>
          </tr>
          <tr class="Table__TR">
            <td class="rank_column">2</td>
            <td><a class="AnchorLink">Carlos Alcaraz</a>
                <img title="Spain" src="flag.png"/></td>
            <td>9,860</td>
          </tr>
          <tr><td>header junk</td></tr>
        </tbody></table>
    "#;

    #[test]
    fn parses_ranking_rows() {
        let entries = parse_rankings(RANKINGS_HTML, 50);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Jannik Sinner");
        assert_eq!(entries[0].rank, Some(1));
        assert_eq!(entries[0].points, Some(11830));
        assert_eq!(entries[0].country.as_deref(), Some("Italy"));
        assert_eq!(entries[1].name, "Carlos Alcaraz");
    }

    #[test]
    fn ranking_limit_is_honored() {
        let entries = parse_rankings(RANKINGS_HTML, 1);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn parses_calendar_event_blocks() {
        let html = r#"
          <div class="calendar__event">
            <time datetime="2025-08-12T17:00:00Z"></time>
            <span class="tournament">Cincinnati Open</span>
            <span class="participant__name">Jannik Sinner</span>
            <span class="participant__name">Carlos Alcaraz</span>
          </div>
        "#;
        let fixtures = parse_calendar(html, 10);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].player1_name, "Jannik Sinner");
        assert_eq!(fixtures[0].tournament.as_deref(), Some("Cincinnati Open"));
        assert_eq!(fixtures[0].date, NaiveDate::from_ymd_opt(2025, 8, 12));
        assert_eq!(fixtures[0].surface.as_deref(), Some("Hard"));
        assert_eq!(fixtures[0].source, Some(Source::Espn));
    }

    #[test]
    fn embedded_payload_wins_over_markup() {
        let filler = "x".repeat(300);
        let html = format!(
            r#"<html><head><script>window.__DATA__ = {{"filler": "{filler}",
               "events": [{{"name": "ATP Toronto", "startDate": "2025-08-05T15:00:00Z",
                 "competitions": [{{"competitors": [
                   {{"athlete": {{"displayName": "Holger Rune"}}}},
                   {{"athlete": {{"displayName": "Casper Ruud"}}}}
                 ]}}]}}]}};</script></head><body></body></html>"#
        );
        let fixtures = parse_embedded_payload(&html, 10);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].player1_name, "Holger Rune");
        assert_eq!(fixtures[0].player2_name, "Casper Ruud");
        assert_eq!(fixtures[0].tournament.as_deref(), Some("ATP Toronto"));
    }

    #[test]
    fn pair_scan_matches_on_surnames() {
        let html = r#"
          <article>
            <time datetime="2025-09-02"></time>
            <h3>US Open</h3>
            Sinner defiende el titulo contra Alcaraz en Nueva York.
          </article>
          <article><h3>Other news</h3>Nothing relevant here.</article>
        "#;
        let fixtures = parse_pair_blocks(html, "Jannik Sinner", "Carlos Alcaraz", 10);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].tournament.as_deref(), Some("US Open"));
        assert_eq!(fixtures[0].date, NaiveDate::from_ymd_opt(2025, 9, 2));
        assert_eq!(fixtures[0].player1_name, "Jannik Sinner");
    }

    #[test]
    fn pair_scan_requires_both_players() {
        let html = r#"<article><h3>US Open</h3>Solo Sinner aparece aqui.</article>"#;
        assert!(parse_pair_blocks(html, "Jannik Sinner", "Carlos Alcaraz", 10).is_empty());
    }
}
