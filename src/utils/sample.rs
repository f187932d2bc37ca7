use crate::models::{FixtureKind, MatchStatus, RankingEntry, RawFixture, Source};
use crate::utils::surface::SURFACE_ROTATION;
use chrono::{Duration, NaiveDate};

/// Curated fallback top-20 so the system stays usable fully offline. Tagged
/// `sample` downstream; never mistaken for live data.
const SAMPLE_RANKINGS: [(&str, &str, u32, u32); 20] = [
    ("Novak Djokovic", "Serbia", 1, 10875),
    ("Carlos Alcaraz", "Spain", 2, 9760),
    ("Daniil Medvedev", "Russia", 3, 7775),
    ("Jannik Sinner", "Italy", 4, 7400),
    ("Alexander Zverev", "Germany", 5, 6125),
    ("Andrey Rublev", "Russia", 6, 5000),
    ("Stefanos Tsitsipas", "Greece", 7, 4810),
    ("Rafael Nadal", "Spain", 8, 4655),
    ("Casper Ruud", "Norway", 9, 4455),
    ("Taylor Fritz", "USA", 10, 3900),
    ("Holger Rune", "Denmark", 11, 3725),
    ("Felix Auger-Aliassime", "Canada", 12, 3445),
    ("Alex de Minaur", "Australia", 13, 3155),
    ("Tommy Paul", "USA", 14, 2995),
    ("Lorenzo Musetti", "Italy", 15, 2790),
    ("Ben Shelton", "USA", 16, 2555),
    ("Frances Tiafoe", "USA", 17, 2380),
    ("Grigor Dimitrov", "Bulgaria", 18, 2245),
    ("Sebastian Korda", "USA", 19, 2100),
    ("Hubert Hurkacz", "Poland", 20, 1985),
];

const SAMPLE_TOURNAMENTS: [&str; 11] = [
    "US Open",
    "Cincinnati Masters",
    "Canadian Open",
    "Wimbledon",
    "French Open",
    "Italian Open",
    "Madrid Open",
    "Indian Wells",
    "Miami Open",
    "Australian Open",
    "ATP Finals",
];

const SAMPLE_SCORES: [&str; 12] = [
    "6-4, 6-2",
    "7-6, 6-3",
    "6-3, 4-6, 6-2",
    "7-5, 6-4",
    "6-2, 6-3",
    "6-4, 3-6, 6-4",
    "7-6, 7-6",
    "6-1, 6-2",
    "6-3, 6-4",
    "7-6, 6-4",
    "6-2, 7-5",
    "6-4, 6-1",
];

pub fn sample_rankings() -> Vec<RankingEntry> {
    SAMPLE_RANKINGS
        .iter()
        .map(|(name, country, rank, points)| RankingEntry {
            name: (*name).to_string(),
            country: Some((*country).to_string()),
            rank: Some(*rank),
            points: Some(*points),
        })
        .collect()
}

/// Generate `limit` future-dated fixtures between two named players, spaced one
/// week apart starting a week out, cycling the fixed surface rotation.
pub fn sample_pair_fixtures(
    player1: &str,
    player2: &str,
    limit: usize,
    today: NaiveDate,
) -> Vec<RawFixture> {
    (0..limit)
        .map(|i| RawFixture {
            player1_name: player1.to_string(),
            player2_name: player2.to_string(),
            tournament: Some(format!("Fixture: {} vs {} #{}", player1, player2, i + 1)),
            date: Some(today + Duration::days(((i + 1) * 7) as i64)),
            surface: Some(SURFACE_ROTATION[i % SURFACE_ROTATION.len()].to_string()),
            status: Some(MatchStatus::Upcoming),
            source: Some(Source::Sample),
            ..Default::default()
        })
        .collect()
}

/// Deterministic synthetic fixture set when no player pair was requested.
/// `Recent` produces decided results over the past weeks; `Upcoming` produces
/// scheduled fixtures. Pairing, winners, and scores are keyed off the record
/// index so repeated runs generate identical data.
pub fn sample_fixtures(kind: FixtureKind, limit: usize, today: NaiveDate) -> Vec<RawFixture> {
    let names: Vec<&str> = SAMPLE_RANKINGS.iter().map(|(name, ..)| *name).collect();
    let mut fixtures = Vec::with_capacity(limit);

    for i in 0..limit {
        let a = i % names.len();
        let b = (i + 1 + i / names.len()) % names.len();
        if a == b {
            continue;
        }
        // The list is rank-ordered, so the lower index is the better-ranked
        // player; let them win two of every three synthetic results.
        let winner = if i % 3 == 2 {
            names[a.max(b)]
        } else {
            names[a.min(b)]
        };
        let tournament = SAMPLE_TOURNAMENTS[i % SAMPLE_TOURNAMENTS.len()];

        let fixture = match kind {
            FixtureKind::Recent => RawFixture {
                player1_name: names[a].to_string(),
                player2_name: names[b].to_string(),
                winner_name: Some(winner.to_string()),
                tournament: Some(tournament.to_string()),
                date: Some(today - Duration::days((i % 60 + 1) as i64)),
                score: Some(SAMPLE_SCORES[i % SAMPLE_SCORES.len()].to_string()),
                status: Some(MatchStatus::Finished),
                source: Some(Source::Sample),
                ..Default::default()
            },
            FixtureKind::Upcoming => RawFixture {
                player1_name: names[a].to_string(),
                player2_name: names[b].to_string(),
                tournament: Some(tournament.to_string()),
                date: Some(today + Duration::days((i % 14 + 1) as i64)),
                status: Some(MatchStatus::Upcoming),
                source: Some(Source::Sample),
                ..Default::default()
            },
        };
        fixtures.push(fixture);
    }

    fixtures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    #[test]
    fn rankings_are_ordered_top_20() {
        let rankings = sample_rankings();
        assert_eq!(rankings.len(), 20);
        assert_eq!(rankings[0].name, "Novak Djokovic");
        assert_eq!(rankings[0].rank, Some(1));
        assert_eq!(rankings[19].rank, Some(20));
    }

    #[test]
    fn pair_fixtures_are_weekly_with_cycling_surfaces() {
        let fixtures = sample_pair_fixtures("Alpha One", "Beta Two", 10, today());
        assert_eq!(fixtures.len(), 10);
        for (i, fixture) in fixtures.iter().enumerate() {
            assert_eq!(
                fixture.date,
                Some(today() + Duration::days(((i + 1) * 7) as i64))
            );
            assert_eq!(
                fixture.surface.as_deref(),
                Some(SURFACE_ROTATION[i % 3])
            );
            assert_eq!(fixture.source, Some(Source::Sample));
            assert_eq!(fixture.status, Some(MatchStatus::Upcoming));
        }
        assert_eq!(
            fixtures[0].tournament.as_deref(),
            Some("Fixture: Alpha One vs Beta Two #1")
        );
    }

    #[test]
    fn generic_fixtures_are_deterministic() {
        let first = sample_fixtures(FixtureKind::Recent, 25, today());
        let second = sample_fixtures(FixtureKind::Recent, 25, today());
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.player1_name, b.player1_name);
            assert_eq!(a.winner_name, b.winner_name);
            assert_eq!(a.date, b.date);
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn recent_fixtures_have_decided_winners() {
        for fixture in sample_fixtures(FixtureKind::Recent, 10, today()) {
            let winner = fixture.winner_name.expect("sample results are decided");
            assert!(winner == fixture.player1_name || winner == fixture.player2_name);
            assert_eq!(fixture.status, Some(MatchStatus::Finished));
            assert!(fixture.date.unwrap() < today());
        }
    }
}
