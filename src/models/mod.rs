use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = u64;
pub type MatchId = u64;
pub type PredictionId = u64;

/// A ranked tour player. Identity is the normalized name (unique in the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub country: String,
    /// Lower number = better ranking. Unranked players carry `None`.
    pub rank: Option<u32>,
    pub points: Option<u32>,
    pub favorite: bool,
}

/// Where a record was obtained from. `Sample` marks synthetic fallback data so
/// consumers can tell real fixtures from generated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "api")]
    Api,
    #[serde(rename = "espn")]
    Espn,
    #[serde(rename = "365scores")]
    Scores365,
    #[serde(rename = "tennisprediction")]
    TennisPrediction,
    #[serde(rename = "sample")]
    Sample,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Source::Api => "api",
            Source::Espn => "espn",
            Source::Scores365 => "365scores",
            Source::TennisPrediction => "tennisprediction",
            Source::Sample => "sample",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Upcoming,
    Finished,
}

/// A finished or upcoming fixture between two persisted players. The player
/// pair is unordered for head-to-head purposes; `winner_id`, when set, must be
/// one of the two players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub winner_id: Option<PlayerId>,
    pub tournament: String,
    pub date: NaiveDate,
    pub surface: String,
    pub score: Option<String>,
    pub status: MatchStatus,
    pub source: Option<Source>,
    /// Source-scoped identifier; (source, external_id) is unique when both set.
    pub external_id: Option<String>,
}

impl Match {
    pub fn involves(&self, player: PlayerId) -> bool {
        self.player1_id == player || self.player2_id == player
    }

    pub fn is_between(&self, a: PlayerId, b: PlayerId) -> bool {
        (self.player1_id == a && self.player2_id == b)
            || (self.player1_id == b && self.player2_id == a)
    }
}

/// A computed opinion about a pair. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: PredictionId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub predicted_winner_id: PlayerId,
    /// The larger of the two normalized win probabilities, in [0, 1].
    pub confidence: f64,
    pub prediction_date: DateTime<Utc>,
}

/// Raw extractor output for a ranking row. Not persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub country: Option<String>,
    pub rank: Option<u32>,
    pub points: Option<u32>,
}

/// Raw extractor output for a fixture or result. Names are free text; the
/// reconciler resolves them to players and fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFixture {
    pub player1_name: String,
    pub player2_name: String,
    pub winner_name: Option<String>,
    pub tournament: Option<String>,
    pub date: Option<NaiveDate>,
    pub surface: Option<String>,
    pub score: Option<String>,
    pub status: Option<MatchStatus>,
    pub source: Option<Source>,
    pub external_id: Option<String>,
}

/// Which fixture list a fetch targets; selects the strategy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Recent,
    Upcoming,
}

/// Result of a fetch-and-persist pass: how many records landed and which
/// source supplied them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FetchOutcome {
    pub count: usize,
    pub source: Source,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tags_round_trip() {
        for source in [
            Source::Api,
            Source::Espn,
            Source::Scores365,
            Source::TennisPrediction,
            Source::Sample,
        ] {
            let json = serde_json::to_string(&source).unwrap();
            let back: Source = serde_json::from_str(&json).unwrap();
            assert_eq!(source, back);
            assert_eq!(json, format!("\"{}\"", source));
        }
    }

    #[test]
    fn match_pair_is_unordered() {
        let m = Match {
            id: 1,
            player1_id: 10,
            player2_id: 20,
            winner_id: None,
            tournament: "US Open".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            surface: "Hard".to_string(),
            score: None,
            status: MatchStatus::Upcoming,
            source: None,
            external_id: None,
        };
        assert!(m.is_between(10, 20));
        assert!(m.is_between(20, 10));
        assert!(!m.is_between(10, 30));
    }
}
