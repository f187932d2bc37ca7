use crate::models::{Player, PlayerId, Prediction};
use crate::store::MatchStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

// Hand-chosen weights, not learned parameters. Kept as named constants so a
// tuning pass has one place to touch.
pub const RANKING_WEIGHT: f64 = 0.3;
pub const HEAD_TO_HEAD_WEIGHT: f64 = 0.2;
pub const RECENT_FORM_WEIGHT: f64 = 0.3;
pub const POINTS_WEIGHT: f64 = 0.2;

/// Rank assumed for players with no ranking on record.
const UNRANKED_RANK: f64 = 1000.0;

/// How many of a player's latest matches feed the form signal.
const RECENT_FORM_WINDOW: usize = 10;

/// A sub-score pair, normalized so the two sides describe the same signal.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PairScore {
    player1: f64,
    player2: f64,
}

impl PairScore {
    const EVEN: PairScore = PairScore {
        player1: 0.5,
        player2: 0.5,
    };

    fn normalized(a: f64, b: f64) -> PairScore {
        let total = a + b;
        if total <= 0.0 {
            PairScore::EVEN
        } else {
            PairScore {
                player1: a / total,
                player2: b / total,
            }
        }
    }
}

/// Win probabilities for a pair, without persistence.
#[derive(Debug, Clone, Serialize)]
pub struct ProbabilityBreakdown {
    pub player1_probability: f64,
    pub player2_probability: f64,
    pub predicted_winner_id: PlayerId,
    /// max(player1_probability, player2_probability)
    pub confidence: f64,
}

/// Full prediction result. `prediction` is `None` when the row failed store
/// validation — "computed but not recorded", not an error.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub player1_probability: f64,
    pub player2_probability: f64,
    pub predicted_winner_id: PlayerId,
    pub confidence: f64,
    pub prediction: Option<Prediction>,
}

/// Deterministic weighted-feature predictor. Stateless; every call reads the
/// store fresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionEngine;

impl PredictionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute win probabilities for a pair without persisting anything.
    ///
    /// Exact ties predict player1 by convention.
    pub fn preview(
        &self,
        store: &MatchStore,
        player1: &Player,
        player2: &Player,
    ) -> ProbabilityBreakdown {
        let ranking = self.ranking_score(player1, player2);
        let head_to_head = self.head_to_head_score(store, player1, player2);
        let recent_form = self.recent_form_score(store, player1, player2);
        let points = self.points_score(player1, player2);

        let player1_score = ranking.player1 * RANKING_WEIGHT
            + head_to_head.player1 * HEAD_TO_HEAD_WEIGHT
            + recent_form.player1 * RECENT_FORM_WEIGHT
            + points.player1 * POINTS_WEIGHT;
        let player2_score = ranking.player2 * RANKING_WEIGHT
            + head_to_head.player2 * HEAD_TO_HEAD_WEIGHT
            + recent_form.player2 * RECENT_FORM_WEIGHT
            + points.player2 * POINTS_WEIGHT;

        let combined = PairScore::normalized(player1_score, player2_score);
        let predicted_winner_id = if combined.player1 >= combined.player2 {
            player1.id
        } else {
            player2.id
        };

        ProbabilityBreakdown {
            player1_probability: combined.player1,
            player2_probability: combined.player2,
            predicted_winner_id,
            confidence: combined.player1.max(combined.player2),
        }
    }

    /// Compute probabilities and persist a Prediction row. A validation
    /// failure on insert is logged and leaves `prediction` empty.
    pub fn predict(
        &self,
        store: &MatchStore,
        player1: &Player,
        player2: &Player,
        now: DateTime<Utc>,
    ) -> PredictionOutcome {
        let breakdown = self.preview(store, player1, player2);

        let prediction = match store.insert_prediction(
            player1.id,
            player2.id,
            breakdown.predicted_winner_id,
            breakdown.confidence,
            now,
        ) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(player1 = %player1.name, player2 = %player2.name, error = %e,
                    "prediction not saved");
                None
            }
        };

        PredictionOutcome {
            player1_probability: breakdown.player1_probability,
            player2_probability: breakdown.player2_probability,
            predicted_winner_id: breakdown.predicted_winner_id,
            confidence: breakdown.confidence,
            prediction,
        }
    }

    /// Inverse ranking, normalized: a lower rank number scores higher.
    fn ranking_score(&self, player1: &Player, player2: &Player) -> PairScore {
        let rank1 = player1.rank.map_or(UNRANKED_RANK, f64::from);
        let rank2 = player2.rank.map_or(UNRANKED_RANK, f64::from);
        PairScore::normalized(1.0 / (rank1 + 1.0), 1.0 / (rank2 + 1.0))
    }

    /// Win shares over decided matches between the pair (either ordering),
    /// smoothed into [0.1, 0.9] so a tiny sample cannot produce a 0/1 signal.
    fn head_to_head_score(
        &self,
        store: &MatchStore,
        player1: &Player,
        player2: &Player,
    ) -> PairScore {
        let decided: Vec<_> = store
            .matches_between(player1.id, player2.id)
            .into_iter()
            .filter(|m| m.winner_id.is_some())
            .collect();
        if decided.is_empty() {
            return PairScore::EVEN;
        }

        let total = decided.len() as f64;
        let wins1 = decided
            .iter()
            .filter(|m| m.winner_id == Some(player1.id))
            .count() as f64;
        let wins2 = decided
            .iter()
            .filter(|m| m.winner_id == Some(player2.id))
            .count() as f64;

        PairScore {
            player1: (wins1 / total) * 0.8 + 0.1,
            player2: (wins2 / total) * 0.8 + 0.1,
        }
    }

    /// Win rate over each player's latest matches across all opponents,
    /// normalized against the other side.
    fn recent_form_score(
        &self,
        store: &MatchStore,
        player1: &Player,
        player2: &Player,
    ) -> PairScore {
        let form1 = self.recent_win_rate(store, player1.id);
        let form2 = self.recent_win_rate(store, player2.id);
        PairScore::normalized(form1, form2)
    }

    fn recent_win_rate(&self, store: &MatchStore, player: PlayerId) -> f64 {
        let recent = store.recent_matches_for_player(player, RECENT_FORM_WINDOW);
        if recent.is_empty() {
            return 0.5;
        }
        let wins = recent
            .iter()
            .filter(|m| m.winner_id == Some(player))
            .count() as f64;
        wins / recent.len() as f64
    }

    /// Ranking-points share; even when neither player has points.
    fn points_score(&self, player1: &Player, player2: &Player) -> PairScore {
        let points1 = player1.points.map_or(0.0, f64::from);
        let points2 = player2.points.map_or(0.0, f64::from);
        PairScore::normalized(points1, points2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;
    use crate::store::MatchDraft;
    use chrono::NaiveDate;

    const TOLERANCE: f64 = 1e-9;

    fn player(store: &MatchStore, name: &str, rank: Option<u32>, points: Option<u32>) -> Player {
        store.find_or_create_player(name);
        store.update_player_ranking(name, None, rank, points)
    }

    fn record_result(
        store: &MatchStore,
        p1: &Player,
        p2: &Player,
        winner: Option<&Player>,
        day: u32,
    ) {
        store
            .upsert_match(MatchDraft {
                id: None,
                player1_id: p1.id,
                player2_id: p2.id,
                winner_id: winner.map(|w| w.id),
                tournament: "Test Open".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
                surface: "Hard".to_string(),
                score: winner.map(|_| "6-4, 6-2".to_string()),
                status: MatchStatus::Finished,
                source: None,
                external_id: None,
            })
            .unwrap();
    }

    #[test]
    fn probabilities_sum_to_one() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(3), Some(5000));
        let b = player(&store, "B Two", Some(40), Some(1200));
        let engine = PredictionEngine::new();
        let result = engine.preview(&store, &a, &b);
        assert!((result.player1_probability + result.player2_probability - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn identical_players_split_even_and_tie_goes_to_player1() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(10), Some(2000));
        let b = player(&store, "B Two", Some(10), Some(2000));
        let engine = PredictionEngine::new();
        let result = engine.preview(&store, &a, &b);
        assert!((result.player1_probability - 0.5).abs() < TOLERANCE);
        assert!((result.player2_probability - 0.5).abs() < TOLERANCE);
        assert_eq!(result.predicted_winner_id, a.id);
    }

    #[test]
    fn head_to_head_stays_within_smoothing_bounds() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(5), Some(3000));
        let b = player(&store, "B Two", Some(6), Some(2900));
        // b sweeps the entire history; smoothing must keep both sides off the
        // extremes.
        for day in 1..=4 {
            record_result(&store, &a, &b, Some(&b), day);
        }
        let engine = PredictionEngine::new();
        let score = engine.head_to_head_score(&store, &a, &b);
        assert!((score.player1 - 0.1).abs() < TOLERANCE);
        assert!((score.player2 - 0.9).abs() < TOLERANCE);
    }

    #[test]
    fn confidence_is_the_max_probability() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(1), Some(9000));
        let b = player(&store, "B Two", Some(80), Some(700));
        let engine = PredictionEngine::new();
        let result = engine.preview(&store, &a, &b);
        assert!(
            (result.confidence
                - result.player1_probability.max(result.player2_probability))
            .abs()
                < TOLERANCE
        );
    }

    #[test]
    fn better_ranked_player_is_favored() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(5), Some(3000));
        let b = player(&store, "B Two", Some(20), Some(900));
        let engine = PredictionEngine::new();
        let result = engine.preview(&store, &a, &b);
        assert_eq!(result.predicted_winner_id, a.id);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn degenerate_self_match_does_not_panic() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(5), Some(3000));
        let engine = PredictionEngine::new();
        let result = engine.preview(&store, &a, &a);
        assert!((0.0..=1.0).contains(&result.player1_probability));
        assert!((0.0..=1.0).contains(&result.player2_probability));
        assert!((result.player1_probability + result.player2_probability - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn missing_rank_defaults_to_longshot() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(2), None);
        let b = player(&store, "B Two", None, None);
        let engine = PredictionEngine::new();
        let result = engine.preview(&store, &a, &b);
        assert!(result.player1_probability > result.player2_probability);
    }

    #[test]
    fn recent_form_counts_undecided_matches_against_both() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(5), Some(3000));
        let b = player(&store, "B Two", Some(6), Some(2900));
        let c = player(&store, "C Three", Some(7), Some(2800));
        // a wins two of three; b has one undecided fixture (counts in the
        // denominator, not the numerator).
        record_result(&store, &a, &c, Some(&a), 1);
        record_result(&store, &a, &c, Some(&a), 2);
        record_result(&store, &a, &c, Some(&c), 3);
        record_result(&store, &b, &c, None, 4);
        let engine = PredictionEngine::new();
        let score = engine.recent_form_score(&store, &a, &b);
        let expected = PairScore::normalized(2.0 / 3.0, 0.0);
        assert!((score.player1 - expected.player1).abs() < TOLERANCE);
        assert!((score.player2 - expected.player2).abs() < TOLERANCE);
    }

    #[test]
    fn predict_persists_a_valid_prediction() {
        let store = MatchStore::new();
        let a = player(&store, "A One", Some(5), Some(3000));
        let b = player(&store, "B Two", Some(20), Some(900));
        let engine = PredictionEngine::new();
        let outcome = engine.predict(&store, &a, &b, Utc::now());
        let prediction = outcome.prediction.expect("prediction persists");
        assert_eq!(prediction.predicted_winner_id, a.id);
        assert!((prediction.confidence - outcome.confidence).abs() < TOLERANCE);
        assert_eq!(store.recent_predictions(10).len(), 1);
    }
}
