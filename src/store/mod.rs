use crate::models::{
    Match, MatchId, MatchStatus, Player, PlayerId, Prediction, PredictionId, Source,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Fields for creating or updating a match. `id: None` means "insert unless an
/// identity key says otherwise".
#[derive(Debug, Clone)]
pub struct MatchDraft {
    pub id: Option<MatchId>,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub winner_id: Option<PlayerId>,
    pub tournament: String,
    pub date: NaiveDate,
    pub surface: String,
    pub score: Option<String>,
    pub status: MatchStatus,
    pub source: Option<Source>,
    pub external_id: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    players: BTreeMap<PlayerId, Player>,
    players_by_name: HashMap<String, PlayerId>,
    matches: BTreeMap<MatchId, Match>,
    matches_by_external: HashMap<(Source, String), MatchId>,
    predictions: Vec<Prediction>,
    next_player_id: PlayerId,
    next_match_id: MatchId,
    next_prediction_id: PredictionId,
}

/// In-memory record store implementing the repository contract the pipeline
/// needs: players unique on normalized name, matches unique on
/// (source, external_id) when both are present, predictions append-only.
///
/// Lookup-or-create runs under one write lock, so a concurrent create of the
/// same key resolves to "use the row the other writer made" rather than a
/// duplicate — the same outcome a relational uniqueness constraint gives.
#[derive(Debug, Default)]
pub struct MatchStore {
    inner: RwLock<Inner>,
}

/// Serializable image of the whole store, for JSON snapshot save/load.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    pub predictions: Vec<Prediction>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- players ---

    /// Look up a player by normalized name, creating one with placeholder
    /// attributes if absent. The caller normalizes; the store treats the name
    /// as an opaque unique key.
    pub fn find_or_create_player(&self, normalized_name: &str) -> Player {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if let Some(&id) = inner.players_by_name.get(normalized_name) {
            return inner.players[&id].clone();
        }
        inner.next_player_id += 1;
        let player = Player {
            id: inner.next_player_id,
            name: normalized_name.to_string(),
            country: "Unknown".to_string(),
            rank: None,
            points: None,
            favorite: false,
        };
        inner
            .players_by_name
            .insert(normalized_name.to_string(), player.id);
        inner.players.insert(player.id, player.clone());
        player
    }

    pub fn get_player(&self, id: PlayerId) -> Result<Player, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .players
            .get(&id)
            .cloned()
            .ok_or(StoreError::PlayerNotFound(id))
    }

    pub fn find_player_by_name(&self, normalized_name: &str) -> Option<Player> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .players_by_name
            .get(normalized_name)
            .map(|id| inner.players[id].clone())
    }

    /// Overwrite a player's ranking attributes from a fresher entry, creating
    /// the player first when needed.
    pub fn update_player_ranking(
        &self,
        normalized_name: &str,
        country: Option<&str>,
        rank: Option<u32>,
        points: Option<u32>,
    ) -> Player {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let id = match inner.players_by_name.get(normalized_name) {
            Some(&id) => id,
            None => {
                inner.next_player_id += 1;
                let id = inner.next_player_id;
                inner
                    .players_by_name
                    .insert(normalized_name.to_string(), id);
                inner.players.insert(
                    id,
                    Player {
                        id,
                        name: normalized_name.to_string(),
                        country: "Unknown".to_string(),
                        rank: None,
                        points: None,
                        favorite: false,
                    },
                );
                id
            }
        };
        let player = inner.players.get_mut(&id).expect("player just ensured");
        if let Some(country) = country {
            if !country.trim().is_empty() {
                player.country = country.to_string();
            }
        }
        player.rank = rank;
        player.points = points;
        player.clone()
    }

    pub fn set_favorite(&self, id: PlayerId, favorite: bool) -> Result<Player, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let player = inner
            .players
            .get_mut(&id)
            .ok_or(StoreError::PlayerNotFound(id))?;
        player.favorite = favorite;
        Ok(player.clone())
    }

    /// All players, ranked first (by rank ascending), unranked after.
    pub fn players_by_rank(&self) -> Vec<Player> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut players: Vec<Player> = inner.players.values().cloned().collect();
        players.sort_by_key(|p| (p.rank.is_none(), p.rank, p.id));
        players
    }

    // --- matches ---

    pub fn find_match_by_external(&self, source: Source, external_id: &str) -> Option<Match> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .matches_by_external
            .get(&(source, external_id.to_string()))
            .map(|id| inner.matches[id].clone())
    }

    /// Unordered pair + exact date lookup, the identity key for records that
    /// carry no stable external id.
    pub fn find_match_by_pair_and_date(
        &self,
        a: PlayerId,
        b: PlayerId,
        date: NaiveDate,
    ) -> Option<Match> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .matches
            .values()
            .find(|m| m.is_between(a, b) && m.date == date)
            .cloned()
    }

    /// Insert or update a match, enforcing the winner invariant and the
    /// (source, external_id) uniqueness constraint. A draft without an id that
    /// collides on the external key updates the existing row — the other
    /// writer won the race and we adopt its record.
    pub fn upsert_match(&self, draft: MatchDraft) -> Result<Match, StoreError> {
        if let Some(winner) = draft.winner_id {
            if winner != draft.player1_id && winner != draft.player2_id {
                return Err(StoreError::Validation(format!(
                    "winner {} is neither player {} nor player {}",
                    winner, draft.player1_id, draft.player2_id
                )));
            }
        }
        if draft.tournament.trim().is_empty() {
            return Err(StoreError::Validation("tournament must be present".into()));
        }
        if draft.surface.trim().is_empty() {
            return Err(StoreError::Validation("surface must be present".into()));
        }

        let mut inner = self.inner.write().expect("store lock poisoned");

        let external_key = match (draft.source, &draft.external_id) {
            (Some(source), Some(external_id)) => Some((source, external_id.clone())),
            _ => None,
        };

        let mut id = draft.id;
        if id.is_none() {
            if let Some(key) = &external_key {
                id = inner.matches_by_external.get(key).copied();
            }
        }
        let id = match id {
            Some(id) => id,
            None => {
                inner.next_match_id += 1;
                inner.next_match_id
            }
        };

        // Two distinct rows may not share an external key.
        if let Some(key) = &external_key {
            if let Some(&owner) = inner.matches_by_external.get(key) {
                if owner != id {
                    return Err(StoreError::Validation(format!(
                        "external id {}/{} already belongs to match {}",
                        key.0, key.1, owner
                    )));
                }
            }
        }

        let row = Match {
            id,
            player1_id: draft.player1_id,
            player2_id: draft.player2_id,
            winner_id: draft.winner_id,
            tournament: draft.tournament,
            date: draft.date,
            surface: draft.surface,
            score: draft.score,
            status: draft.status,
            source: draft.source,
            external_id: draft.external_id,
        };
        if let Some(key) = external_key {
            inner.matches_by_external.insert(key, id);
        }
        inner.matches.insert(id, row.clone());
        Ok(row)
    }

    /// All matches between the pair, either ordering, newest first.
    pub fn matches_between(&self, a: PlayerId, b: PlayerId) -> Vec<Match> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut rows: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect();
        rows.sort_by(|x, y| y.date.cmp(&x.date));
        rows
    }

    /// A player's most recent matches across all opponents, newest first.
    pub fn recent_matches_for_player(&self, player: PlayerId, limit: usize) -> Vec<Match> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut rows: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.involves(player))
            .cloned()
            .collect();
        rows.sort_by(|x, y| y.date.cmp(&x.date));
        rows.truncate(limit);
        rows
    }

    /// Future-dated matches between the pair, soonest first.
    pub fn upcoming_matches_between(
        &self,
        a: PlayerId,
        b: PlayerId,
        from: NaiveDate,
        limit: usize,
    ) -> Vec<Match> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut rows: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.is_between(a, b) && m.date >= from)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.date);
        rows.truncate(limit);
        rows
    }

    pub fn match_count(&self) -> usize {
        self.inner.read().expect("store lock poisoned").matches.len()
    }

    // --- predictions ---

    /// Append a prediction, enforcing the winner and confidence invariants.
    pub fn insert_prediction(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
        predicted_winner_id: PlayerId,
        confidence: f64,
        prediction_date: DateTime<Utc>,
    ) -> Result<Prediction, StoreError> {
        if predicted_winner_id != player1_id && predicted_winner_id != player2_id {
            return Err(StoreError::Validation(format!(
                "predicted winner {} is neither player {} nor player {}",
                predicted_winner_id, player1_id, player2_id
            )));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(StoreError::Validation(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }

        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.next_prediction_id += 1;
        let prediction = Prediction {
            id: inner.next_prediction_id,
            player1_id,
            player2_id,
            predicted_winner_id,
            confidence,
            prediction_date,
        };
        inner.predictions.push(prediction.clone());
        Ok(prediction)
    }

    /// Most recent predictions, newest first.
    pub fn recent_predictions(&self, limit: usize) -> Vec<Prediction> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut rows = inner.predictions.clone();
        rows.sort_by(|x, y| y.prediction_date.cmp(&x.prediction_date));
        rows.truncate(limit);
        rows
    }

    // --- snapshot ---

    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read().expect("store lock poisoned");
        StoreSnapshot {
            players: inner.players.values().cloned().collect(),
            matches: inner.matches.values().cloned().collect(),
            predictions: inner.predictions.clone(),
        }
    }

    /// Replace the store contents with a snapshot, rebuilding the indexes.
    pub fn restore(&self, snapshot: StoreSnapshot) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let mut fresh = Inner::default();
        for player in snapshot.players {
            fresh.next_player_id = fresh.next_player_id.max(player.id);
            fresh.players_by_name.insert(player.name.clone(), player.id);
            fresh.players.insert(player.id, player);
        }
        for row in snapshot.matches {
            fresh.next_match_id = fresh.next_match_id.max(row.id);
            if let (Some(source), Some(external_id)) = (row.source, &row.external_id) {
                fresh
                    .matches_by_external
                    .insert((source, external_id.clone()), row.id);
            }
            fresh.matches.insert(row.id, row);
        }
        for prediction in snapshot.predictions {
            fresh.next_prediction_id = fresh.next_prediction_id.max(prediction.id);
            fresh.predictions.push(prediction);
        }
        *inner = fresh;
    }
}
