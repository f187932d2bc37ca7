pub mod api;
pub mod chain;
pub mod models;
pub mod predictor;
pub mod reconcile;
pub mod scrapers;
pub mod store;
pub mod utils;

pub use chain::{FixtureSource, PairHint, RankingSource, SourceChain};
pub use models::{
    FetchOutcome, FixtureKind, Match, MatchStatus, Player, PlayerId, Prediction, RankingEntry,
    RawFixture, Source,
};
pub use predictor::{PredictionEngine, PredictionOutcome, ProbabilityBreakdown};
pub use reconcile::{resolve_player, MatchReconciler, ReconcileSummary};
pub use store::{MatchStore, StoreError, StoreSnapshot};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// How many ranking rows a refresh asks the chain for.
const RANKING_FETCH_LIMIT: usize = 50;

/// Batch size for the deferred background fetch of recent matches.
const BACKGROUND_FETCH_LIMIT: usize = 100;

/// How many stored rows a recent-matches lookup returns.
const RECENT_MATCH_LIMIT: usize = 50;

/// Runtime configuration, read from the environment (`.env` supported via the
/// binaries). `FORCE_SAMPLE=true` skips all remote sources — useful in
/// development and CI.
#[derive(Debug, Clone)]
pub struct Config {
    pub force_sample: bool,
    pub user_agent: String,
    pub bind_addr: String,
    pub snapshot_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            force_sample: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            snapshot_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let truthy = |key: &str| {
            std::env::var(key)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };
        Self {
            force_sample: truthy("FORCE_SAMPLE"),
            user_agent: std::env::var("SCRAPER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            snapshot_file: std::env::var("SNAPSHOT_FILE").ok(),
        }
    }
}

/// A stored match with player names resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub id: u64,
    pub player1: String,
    pub player2: String,
    pub date: NaiveDate,
    pub tournament: String,
    pub surface: String,
    pub score: Option<String>,
    pub winner: Option<String>,
    pub status: MatchStatus,
    pub source: Option<Source>,
    pub external_id: Option<String>,
}

/// Recent matches for a pair: either stored rows, or a marker that a deferred
/// fetch has been scheduled and the caller should retry later.
#[derive(Debug, Clone)]
pub enum RecentMatches {
    Stored(Vec<MatchView>),
    Queued,
}

/// One upcoming fixture plus the pair's win probabilities for display.
#[derive(Debug, Clone, Serialize)]
pub struct FixturePreview {
    pub tournament: String,
    pub date: Option<NaiveDate>,
    pub surface: String,
    pub player1: String,
    pub player2: String,
    pub predicted_winner: String,
    pub confidence: f64,
    pub player1_probability: f64,
    pub player2_probability: f64,
}

/// Result of an upcoming-fixtures lookup. `source` is `None` when the rows
/// came from the local store rather than a remote fetch.
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingFixtures {
    pub fixtures: Vec<FixturePreview>,
    pub source: Option<Source>,
}

/// A persisted-or-not prediction with names resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub player1: String,
    pub player2: String,
    pub player1_probability: f64,
    pub player2_probability: f64,
    pub predicted_winner: String,
    pub confidence: f64,
    /// `None` means computed but not recorded (store validation refused the
    /// row) — callers must not treat this as fatal.
    pub prediction: Option<Prediction>,
}

/// Preview: probabilities only, nothing persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub player1: String,
    pub player2: String,
    pub player1_probability: f64,
    pub player2_probability: f64,
    pub predicted_winner: String,
    pub confidence: f64,
}

/// Facade over the acquisition pipeline, the store, and the prediction
/// engine; the surface the binaries (and tests) talk to.
#[derive(Clone)]
pub struct TennisService {
    store: Arc<MatchStore>,
    chain: Arc<SourceChain>,
    engine: PredictionEngine,
}

impl TennisService {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            Arc::new(MatchStore::new()),
            Arc::new(SourceChain::from_config(config)),
        )
    }

    /// Assemble from explicit parts; the test seam for stub chains.
    pub fn with_parts(store: Arc<MatchStore>, chain: Arc<SourceChain>) -> Self {
        Self {
            store,
            chain,
            engine: PredictionEngine::new(),
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    /// Run the ranking source chain and reconcile the result into the player
    /// table.
    pub async fn fetch_and_persist_rankings(&self) -> FetchOutcome {
        let (entries, source) = self.chain.fetch_rankings(RANKING_FETCH_LIMIT).await;
        let reconciler = MatchReconciler::new(&self.store);
        let count = reconciler.reconcile_rankings(&entries);
        info!(count, %source, "rankings reconciled");
        FetchOutcome { count, source }
    }

    /// Run the fixture source chain for `kind` and reconcile the records into
    /// the match table.
    pub async fn fetch_and_persist_fixtures(&self, kind: FixtureKind, limit: usize) -> FetchOutcome {
        let (records, source) = self.chain.fetch_fixtures(kind, limit, None).await;
        let reconciler = MatchReconciler::new(&self.store);
        let summary = reconciler.reconcile_fixtures(&records, Utc::now().date_naive());
        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            %source,
            "fixtures reconciled"
        );
        FetchOutcome {
            count: summary.persisted(),
            source,
        }
    }

    /// Upcoming fixtures between two players with win probabilities attached.
    /// Persisted future matches win over a remote fetch; the remote fetch
    /// falls through to deterministic synthetic fixtures when every source is
    /// dry, so this always returns something usable.
    pub async fn upcoming_fixtures(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
        limit: usize,
    ) -> Result<UpcomingFixtures, StoreError> {
        let player1 = self.store.get_player(player1_id)?;
        let player2 = self.store.get_player(player2_id)?;
        let breakdown = self.engine.preview(&self.store, &player1, &player2);
        let winner_name = if breakdown.predicted_winner_id == player1.id {
            player1.name.clone()
        } else {
            player2.name.clone()
        };

        let today = Utc::now().date_naive();
        let preview = |tournament: String, date: Option<NaiveDate>, surface: String| {
            FixturePreview {
                tournament,
                date,
                surface,
                player1: player1.name.clone(),
                player2: player2.name.clone(),
                predicted_winner: winner_name.clone(),
                confidence: breakdown.confidence,
                player1_probability: breakdown.player1_probability,
                player2_probability: breakdown.player2_probability,
            }
        };

        let persisted = self
            .store
            .upcoming_matches_between(player1.id, player2.id, today, limit);
        if !persisted.is_empty() {
            let fixtures = persisted
                .into_iter()
                .map(|m| preview(m.tournament, Some(m.date), m.surface))
                .collect();
            return Ok(UpcomingFixtures {
                fixtures,
                source: None,
            });
        }

        let hint = PairHint {
            player1: player1.name.clone(),
            player2: player2.name.clone(),
        };
        let (records, source) = self
            .chain
            .fetch_fixtures(FixtureKind::Upcoming, limit, Some(&hint))
            .await;
        let fixtures = records
            .into_iter()
            .map(|r| {
                preview(
                    r.tournament.unwrap_or_else(|| "Tournament".to_string()),
                    r.date,
                    r.surface.unwrap_or_else(|| "Unknown".to_string()),
                )
            })
            .collect();
        Ok(UpcomingFixtures {
            fixtures,
            source: Some(source),
        })
    }

    /// Compute and persist a prediction for the pair.
    pub fn predict(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
    ) -> Result<PredictionReport, StoreError> {
        let player1 = self.store.get_player(player1_id)?;
        let player2 = self.store.get_player(player2_id)?;
        let outcome = self
            .engine
            .predict(&self.store, &player1, &player2, Utc::now());
        let predicted_winner = if outcome.predicted_winner_id == player1.id {
            player1.name.clone()
        } else {
            player2.name.clone()
        };
        Ok(PredictionReport {
            player1: player1.name,
            player2: player2.name,
            player1_probability: outcome.player1_probability,
            player2_probability: outcome.player2_probability,
            predicted_winner,
            confidence: outcome.confidence,
            prediction: outcome.prediction,
        })
    }

    /// Compute probabilities without persisting anything.
    pub fn preview(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
    ) -> Result<PreviewReport, StoreError> {
        let player1 = self.store.get_player(player1_id)?;
        let player2 = self.store.get_player(player2_id)?;
        let breakdown = self.engine.preview(&self.store, &player1, &player2);
        let predicted_winner = if breakdown.predicted_winner_id == player1.id {
            player1.name.clone()
        } else {
            player2.name.clone()
        };
        Ok(PreviewReport {
            player1: player1.name,
            player2: player2.name,
            player1_probability: breakdown.player1_probability,
            player2_probability: breakdown.player2_probability,
            predicted_winner,
            confidence: breakdown.confidence,
        })
    }

    /// Persist a prediction for each upcoming fixture between the pair.
    /// Returns how many predictions were recorded.
    pub async fn generate_predictions(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
        limit: usize,
    ) -> Result<usize, StoreError> {
        let player1 = self.store.get_player(player1_id)?;
        let player2 = self.store.get_player(player2_id)?;
        let upcoming = self
            .upcoming_fixtures(player1_id, player2_id, limit)
            .await?;
        let mut created = 0;
        for _fixture in &upcoming.fixtures {
            let outcome = self
                .engine
                .predict(&self.store, &player1, &player2, Utc::now());
            if outcome.prediction.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Stored matches between the pair, newest first. When none exist a
    /// background fetch is scheduled and `Queued` returns immediately —
    /// scrapers are slow and must not stall the caller; the deferred job's
    /// only effect is to populate the store for subsequent reads.
    pub async fn recent_matches_between(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
    ) -> Result<RecentMatches, StoreError> {
        let player1 = self.store.get_player(player1_id)?;
        let player2 = self.store.get_player(player2_id)?;

        let mut rows = self.store.matches_between(player1.id, player2.id);
        rows.truncate(RECENT_MATCH_LIMIT);
        if !rows.is_empty() {
            let views = rows.iter().map(|m| self.match_view(m)).collect();
            return Ok(RecentMatches::Stored(views));
        }

        let service = self.clone();
        tokio::spawn(async move {
            let outcome = service
                .fetch_and_persist_fixtures(FixtureKind::Recent, BACKGROUND_FETCH_LIMIT)
                .await;
            info!(count = outcome.count, source = %outcome.source,
                "background recent-match fetch completed");
        });
        info!(player1 = %player1.name, player2 = %player2.name,
            "no local matches; queued background fetch");
        Ok(RecentMatches::Queued)
    }

    pub fn players(&self) -> Vec<Player> {
        self.store.players_by_rank()
    }

    pub fn recent_predictions(&self, limit: usize) -> Vec<Prediction> {
        self.store.recent_predictions(limit)
    }

    fn match_view(&self, m: &Match) -> MatchView {
        let name_of = |id: PlayerId| {
            self.store
                .get_player(id)
                .map(|p| p.name)
                .unwrap_or_else(|e| {
                    error!(error = %e, "match references missing player");
                    "?".to_string()
                })
        };
        MatchView {
            id: m.id,
            player1: name_of(m.player1_id),
            player2: name_of(m.player2_id),
            date: m.date,
            tournament: m.tournament.clone(),
            surface: m.surface.clone(),
            score: m.score.clone(),
            winner: m.winner_id.map(name_of),
            status: m.status,
            source: m.source,
            external_id: m.external_id.clone(),
        }
    }
}
