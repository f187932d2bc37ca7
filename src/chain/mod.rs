use crate::api::espn_scoreboard::EspnScoreboardApi;
use crate::models::{FixtureKind, RankingEntry, RawFixture, Source};
use crate::scrapers::espn::EspnScraper;
use crate::scrapers::scores365::Scores365Scraper;
use crate::scrapers::tennisprediction::TennisPredictionScraper;
use crate::utils::sample::{sample_fixtures, sample_pair_fixtures, sample_rankings};
use crate::Config;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// A known player pair some strategies can target directly.
#[derive(Debug, Clone)]
pub struct PairHint {
    pub player1: String,
    pub player2: String,
}

/// One ranking-fetch strategy. Never errors; an empty list means "no data"
/// and sends the chain to the next strategy.
#[async_trait]
pub trait RankingSource: Send + Sync {
    fn source(&self) -> Source;
    async fn fetch(&self, limit: usize) -> Vec<RankingEntry>;
}

/// One fixture-fetch strategy, same contract.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    fn source(&self) -> Source;
    async fn fetch(&self, kind: FixtureKind, limit: usize, hint: Option<&PairHint>)
        -> Vec<RawFixture>;
}

// --- adapters over the concrete extractors ---

struct EspnRankingSource(Arc<EspnScraper>);

#[async_trait]
impl RankingSource for EspnRankingSource {
    fn source(&self) -> Source {
        Source::Espn
    }

    async fn fetch(&self, limit: usize) -> Vec<RankingEntry> {
        self.0.fetch_rankings(limit).await
    }
}

struct ScoreboardApiSource(EspnScoreboardApi);

#[async_trait]
impl FixtureSource for ScoreboardApiSource {
    fn source(&self) -> Source {
        Source::Api
    }

    async fn fetch(
        &self,
        _kind: FixtureKind,
        limit: usize,
        _hint: Option<&PairHint>,
    ) -> Vec<RawFixture> {
        self.0.fetch_matches(limit).await
    }
}

struct EspnCalendarSource(Arc<EspnScraper>);

#[async_trait]
impl FixtureSource for EspnCalendarSource {
    fn source(&self) -> Source {
        Source::Espn
    }

    async fn fetch(
        &self,
        _kind: FixtureKind,
        limit: usize,
        _hint: Option<&PairHint>,
    ) -> Vec<RawFixture> {
        self.0.fetch_calendar_matches(limit).await
    }
}

/// Calendar scan focused on one pair; inert unless a hint is supplied.
struct EspnPairScanSource(Arc<EspnScraper>);

#[async_trait]
impl FixtureSource for EspnPairScanSource {
    fn source(&self) -> Source {
        Source::Espn
    }

    async fn fetch(
        &self,
        _kind: FixtureKind,
        limit: usize,
        hint: Option<&PairHint>,
    ) -> Vec<RawFixture> {
        match hint {
            Some(pair) => {
                self.0
                    .fetch_pair_matches(&pair.player1, &pair.player2, limit)
                    .await
            }
            None => Vec::new(),
        }
    }
}

struct Scores365Source(Scores365Scraper);

#[async_trait]
impl FixtureSource for Scores365Source {
    fn source(&self) -> Source {
        Source::Scores365
    }

    async fn fetch(
        &self,
        _kind: FixtureKind,
        limit: usize,
        _hint: Option<&PairHint>,
    ) -> Vec<RawFixture> {
        self.0.fetch_matches(limit).await
    }
}

struct TennisPredictionSource(TennisPredictionScraper);

#[async_trait]
impl FixtureSource for TennisPredictionSource {
    fn source(&self) -> Source {
        Source::TennisPrediction
    }

    async fn fetch(
        &self,
        _kind: FixtureKind,
        limit: usize,
        _hint: Option<&PairHint>,
    ) -> Vec<RawFixture> {
        self.0.fetch_matches(limit).await
    }
}

/// Ordered fallback sequence per data kind. Strategies express a priority
/// preference, so they run one at a time with an early exit on the first
/// non-empty result rather than concurrently — racing them would spend remote
/// request budget on sources about to be discarded.
///
/// When every strategy comes back empty, or `force_sample` is set, the
/// deterministic synthetic generator supplies data tagged `Source::Sample`.
pub struct SourceChain {
    ranking_sources: Vec<Box<dyn RankingSource>>,
    recent_sources: Vec<Box<dyn FixtureSource>>,
    upcoming_sources: Vec<Box<dyn FixtureSource>>,
    force_sample: bool,
}

impl SourceChain {
    /// Production wiring: the scoreboard API leads for recent results (most
    /// reliable when reachable); the lightweight fixture sites lead for
    /// upcoming fixtures because they surface listings more directly.
    pub fn from_config(config: &Config) -> Self {
        let espn = Arc::new(EspnScraper::new(&config.user_agent));
        Self {
            ranking_sources: vec![Box::new(EspnRankingSource(espn.clone()))],
            recent_sources: vec![
                Box::new(ScoreboardApiSource(EspnScoreboardApi::new(
                    &config.user_agent,
                ))),
                Box::new(EspnCalendarSource(espn.clone())),
                Box::new(Scores365Source(Scores365Scraper::new(&config.user_agent))),
                Box::new(TennisPredictionSource(TennisPredictionScraper::new(
                    &config.user_agent,
                ))),
            ],
            upcoming_sources: vec![
                Box::new(Scores365Source(Scores365Scraper::new(&config.user_agent))),
                Box::new(TennisPredictionSource(TennisPredictionScraper::new(
                    &config.user_agent,
                ))),
                Box::new(EspnPairScanSource(espn.clone())),
                Box::new(EspnCalendarSource(espn)),
            ],
            force_sample: config.force_sample,
        }
    }

    /// Assemble a chain from explicit strategies; the unit-test seam.
    pub fn with_sources(
        ranking_sources: Vec<Box<dyn RankingSource>>,
        recent_sources: Vec<Box<dyn FixtureSource>>,
        upcoming_sources: Vec<Box<dyn FixtureSource>>,
        force_sample: bool,
    ) -> Self {
        Self {
            ranking_sources,
            recent_sources,
            upcoming_sources,
            force_sample,
        }
    }

    pub async fn fetch_rankings(&self, limit: usize) -> (Vec<RankingEntry>, Source) {
        if self.force_sample {
            info!("force-sample active: skipping remote ranking sources");
            let mut entries = sample_rankings();
            entries.truncate(limit);
            return (entries, Source::Sample);
        }

        for strategy in &self.ranking_sources {
            let entries = strategy.fetch(limit).await;
            if !entries.is_empty() {
                info!(source = %strategy.source(), count = entries.len(), "rankings fetched");
                return (entries, strategy.source());
            }
            debug!(source = %strategy.source(), "ranking source returned nothing");
        }

        info!("all ranking sources empty; using sample rankings");
        let mut entries = sample_rankings();
        entries.truncate(limit);
        (entries, Source::Sample)
    }

    pub async fn fetch_fixtures(
        &self,
        kind: FixtureKind,
        limit: usize,
        hint: Option<&PairHint>,
    ) -> (Vec<RawFixture>, Source) {
        if !self.force_sample {
            let sources = match kind {
                FixtureKind::Recent => &self.recent_sources,
                FixtureKind::Upcoming => &self.upcoming_sources,
            };
            for strategy in sources {
                let fixtures = strategy.fetch(kind, limit, hint).await;
                if !fixtures.is_empty() {
                    info!(source = %strategy.source(), count = fixtures.len(), "fixtures fetched");
                    return (fixtures, strategy.source());
                }
                debug!(source = %strategy.source(), "fixture source returned nothing");
            }
            info!("all fixture sources empty; generating sample fixtures");
        } else {
            info!("force-sample active: generating sample fixtures");
        }

        let today = Utc::now().date_naive();
        let fixtures = match (kind, hint) {
            (FixtureKind::Upcoming, Some(pair)) => {
                sample_pair_fixtures(&pair.player1, &pair.player2, limit, today)
            }
            _ => sample_fixtures(kind, limit, today),
        };
        (fixtures, Source::Sample)
    }
}
