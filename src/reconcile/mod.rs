use crate::models::{MatchStatus, Player, RankingEntry, RawFixture, Source};
use crate::store::{MatchDraft, MatchStore};
use crate::utils::normalize::normalize_player_name;
use crate::utils::surface::{guess_surface_for_tournament, surface_is_blank, UNKNOWN_SURFACE};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Resolve a free-text name to a persisted player, creating a placeholder row
/// on first sight. Empty or whitespace input resolves to no player.
pub fn resolve_player(store: &MatchStore, raw_name: &str) -> Option<Player> {
    let normalized = normalize_player_name(raw_name);
    if normalized.is_empty() {
        return None;
    }
    Some(store.find_or_create_player(&normalized))
}

/// Counts from a reconciliation pass. `skipped` covers records that failed
/// resolution or store validation; the batch always runs to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ReconcileSummary {
    pub fn persisted(&self) -> usize {
        self.created + self.updated
    }
}

/// Upserts raw extractor output into the persisted store, resolving identity
/// conflicts and filling missing fields by policy.
pub struct MatchReconciler<'a> {
    store: &'a MatchStore,
}

impl<'a> MatchReconciler<'a> {
    pub fn new(store: &'a MatchStore) -> Self {
        Self { store }
    }

    /// Create or refresh players from ranking entries. Returns how many
    /// entries were applied.
    pub fn reconcile_rankings(&self, entries: &[RankingEntry]) -> usize {
        let mut applied = 0;
        for entry in entries {
            let normalized = normalize_player_name(&entry.name);
            if normalized.is_empty() {
                debug!("skipping ranking entry with empty name");
                continue;
            }
            self.store.update_player_ranking(
                &normalized,
                entry.country.as_deref(),
                entry.rank,
                entry.points,
            );
            applied += 1;
        }
        applied
    }

    /// Upsert a batch of raw fixtures. Identity resolution order:
    /// (source, external_id) when both are present, else the unordered player
    /// pair plus exact date. A single bad record is logged and skipped.
    pub fn reconcile_fixtures(&self, records: &[RawFixture], today: NaiveDate) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for record in records {
            match self.reconcile_one(record, today) {
                Ok(true) => summary.created += 1,
                Ok(false) => summary.updated += 1,
                Err(reason) => {
                    warn!(%reason, player1 = %record.player1_name, player2 = %record.player2_name,
                        "skipping fixture record");
                    summary.skipped += 1;
                }
            }
        }

        summary
    }

    /// Returns Ok(true) when a new row was created, Ok(false) on update.
    fn reconcile_one(&self, record: &RawFixture, today: NaiveDate) -> Result<bool, String> {
        let player1 = resolve_player(self.store, &record.player1_name)
            .ok_or_else(|| "player1 name is empty".to_string())?;
        let player2 = resolve_player(self.store, &record.player2_name)
            .ok_or_else(|| "player2 name is empty".to_string())?;

        let date = record.date.unwrap_or(today);

        let existing = record
            .source
            .zip(record.external_id.as_deref())
            .and_then(|(source, external_id)| {
                self.store.find_match_by_external(source, external_id)
            })
            .or_else(|| {
                self.store
                    .find_match_by_pair_and_date(player1.id, player2.id, date)
            });
        let creating = existing.is_none();

        // Winner is applied only when it resolves to one of the two players;
        // anything else leaves the field untouched rather than erroring.
        let winner_id = record
            .winner_name
            .as_deref()
            .and_then(|name| resolve_player(self.store, name))
            .map(|winner| winner.id)
            .filter(|id| *id == player1.id || *id == player2.id)
            .or(existing.as_ref().and_then(|m| m.winner_id));

        let tournament = match record.tournament.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => existing
                .as_ref()
                .map(|m| m.tournament.clone())
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| default_tournament(record.source).to_string()),
        };

        // Record surface wins; otherwise keep the stored one; a still-blank
        // surface is guessed from the tournament name (deterministic).
        let mut surface = record
            .surface
            .clone()
            .filter(|s| !surface_is_blank(s))
            .or_else(|| {
                existing
                    .as_ref()
                    .map(|m| m.surface.clone())
                    .filter(|s| !surface_is_blank(s))
            })
            .unwrap_or_else(|| UNKNOWN_SURFACE.to_string());
        if surface_is_blank(&surface) {
            surface = guess_surface_for_tournament(&tournament).to_string();
        }

        let draft = MatchDraft {
            id: existing.as_ref().map(|m| m.id),
            player1_id: existing.as_ref().map_or(player1.id, |m| m.player1_id),
            player2_id: existing.as_ref().map_or(player2.id, |m| m.player2_id),
            winner_id,
            tournament,
            // Freshest wins: a date carried by the record always overwrites.
            date: record
                .date
                .or(existing.as_ref().map(|m| m.date))
                .unwrap_or(today),
            surface,
            score: record
                .score
                .clone()
                .or(existing.as_ref().and_then(|m| m.score.clone())),
            status: record
                .status
                .or(existing.as_ref().map(|m| m.status))
                .unwrap_or(MatchStatus::Upcoming),
            source: record.source.or(existing.as_ref().and_then(|m| m.source)),
            external_id: record
                .external_id
                .clone()
                .or(existing.as_ref().and_then(|m| m.external_id.clone())),
        };

        self.store
            .upsert_match(draft)
            .map_err(|e| e.to_string())?;
        Ok(creating)
    }
}

fn default_tournament(source: Option<Source>) -> &'static str {
    match source {
        Some(Source::Espn) => "ESPN Tournament",
        Some(Source::Scores365) => "365Scores Event",
        Some(Source::TennisPrediction) => "TennisPrediction Event",
        _ => "Tournament",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sample::sample_pair_fixtures;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    fn fixture(p1: &str, p2: &str) -> RawFixture {
        RawFixture {
            player1_name: p1.to_string(),
            player2_name: p2.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_normalized_names_to_one_player() {
        let store = MatchStore::new();
        let a = resolve_player(&store, " Novak  Đoković ").unwrap();
        let b = resolve_player(&store, "Novak Dokovic").unwrap();
        assert_eq!(a.id, b.id);
        assert!(resolve_player(&store, "   ").is_none());
    }

    #[test]
    fn same_external_id_twice_yields_one_updated_match() {
        let store = MatchStore::new();
        let reconciler = MatchReconciler::new(&store);

        let mut record = fixture("Jannik Sinner", "Carlos Alcaraz");
        record.source = Some(Source::Api);
        record.external_id = Some("401598765".to_string());
        record.tournament = Some("Cincinnati Masters".to_string());
        record.date = NaiveDate::from_ymd_opt(2025, 8, 10);

        let first = reconciler.reconcile_fixtures(&[record.clone()], today());
        assert_eq!(first, ReconcileSummary { created: 1, updated: 0, skipped: 0 });

        record.date = NaiveDate::from_ymd_opt(2025, 8, 11);
        record.score = Some("7-6, 6-4".to_string());
        record.status = Some(MatchStatus::Finished);
        record.winner_name = Some("Jannik Sinner".to_string());
        let second = reconciler.reconcile_fixtures(&[record], today());
        assert_eq!(second, ReconcileSummary { created: 0, updated: 1, skipped: 0 });

        assert_eq!(store.match_count(), 1);
        let row = store
            .find_match_by_external(Source::Api, "401598765")
            .unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
        assert_eq!(row.score.as_deref(), Some("7-6, 6-4"));
        assert_eq!(row.status, MatchStatus::Finished);
        assert!(row.winner_id.is_some());
    }

    #[test]
    fn pair_and_date_dedupes_records_without_external_id() {
        let store = MatchStore::new();
        let reconciler = MatchReconciler::new(&store);
        let d = NaiveDate::from_ymd_opt(2025, 8, 10);

        let mut first = fixture("Casper Ruud", "Holger Rune");
        first.date = d;
        // Second record swaps the pair order; still the same fixture.
        let mut second = fixture("Holger Rune", "Casper Ruud");
        second.date = d;
        second.tournament = Some("Nordic Open".to_string());

        reconciler.reconcile_fixtures(&[first, second], today());
        assert_eq!(store.match_count(), 1);
        let p1 = store.find_player_by_name("Casper Ruud").unwrap();
        let p2 = store.find_player_by_name("Holger Rune").unwrap();
        let row = store
            .find_match_by_pair_and_date(p1.id, p2.id, d.unwrap())
            .unwrap();
        assert_eq!(row.tournament, "Nordic Open");
    }

    #[test]
    fn foreign_winner_is_dropped_not_fatal() {
        let store = MatchStore::new();
        let reconciler = MatchReconciler::new(&store);

        let mut record = fixture("Taylor Fritz", "Tommy Paul");
        record.winner_name = Some("Somebody Else".to_string());
        record.date = NaiveDate::from_ymd_opt(2025, 7, 20);
        let summary = reconciler.reconcile_fixtures(&[record], today());
        assert_eq!(summary.persisted(), 1);

        let p1 = store.find_player_by_name("Taylor Fritz").unwrap();
        let p2 = store.find_player_by_name("Tommy Paul").unwrap();
        let row = store
            .find_match_by_pair_and_date(p1.id, p2.id, NaiveDate::from_ymd_opt(2025, 7, 20).unwrap())
            .unwrap();
        assert_eq!(row.winner_id, None);
    }

    #[test]
    fn empty_names_are_skipped_without_aborting_the_batch() {
        let store = MatchStore::new();
        let reconciler = MatchReconciler::new(&store);

        let bad = fixture("", "Ben Shelton");
        let good = fixture("Ben Shelton", "Frances Tiafoe");
        let summary = reconciler.reconcile_fixtures(&[bad, good], today());
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.persisted(), 1);
        assert_eq!(store.match_count(), 1);
    }

    #[test]
    fn source_specific_tournament_defaults() {
        let store = MatchStore::new();
        let reconciler = MatchReconciler::new(&store);

        let mut espn = fixture("A One", "B Two");
        espn.source = Some(Source::Espn);
        espn.date = NaiveDate::from_ymd_opt(2025, 8, 2);
        let mut scores = fixture("C Three", "D Four");
        scores.source = Some(Source::Scores365);
        scores.date = NaiveDate::from_ymd_opt(2025, 8, 3);

        reconciler.reconcile_fixtures(&[espn, scores], today());

        let a = store.find_player_by_name("A One").unwrap();
        let b = store.find_player_by_name("B Two").unwrap();
        let row = store
            .find_match_by_pair_and_date(a.id, b.id, NaiveDate::from_ymd_opt(2025, 8, 2).unwrap())
            .unwrap();
        assert_eq!(row.tournament, "ESPN Tournament");

        let c = store.find_player_by_name("C Three").unwrap();
        let d = store.find_player_by_name("D Four").unwrap();
        let row = store
            .find_match_by_pair_and_date(c.id, d.id, NaiveDate::from_ymd_opt(2025, 8, 3).unwrap())
            .unwrap();
        assert_eq!(row.tournament, "365Scores Event");
    }

    #[test]
    fn blank_surface_is_guessed_deterministically() {
        let store = MatchStore::new();
        let reconciler = MatchReconciler::new(&store);

        let mut record = fixture("E Five", "F Six");
        record.tournament = Some("Wimbledon".to_string());
        record.date = NaiveDate::from_ymd_opt(2025, 7, 1);
        reconciler.reconcile_fixtures(&[record], today());

        let e = store.find_player_by_name("E Five").unwrap();
        let f = store.find_player_by_name("F Six").unwrap();
        let row = store
            .find_match_by_pair_and_date(e.id, f.id, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
            .unwrap();
        assert_eq!(row.surface, "Grass");
    }

    #[test]
    fn sample_pair_fixtures_reconcile_cleanly() {
        let store = MatchStore::new();
        let reconciler = MatchReconciler::new(&store);
        let fixtures = sample_pair_fixtures("Alpha One", "Beta Two", 10, today());
        let summary = reconciler.reconcile_fixtures(&fixtures, today());
        assert_eq!(summary.created, 10);
        assert_eq!(store.match_count(), 10);
        // Re-running the same batch updates in place instead of duplicating.
        let fixtures = sample_pair_fixtures("Alpha One", "Beta Two", 10, today());
        let again = reconciler.reconcile_fixtures(&fixtures, today());
        assert_eq!(again.created, 0);
        assert_eq!(again.updated, 10);
        assert_eq!(store.match_count(), 10);
    }
}
