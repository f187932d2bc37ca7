use crate::store::{MatchStore, StoreSnapshot};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Save the whole store to a JSON snapshot file.
pub fn save_snapshot(store: &MatchStore, path: &Path) -> Result<()> {
    let snapshot = store.snapshot();
    let json =
        serde_json::to_string_pretty(&snapshot).context("Failed to serialize store snapshot")?;
    std::fs::write(path, json).context("Failed to write snapshot file")?;
    Ok(())
}

/// Load a JSON snapshot file into the store, replacing its contents.
pub fn load_snapshot(store: &MatchStore, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path).context("Failed to read snapshot file")?;
    let snapshot: StoreSnapshot =
        serde_json::from_str(&json).context("Failed to deserialize store snapshot")?;
    store.restore(snapshot);
    Ok(())
}

/// Export the player table to CSV, ranked players first.
pub fn export_players_csv(store: &MatchStore, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("Failed to create players CSV")?;
    writer.write_record(["Rank", "Name", "Country", "Points", "Favorite"])?;
    for player in store.players_by_rank() {
        writer.write_record([
            player.rank.map(|r| r.to_string()).unwrap_or_default(),
            player.name.clone(),
            player.country.clone(),
            player.points.map(|p| p.to_string()).unwrap_or_default(),
            player.favorite.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Export the match table to CSV with player names resolved.
pub fn export_matches_csv(store: &MatchStore, path: &Path) -> Result<()> {
    let snapshot = store.snapshot();
    let names: HashMap<u64, &str> = snapshot
        .players
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect();
    let name_of = |id: u64| names.get(&id).copied().unwrap_or("?").to_string();

    let mut writer = csv::Writer::from_path(path).context("Failed to create matches CSV")?;
    writer.write_record([
        "Date",
        "Player 1",
        "Player 2",
        "Winner",
        "Tournament",
        "Surface",
        "Score",
        "Status",
        "Source",
        "External Id",
    ])?;
    for m in &snapshot.matches {
        writer.write_record([
            m.date.to_string(),
            name_of(m.player1_id),
            name_of(m.player2_id),
            m.winner_id.map(&name_of).unwrap_or_default(),
            m.tournament.clone(),
            m.surface.clone(),
            m.score.clone().unwrap_or_default(),
            format!("{:?}", m.status).to_lowercase(),
            m.source.map(|s| s.to_string()).unwrap_or_default(),
            m.external_id.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;
    use crate::store::MatchDraft;
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tennis_predictor_test_{}_{}", std::process::id(), name))
    }

    fn seeded_store() -> MatchStore {
        let store = MatchStore::new();
        let a = store.find_or_create_player("Jannik Sinner");
        let b = store.find_or_create_player("Carlos Alcaraz");
        store.update_player_ranking("Jannik Sinner", Some("Italy"), Some(1), Some(11830));
        store
            .upsert_match(MatchDraft {
                id: None,
                player1_id: a.id,
                player2_id: b.id,
                winner_id: Some(a.id),
                tournament: "US Open".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 9, 7).unwrap(),
                surface: "Hard".to_string(),
                score: Some("6-4, 6-2".to_string()),
                status: MatchStatus::Finished,
                source: None,
                external_id: None,
            })
            .unwrap();
        store
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let store = seeded_store();
        let path = temp_path("snapshot.json");
        save_snapshot(&store, &path).unwrap();

        let restored = MatchStore::new();
        load_snapshot(&restored, &path).unwrap();
        assert_eq!(restored.match_count(), 1);
        assert!(restored.find_player_by_name("Jannik Sinner").is_some());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn csv_exports_resolve_names() {
        let store = seeded_store();
        let players_path = temp_path("players.csv");
        let matches_path = temp_path("matches.csv");
        export_players_csv(&store, &players_path).unwrap();
        export_matches_csv(&store, &matches_path).unwrap();

        let players = std::fs::read_to_string(&players_path).unwrap();
        assert!(players.contains("Jannik Sinner"));
        assert!(players.contains("Italy"));

        let matches = std::fs::read_to_string(&matches_path).unwrap();
        assert!(matches.contains("US Open"));
        assert!(matches.contains("Carlos Alcaraz"));
        std::fs::remove_file(&players_path).ok();
        std::fs::remove_file(&matches_path).ok();
    }
}
