use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tennis_predictor::utils::data::{
    export_matches_csv, export_players_csv, load_snapshot, save_snapshot,
};
use tennis_predictor::{
    Config, FixtureKind, MatchStore, Player, RecentMatches, SourceChain, TennisService,
};

#[derive(Parser)]
#[command(
    name = "tennis-predictor",
    about = "Tennis ranking/fixture ingestion and match outcome prediction"
)]
struct Cli {
    /// JSON snapshot file loaded before and saved after the command
    /// (defaults to SNAPSHOT_FILE from the environment).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch rankings and recent matches through the source chain and persist
    /// both.
    Scrape {
        /// Maximum number of match records to ingest
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Print the stored ranking table.
    Rankings,
    /// Upcoming fixtures between two players, with win probabilities.
    Fixtures {
        player1: String,
        player2: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Compute and persist a prediction for a pair.
    Predict { player1: String, player2: String },
    /// Compute probabilities for a pair without persisting anything.
    Preview { player1: String, player2: String },
    /// Mark or unmark a player as a favorite.
    Favorite {
        player: String,
        #[arg(long)]
        unset: bool,
    },
    /// Export players and matches as CSV files.
    Export {
        #[arg(long, default_value = "cache")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let snapshot_path = cli
        .snapshot
        .clone()
        .or_else(|| config.snapshot_file.clone().map(PathBuf::from));

    let store = Arc::new(MatchStore::new());
    if let Some(path) = &snapshot_path {
        if path.exists() {
            load_snapshot(&store, path).context("Failed to load snapshot")?;
            println!("Loaded snapshot from {}\n", path.display());
        }
    }
    let service = TennisService::with_parts(store, Arc::new(SourceChain::from_config(&config)));

    match cli.command {
        Command::Scrape { limit } => {
            println!("Fetching rankings...");
            let rankings = service.fetch_and_persist_rankings().await;
            println!(
                "  {} players updated (source: {})",
                rankings.count, rankings.source
            );

            println!("Fetching recent matches...");
            let matches = service
                .fetch_and_persist_fixtures(FixtureKind::Recent, limit)
                .await;
            println!(
                "  {} matches reconciled (source: {})",
                matches.count, matches.source
            );
        }
        Command::Rankings => {
            let players = service.players();
            if players.is_empty() {
                println!("No players stored yet. Run `scrape` first.");
            }
            for player in players {
                println!(
                    "{:>4}  {:<28} {:<16} {:>6} pts",
                    player.rank.map(|r| r.to_string()).unwrap_or_default(),
                    player.name,
                    player.country,
                    player.points.map(|p| p.to_string()).unwrap_or_default(),
                );
            }
        }
        Command::Fixtures {
            player1,
            player2,
            limit,
        } => {
            let p1 = lookup(&service, &player1)?;
            let p2 = lookup(&service, &player2)?;
            let upcoming = service.upcoming_fixtures(p1.id, p2.id, limit).await?;
            match upcoming.source {
                Some(source) => println!("Upcoming fixtures (source: {}):\n", source),
                None => println!("Upcoming fixtures (from local store):\n"),
            }
            for (i, f) in upcoming.fixtures.iter().enumerate() {
                println!(
                    "{}. {} | {} | {} | {} {:.1}% - {} {:.1}%",
                    i + 1,
                    f.date.map(|d| d.to_string()).unwrap_or_default(),
                    f.tournament,
                    f.surface,
                    f.player1,
                    f.player1_probability * 100.0,
                    f.player2,
                    f.player2_probability * 100.0,
                );
            }
        }
        Command::Predict { player1, player2 } => {
            let p1 = lookup(&service, &player1)?;
            let p2 = lookup(&service, &player2)?;
            let report = service.predict(p1.id, p2.id)?;
            println!(
                "{}: {:.1}%  |  {}: {:.1}%",
                report.player1,
                report.player1_probability * 100.0,
                report.player2,
                report.player2_probability * 100.0,
            );
            println!(
                "Predicted winner: {} (confidence {:.1}%)",
                report.predicted_winner,
                report.confidence * 100.0
            );
            if report.prediction.is_none() {
                println!("Warning: prediction was computed but not recorded.");
            }

            match service.recent_matches_between(p1.id, p2.id).await? {
                RecentMatches::Stored(views) => {
                    println!("\nHead-to-head history:");
                    for v in views.iter().take(10) {
                        println!(
                            "  {} | {} | {} vs {} | winner: {}",
                            v.date,
                            v.tournament,
                            v.player1,
                            v.player2,
                            v.winner.as_deref().unwrap_or("-"),
                        );
                    }
                }
                RecentMatches::Queued => {
                    println!("\nNo local head-to-head history; fetching in background.");
                }
            }
        }
        Command::Preview { player1, player2 } => {
            let p1 = lookup(&service, &player1)?;
            let p2 = lookup(&service, &player2)?;
            let report = service.preview(p1.id, p2.id)?;
            println!(
                "{}: {:.1}%  |  {}: {:.1}%  ->  {}",
                report.player1,
                report.player1_probability * 100.0,
                report.player2,
                report.player2_probability * 100.0,
                report.predicted_winner,
            );
        }
        Command::Favorite { player, unset } => {
            let p = lookup(&service, &player)?;
            let updated = service.store().set_favorite(p.id, !unset)?;
            println!(
                "{} is {} a favorite",
                updated.name,
                if updated.favorite { "now" } else { "no longer" }
            );
        }
        Command::Export { dir } => {
            std::fs::create_dir_all(&dir).context("Failed to create export directory")?;
            let players_path = dir.join("players.csv");
            let matches_path = dir.join("matches.csv");
            export_players_csv(service.store(), &players_path)?;
            export_matches_csv(service.store(), &matches_path)?;
            println!(
                "Exported {} and {}",
                players_path.display(),
                matches_path.display()
            );
        }
    }

    if let Some(path) = &snapshot_path {
        save_snapshot(service.store(), path).context("Failed to save snapshot")?;
        println!("\nSaved snapshot to {}", path.display());
    }

    Ok(())
}

fn lookup(service: &TennisService, name: &str) -> Result<Player> {
    let normalized = tennis_predictor::utils::normalize::normalize_player_name(name);
    match service.store().find_player_by_name(&normalized) {
        Some(player) => Ok(player),
        None => bail!(
            "player \"{}\" not found in the store; run `scrape` first or check the spelling",
            name
        ),
    }
}
