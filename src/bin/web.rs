use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tennis_predictor::utils::data::load_snapshot;
use tennis_predictor::{
    Config, FixtureKind, MatchStore, RecentMatches, SourceChain, StoreError, TennisService,
};
use tower_http::trace::TraceLayer;

type SharedService = Arc<TennisService>;

#[derive(Deserialize)]
struct PairParams {
    player1_id: u64,
    player2_id: u64,
}

#[derive(Deserialize)]
struct FixtureParams {
    player1_id: u64,
    player2_id: u64,
    #[serde(default = "default_fixture_limit")]
    limit: usize,
}

fn default_fixture_limit() -> usize {
    10
}

fn error_response(err: StoreError) -> Response {
    let status = match err {
        StoreError::PlayerNotFound(_) | StoreError::MatchNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn players(State(service): State<SharedService>) -> impl IntoResponse {
    Json(service.players())
}

async fn recent_predictions(State(service): State<SharedService>) -> impl IntoResponse {
    let store = service.store();
    let rows: Vec<_> = service
        .recent_predictions(10)
        .into_iter()
        .map(|p| {
            let name = |id| {
                store
                    .get_player(id)
                    .map(|player| player.name)
                    .unwrap_or_else(|_| "?".to_string())
            };
            json!({
                "id": p.id,
                "player1": name(p.player1_id),
                "player2": name(p.player2_id),
                "predicted_winner": name(p.predicted_winner_id),
                "confidence_percent": (p.confidence * 1000.0).round() / 10.0,
                "prediction_date": p.prediction_date,
            })
        })
        .collect();
    Json(rows)
}

async fn predict(
    State(service): State<SharedService>,
    Json(params): Json<PairParams>,
) -> Response {
    if params.player1_id == params.player2_id {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "please select two different players" })),
        )
            .into_response();
    }
    match service.predict(params.player1_id, params.player2_id) {
        Ok(report) => {
            if let Some(prediction) = &report.prediction {
                let prediction_id = prediction.id;
                (
                    StatusCode::OK,
                    Json(json!({
                        "player1": report.player1,
                        "player2": report.player2,
                        "predicted_winner": report.predicted_winner,
                        "confidence_percent": (report.confidence * 1000.0).round() / 10.0,
                        "player1_probability": report.player1_probability,
                        "player2_probability": report.player2_probability,
                        "persisted": true,
                        "prediction_id": prediction_id,
                    })),
                )
                    .into_response()
            } else {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "error": "prediction could not be recorded",
                        "persisted": false,
                    })),
                )
                    .into_response()
            }
        }
        Err(err) => error_response(err),
    }
}

async fn preview(
    State(service): State<SharedService>,
    Query(params): Query<PairParams>,
) -> Response {
    match service.preview(params.player1_id, params.player2_id) {
        Ok(report) => Json(report).into_response(),
        Err(err) => error_response(err),
    }
}

async fn recent_matches(
    State(service): State<SharedService>,
    Query(params): Query<PairParams>,
) -> Response {
    match service
        .recent_matches_between(params.player1_id, params.player2_id)
        .await
    {
        Ok(RecentMatches::Stored(matches)) => {
            Json(json!({ "source": "db", "matches": matches })).into_response()
        }
        Ok(RecentMatches::Queued) => Json(json!({
            "source": "queued",
            "matches": [],
            "message": "No local matches found, fetching in background",
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn upcoming_fixtures(
    State(service): State<SharedService>,
    Query(params): Query<FixtureParams>,
) -> Response {
    match service
        .upcoming_fixtures(params.player1_id, params.player2_id, params.limit)
        .await
    {
        Ok(upcoming) => Json(json!({
            "source": upcoming.source,
            "upcoming": upcoming.fixtures,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn generate_predictions(
    State(service): State<SharedService>,
    Json(params): Json<FixtureParams>,
) -> Response {
    match service
        .generate_predictions(params.player1_id, params.player2_id, params.limit)
        .await
    {
        Ok(created) => Json(json!({ "created": created })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn scrape(State(service): State<SharedService>) -> impl IntoResponse {
    let rankings = service.fetch_and_persist_rankings().await;
    let matches = service
        .fetch_and_persist_fixtures(FixtureKind::Recent, 50)
        .await;
    Json(json!({
        "players": { "count": rankings.count, "source": rankings.source },
        "matches": { "count": matches.count, "source": matches.source },
    }))
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let store = Arc::new(MatchStore::new());
    if let Some(path) = &config.snapshot_file {
        if Path::new(path).exists() {
            match load_snapshot(&store, Path::new(path)) {
                Ok(()) => println!("Loaded snapshot from {}", path),
                Err(e) => eprintln!("Failed to load snapshot {}: {}", path, e),
            }
        }
    }
    let service = Arc::new(TennisService::with_parts(
        store,
        Arc::new(SourceChain::from_config(&config)),
    ));

    let app = Router::new()
        .route("/players", get(players))
        .route("/predictions/recent", get(recent_predictions))
        .route("/predictions/generate", post(generate_predictions))
        .route("/predict", post(predict))
        .route("/preview", get(preview))
        .route("/matches/recent", get(recent_matches))
        .route("/fixtures/upcoming", get(upcoming_fixtures))
        .route("/admin/scrape", post(scrape))
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    println!("Starting web server at http://{}", config.bind_addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
