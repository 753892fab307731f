use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::cli::{ServeArgs, term_counting};
use crate::commands::query::RankedResponse;
use crate::model::Workout;
use crate::ranking::{RankedWorkout, TermCounting};
use crate::search::{parse_muscle_terms, search_workouts};
use crate::store::WorkoutStore;

struct ServerState {
    db_path: PathBuf,
    counting: TermCounting,
}

type SharedState = Arc<ServerState>;

#[derive(Debug, Default, Deserialize)]
struct WorkoutQuery {
    muscles: Option<String>,
    #[serde(default)]
    scores: bool,
    distinct: Option<bool>,
}

pub fn run(args: ServeArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    if !db_path.exists() {
        bail!(
            "database not found: {} (run `workout-catalog ingest` first)",
            db_path.display()
        );
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;

    let state = Arc::new(ServerState {
        db_path,
        counting: term_counting(args.distinct_terms),
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(serve(addr, state))
}

async fn serve(addr: SocketAddr, state: SharedState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %addr,
        db = %state.db_path.display(),
        counting = ?state.counting,
        "server running"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/workouts", get(list_workouts))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn list_workouts(
    State(state): State<SharedState>,
    Query(params): Query<WorkoutQuery>,
) -> Response {
    let terms = parse_muscle_terms(params.muscles.as_deref());
    let counting = params.distinct.map(term_counting).unwrap_or(state.counting);

    let db_path = state.db_path.clone();
    let search_terms = terms.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<Vec<RankedWorkout>> {
        let store = WorkoutStore::open_read_only(&db_path)?;
        search_workouts(&store, &search_terms, counting)
    })
    .await;

    let results = match outcome {
        Ok(Ok(results)) => results,
        Ok(Err(err)) => {
            error!(error = %format!("{err:#}"), "error fetching workouts");
            return fetch_failed();
        }
        Err(err) => {
            error!(error = %err, "workout search task failed");
            return fetch_failed();
        }
    };

    info!(
        terms = ?terms,
        counting = ?counting,
        returned = results.len(),
        "workouts fetched"
    );

    if params.scores {
        return Json(RankedResponse::new(terms, counting, results)).into_response();
    }

    let workouts = results
        .into_iter()
        .map(|entry| entry.workout)
        .collect::<Vec<Workout>>();
    Json(workouts).into_response()
}

fn fetch_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Failed to fetch workouts"
        })),
    )
        .into_response()
}
