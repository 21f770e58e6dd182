use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use panel_optimizer::error::PlacementError;
use panel_optimizer::solver::Solver;
use panel_optimizer::surface::build_surface;
use panel_optimizer::types::{Offset, Placement, Shape, SolverOptions};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

const DEFAULT_STEP_BUDGET: u64 = 50_000_000;
const MAX_CACHE_ENTRIES: usize = 1024;
// The search keeps one frame per free cell, so this also caps per-request memory.
const MAX_REQUEST_CELLS: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
struct SolveRequest {
    surface: Shape,
    #[serde(default)]
    offset: Option<Offset>,
    panel: Shape,
    #[serde(flatten)]
    options: SolverOptions,
}

#[derive(Debug, Clone, Serialize)]
struct SolveResponse {
    count: usize,
    placements: Vec<Placement>,
    canvas: Canvas,
    free_cells: usize,
    steps: u64,
    cached: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Canvas {
    rows: usize,
    cols: usize,
}

// Solve results keyed by the full request; a solve is a pure function of it.
type Cache = Arc<Mutex<HashMap<SolveRequest, SolveResponse>>>;

fn canvas_cells(req: &SolveRequest) -> u64 {
    let (dr, dc) = req
        .offset
        .map_or((0, 0), |o| (o.rows.max(0) as u64, o.cols.max(0) as u64));
    (req.surface.h as u64)
        .saturating_add(dr)
        .saturating_mul((req.surface.w as u64).saturating_add(dc))
}

fn run_solve(req: &SolveRequest) -> Result<SolveResponse, PlacementError> {
    let cells = canvas_cells(req);
    if cells > MAX_REQUEST_CELLS {
        return Err(PlacementError::InvalidSurface {
            reason: format!(
                "canvas of {cells} cells exceeds the {MAX_REQUEST_CELLS} cell limit"
            ),
        });
    }

    let mut grid = build_surface(req.surface, req.offset)?;
    let options = SolverOptions {
        step_budget: Some(req.options.step_budget.unwrap_or(DEFAULT_STEP_BUDGET)),
        ..req.options
    };
    let solution = Solver::with_options(req.panel, options)?.solve(&mut grid)?;

    Ok(SolveResponse {
        count: solution.count,
        placements: solution.placements,
        canvas: Canvas {
            rows: grid.rows(),
            cols: grid.cols(),
        },
        free_cells: grid.free_count(),
        steps: solution.steps,
        cached: false,
    })
}

fn status_for(err: &PlacementError) -> StatusCode {
    match err {
        PlacementError::InvalidSurface { .. } | PlacementError::InvalidPanelShape { .. } => {
            StatusCode::BAD_REQUEST
        }
        PlacementError::ResourceExhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

async fn solve(
    State(cache): State<Cache>,
    Json(req): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /solve"
    );

    let hit = cache.lock().ok().and_then(|c| c.get(&req).cloned());
    if let Some(hit) = hit {
        return Ok(Json(SolveResponse { cached: true, ..hit }));
    }

    let response = tokio::task::spawn_blocking(move || run_solve(&req))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::info!(error = %e, "solve rejected");
            (status_for(&e), e.to_string())
        })?;

    if let Ok(mut c) = cache.lock() {
        if c.len() >= MAX_CACHE_ENTRIES {
            c.clear();
        }
        c.insert(req, response.clone());
    }

    Ok(Json(response))
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let cache: Cache = Arc::new(Mutex::new(HashMap::new()));
    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/solve", post(solve))
        .with_state(cache)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
