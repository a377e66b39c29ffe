use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use roll_optimizer::config::PackingConfig;
use roll_optimizer::error::InputError;
use roll_optimizer::input::{validate_options, validate_pieces};
use roll_optimizer::solver::Solver;
use roll_optimizer::types::{PackOptions, Piece, RollLayout, deserialize_u32_from_number};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    pieces: Vec<Piece>,
    #[serde(default)]
    add_slippage: bool,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    steps: u32,
    #[serde(default)]
    config: Option<PackingConfig>,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct RecomputeRequest {
    layout: RollLayout,
}

#[derive(Serialize)]
struct RecomputeResponse {
    #[serde(flatten)]
    layout: RollLayout,
    violations: Vec<String>,
}

fn build_solver(req: OptimizeRequest) -> Result<(Solver, Option<u64>), InputError> {
    validate_pieces(&req.pieces)?;
    let config = req.config.unwrap_or_default().sanitized()?;
    let options = PackOptions {
        add_slippage: req.add_slippage,
        steps: req.steps,
    };
    validate_options(&options)?;
    Ok((Solver::new(config, options, req.pieces), req.seed))
}

async fn optimize(Json(req): Json<OptimizeRequest>) -> Result<Json<RollLayout>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let (solver, seed) = build_solver(req).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // The search can run for seconds; keep it off the async workers.
    let layout = tokio::task::spawn_blocking(move || match seed {
        Some(seed) => solver.solve_with_rng(&mut StdRng::seed_from_u64(seed)),
        None => solver.solve(),
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "solver task failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "solver failed".to_string())
    })?;

    Ok(Json(layout))
}

async fn recompute(Json(req): Json<RecomputeRequest>) -> Json<RecomputeResponse> {
    let mut layout = req.layout;
    layout.recompute();
    let violations = layout.validate().iter().map(ToString::to_string).collect();
    Json(RecomputeResponse { layout, violations })
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .route("/recompute", post(recompute))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn main() {
    let _sentry = sentry::init((
        std::env::var("SENTRY_DSN").ok(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

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

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime")
        .block_on(async {
            let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
            eprintln!("Listening on {addr}");
            axum::serve(listener, app()).await.unwrap();
        });
}
