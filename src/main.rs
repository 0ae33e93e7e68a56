use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Timelike;
use clap::Parser;
use geojson::{Geometry, Value};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use safe_routing::config::{load_config, AppConfig};
use safe_routing::{loader, logging};
use safe_routing::{Coordinate, DayNight, GraphCache, QueryTime, RouteMode, RoutingError};

#[derive(Parser, Debug)]
#[command(name = "safe-routing", about = "Safety-aware street routing API")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

// Shared State for concurrency
struct AppState {
    cache: GraphCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.logging.level);
    tracing::info!(bind_address = %config.server.bind_address, "safe-routing starting");

    // 1. Load segments and build the graph once, up front
    let shared_state = Arc::new(AppState {
        cache: GraphCache::new(),
    });
    let data = config.data.clone();
    shared_state
        .cache
        .get_or_load(move || loader::load_segments(&data), config.daylight)
        .await?;

    // 2. Setup Router
    let app = app(shared_state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    // Allows a local HTML page to talk to this API
    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/route", post(calculate_route))
        .layer(cors)
        .with_state(state)
}

// --- API DTOs ---

#[derive(Deserialize)]
struct RouteRequest {
    origin: [f64; 2],      // [lat, lon]
    destination: [f64; 2], // [lat, lon]
    #[serde(default)]
    mode: RouteMode,
    /// Hour of day ("0".."23") or RFC 3339 timestamp; defaults to now.
    time: Option<String>,
}

#[derive(Serialize)]
struct RouteResponse {
    geometry: Geometry,
    total_distance_km: f64,
    average_safety: f64,
    regime: DayNight,
    street_names: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, err: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

// [lon, lat] standard for GeoJSON
fn line_string(coords: &[Coordinate]) -> Geometry {
    Geometry::new(Value::LineString(
        coords.iter().map(|c| c.to_lon_lat().to_vec()).collect(),
    ))
}

fn empty_response(regime: DayNight) -> RouteResponse {
    RouteResponse {
        geometry: line_string(&[]),
        total_distance_km: 0.0,
        average_safety: 0.0,
        regime,
        street_names: vec![],
    }
}

// --- Handler ---

async fn calculate_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Some(ctx) = state.cache.get() else {
        return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, "graph is still loading"));
    };

    let time = match payload.time.as_deref() {
        Some(raw) => raw
            .parse::<QueryTime>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => QueryTime::Hour(chrono::Local::now().hour() as u8),
    };

    let origin = Coordinate::from(payload.origin);
    let destination = Coordinate::from(payload.destination);
    if !origin.is_finite() || !destination.is_finite() {
        return Err(api_error(StatusCode::BAD_REQUEST, "coordinates must be finite"));
    }

    // Searching is CPU-bound; keep it off the async workers
    let mode = payload.mode;
    let regime = ctx.regime(time);
    let planned = tokio::task::spawn_blocking(move || ctx.plan(origin, destination, mode, time))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    match planned {
        Ok(Some(planned)) => {
            tracing::debug!(
                ?mode,
                nodes = planned.route.nodes.len(),
                distance_km = planned.summary.distance_km,
                "Route found"
            );
            Ok(Json(RouteResponse {
                geometry: line_string(&planned.coordinates),
                total_distance_km: planned.summary.distance_km,
                average_safety: planned.summary.average_safety,
                regime: planned.regime,
                street_names: planned.summary.street_names,
            }))
        }
        Ok(None) => {
            tracing::debug!(?mode, "Destination unreachable");
            Ok(Json(empty_response(regime)))
        }
        Err(RoutingError::NoNearbyNodes) => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            RoutingError::NoNearbyNodes,
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}
