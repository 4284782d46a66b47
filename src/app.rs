use crate::config::{EngineSettings, Settings};
use crate::deck::DeckBuilder;
use crate::error::EngineError;
use crate::generator::{GeminiClient, SuggestionApi};
use crate::labels::{genre_labels, image_url, is_genre_slug, language_label};
use crate::models::{CatalogRecord, Constraints, FinalPick, MediaKind, SwipeableMovie};
use crate::picker::FinalPicker;
use crate::rate_limit::{client_ip, Quota, RateLimiter};
use crate::tmdb::{CatalogApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap
const PER_IP_QUOTA: Quota = Quota {
    per_minute: 60,
    burst: 10,
};
const GLOBAL_QUOTA: Quota = Quota {
    per_minute: 200,
    burst: 20,
};
const MAX_TRACKED_CLIENTS: usize = 10_000;
const MAX_DECK_SIZE: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub deck: Arc<DeckBuilder>,
    pub picker: Arc<FinalPicker>,
    pub catalog: Arc<dyn CatalogApi>,
    pub region: String,
    pub api_token: Option<String>,
    pub limiter: Arc<Mutex<RateLimiter>>,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn SuggestionApi>,
        catalog: Arc<dyn CatalogApi>,
        engine: EngineSettings,
        region: String,
        api_token: Option<String>,
    ) -> Self {
        Self {
            deck: Arc::new(DeckBuilder::new(
                Arc::clone(&generator),
                Arc::clone(&catalog),
                engine.clone(),
            )),
            picker: Arc::new(FinalPicker::new(generator, Arc::clone(&catalog), engine)),
            catalog,
            region,
            api_token,
            limiter: Arc::new(Mutex::new(RateLimiter::new(
                PER_IP_QUOTA,
                GLOBAL_QUOTA,
                MAX_TRACKED_CLIENTS,
            ))),
        }
    }
}

pub async fn run_server(settings: Settings) -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::new(settings.tmdb_api_key.clone())?);
    let generator: Arc<dyn SuggestionApi> = Arc::new(GeminiClient::new(
        settings.gemini_api_key.clone(),
        settings.gemini_model.clone(),
        settings.gemini_temperature,
    )?);
    info!("Using generator model: {}", settings.gemini_model);
    if settings.api_token.is_some() {
        info!("Engine routes require REELPICK_API_TOKEN");
    } else {
        warn!("REELPICK_API_TOKEN not set, engine routes are open");
    }

    let state = AppState::new(
        generator,
        catalog,
        settings.engine.clone(),
        settings.region.clone(),
        settings.api_token.clone(),
    );
    let app = build_router(state);

    info!("Listening on {}", settings.bind);
    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let engine = Router::new()
        .route("/deck", post(build_deck))
        .route("/final-pick", post(final_pick))
        .route("/availability/:kind/:id", get(availability))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard));

    Router::new()
        .route("/health", get(health))
        .merge(engine)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Auth and rate limits in front of every route that spends generator or
/// catalog quota.
async fn guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(token) = state.api_token.as_deref() {
        if !bearer_matches(req.headers(), token) {
            warn!("Rejecting request: missing or invalid bearer token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid or missing API token" })),
            )
                .into_response();
        }
    }

    let ip = client_ip(req.headers());
    let admitted = state.limiter.lock().await.admit(&ip);
    if !admitted {
        warn!("Rate limit exceeded for {}", ip);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests. Slow down and retry shortly." })),
        )
            .into_response();
    }

    next.run(req).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRequest {
    #[serde(flatten)]
    pub constraints: Constraints,
    pub target_size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCard {
    #[serde(flatten)]
    pub movie: SwipeableMovie,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genre_labels: Vec<&'static str>,
    pub language_label: Option<&'static str>,
}

impl From<CatalogRecord> for DeckCard {
    fn from(record: CatalogRecord) -> Self {
        Self {
            poster_url: image_url(record.poster_ref.as_deref(), "w500"),
            backdrop_url: image_url(record.backdrop_ref.as_deref(), "original"),
            genre_labels: genre_labels(&record.genre_ids),
            language_label: language_label(&record.original_language),
            movie: SwipeableMovie::from(record),
        }
    }
}

async fn build_deck(
    State(state): State<AppState>,
    Json(req): Json<DeckRequest>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let constraints = validate_constraints(req.constraints)?;
    let target = req
        .target_size
        .unwrap_or(state.deck.settings().deck_size)
        .clamp(1, MAX_DECK_SIZE);

    let deck = state.deck.build(&constraints, target).await.map_err(|e| {
        warn!("Deck build failed: {}", e);
        e
    })?;
    let items: Vec<DeckCard> = deck.into_iter().map(DeckCard::from).collect();
    Ok(Json(json!({ "items": items })))
}

fn validate_constraints(mut constraints: Constraints) -> Result<Constraints, EngineError> {
    let languages = constraints.language_set();
    if let Some(bad) = languages
        .iter()
        .find(|c| c.len() != 2 || !c.bytes().all(|b| b.is_ascii_alphabetic()))
    {
        return Err(EngineError::InvalidInput(format!(
            "Unsupported language code '{bad}'. Use two-letter codes like 'en'."
        )));
    }
    constraints.languages = languages;
    constraints.genres.retain(|slug| {
        let known = is_genre_slug(slug);
        if !known {
            debug!(slug = %slug, "Ignoring unknown genre slug");
        }
        known
    });
    Ok(constraints)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalPickRequest {
    #[serde(default)]
    pub liked: Vec<CatalogRecord>,
    #[serde(default)]
    pub disliked: Vec<CatalogRecord>,
    #[serde(default)]
    pub excluded_titles: Vec<String>,
}

async fn final_pick(
    State(state): State<AppState>,
    Json(req): Json<FinalPickRequest>,
) -> Result<Json<FinalPick>, EngineError> {
    let pick = state
        .picker
        .pick(&req.liked, &req.disliked, req.excluded_titles)
        .await
        .map_err(|e| {
            warn!("Final pick failed: {}", e);
            e
        })?;
    Ok(Json(pick))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub region: Option<String>,
}

async fn availability(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i32)>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let kind = MediaKind::parse(&kind)
        .ok_or_else(|| EngineError::InvalidInput(format!("Unknown media kind '{kind}'")))?;
    let region = query
        .region
        .filter(|r| r.len() == 2 && r.bytes().all(|b| b.is_ascii_alphabetic()))
        .unwrap_or_else(|| state.region.clone())
        .to_ascii_uppercase();
    let providers = state
        .catalog
        .watch_availability(kind, id, &region)
        .await
        .map_err(|e| {
            warn!("Watch availability lookup failed: {:#}", e);
            EngineError::catalog(e)
        })?;
    Ok(Json(json!({ "region": region, "providers": providers })))
}

fn bearer_matches(headers: &HeaderMap, token: &str) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(presented) = value.strip_prefix("Bearer ") else {
        return false;
    };
    constant_time_eq(presented.trim().as_bytes(), token.as_bytes())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    info!(signal = received, "Shutting down, draining in-flight requests");
}
