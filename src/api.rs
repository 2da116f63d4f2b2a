//! HTTP API Server for Recommendations
//!
//! Provides REST endpoints for the frontend: the product catalog, the
//! selectable tag vocabulary, and recommendations for a selection.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderValue, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::recommendation::metrics::{self, PerformanceTimer, ResultSummary};
use crate::recommendation::{
    recommend, CatalogClient, CatalogItem, Recommendation, Selection, TagVocabulary,
};

/// Catalog as last fetched
#[derive(Debug, Clone, Default)]
struct CatalogSnapshot {
    items: Arc<Vec<CatalogItem>>,
    loaded_at: Option<DateTime<Utc>>,
}

/// Shared application state
pub struct AppState {
    catalog: RwLock<CatalogSnapshot>,
    client: Option<CatalogClient>,
    tags_per_item: Option<usize>,
}

impl AppState {
    pub fn new(client: CatalogClient, tags_per_item: Option<usize>) -> Self {
        Self {
            catalog: RwLock::new(CatalogSnapshot::default()),
            client: Some(client),
            tags_per_item,
        }
    }

    /// State serving a fixed catalog, with no provider to refresh from
    pub fn with_catalog(items: Vec<CatalogItem>, tags_per_item: Option<usize>) -> Self {
        Self {
            catalog: RwLock::new(CatalogSnapshot {
                items: Arc::new(items),
                loaded_at: Some(Utc::now()),
            }),
            client: None,
            tags_per_item,
        }
    }

    pub async fn catalog(&self) -> Arc<Vec<CatalogItem>> {
        self.catalog.read().await.items.clone()
    }

    /// Re-fetch the catalog and swap it in. On failure the old catalog stays.
    pub async fn refresh(&self) -> Result<usize> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::catalog("no catalog provider configured"))?;

        let result = client.fetch_catalog().await;
        metrics::record_catalog_refresh(result.is_ok());
        let items = result?;

        let count = items.len();
        let mut snapshot = self.catalog.write().await;
        snapshot.items = Arc::new(items);
        snapshot.loaded_at = Some(Utc::now());
        Ok(count)
    }
}

/// Query params for the recommendations endpoint
#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    /// Reject incomplete selections with 400 instead of answering empty
    #[serde(default = "default_validate")]
    pub validate: bool,
}

fn default_validate() -> bool {
    true
}

/// Handlers slower than this are logged at warn level
const SLOW_REQUEST_MS: u64 = 200;

/// Response for the recommendations endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub request_id: String,
    pub mode: Option<String>,
    pub items: Vec<Recommendation>,
    pub total: usize,
    pub summary: ResultSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub items: Vec<CatalogItem>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub items: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog_items: usize,
    pub catalog_loaded_at: Option<DateTime<Utc>>,
}

/// Build the router with all routes and layers
pub fn router(state: Arc<AppState>, config: &ApiConfig) -> Router {
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Catalog
        .route("/api/v1/catalog", get(get_catalog))
        .route("/api/v1/catalog/tags", get(get_tags))
        .route("/api/v1/catalog/refresh", post(refresh_catalog))
        // Matching
        .route("/api/v1/recommendations", post(get_recommendations))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.cors_enabled {
        app.layer(cors_layer(&config.cors_origins))
    } else {
        app
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    cors.allow_origin(parsed)
}

/// Start the API server, running until `shutdown` resolves
pub async fn start_server<F>(state: Arc<AppState>, config: &ApiConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, config);

    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Starting recommendation API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.catalog.read().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_items: snapshot.items.len(),
        catalog_loaded_at: snapshot.loaded_at,
    })
}

/// Current catalog snapshot
async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    let items = state.catalog().await;
    Json(CatalogResponse {
        total: items.len(),
        items: items.to_vec(),
    })
}

/// Tags the user can select from
async fn get_tags(State(state): State<Arc<AppState>>) -> Json<TagVocabulary> {
    let items = state.catalog().await;
    Json(TagVocabulary::from_catalog(&items, state.tags_per_item))
}

/// Re-fetch the catalog from the provider
async fn refresh_catalog(State(state): State<Arc<AppState>>) -> Result<Json<RefreshResponse>> {
    match state.refresh().await {
        Ok(items) => Ok(Json(RefreshResponse { items })),
        Err(e) => {
            error!("Failed to refresh catalog: {}", e);
            Err(e)
        }
    }
}

/// Recommendations for a selection
async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecommendationsQuery>,
    payload: std::result::Result<Json<Selection>, JsonRejection>,
) -> Result<Json<RecommendationsResponse>> {
    let timer = PerformanceTimer::new("get_recommendations");

    let Json(selection) = payload.map_err(|e| Error::bad_request(e.body_text()))?;

    if query.validate {
        selection.validate()?;
    }

    let catalog = state.catalog().await;
    let items = recommend(Some(&selection), &catalog);

    let mode = selection.mode();
    metrics::record_request(mode, items.len());
    timer.log_if_slow(SLOW_REQUEST_MS);

    Ok(Json(RecommendationsResponse {
        request_id: uuid::Uuid::new_v4().to_string(),
        mode: mode.map(|m| m.as_wire().to_string()),
        total: items.len(),
        summary: ResultSummary::new(&items, &selection),
        items,
    }))
}
