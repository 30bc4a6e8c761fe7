//! HTTP handlers for REST API endpoints

use axum::{
    extract::{Query, Request, State},
    http::{Method, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lerecherche::{SearchEngine, SearchMethod};
use serde::Deserialize;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::cache::{fingerprint, ResponseCache};
use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::limiter::{self, RateLimiter};
use crate::responses::{
    round_seconds, Capabilities, HealthResponse, Metrics, RecommendResponse, SearchResponse,
    SystemInfo, RECOMMEND_ALGORITHM, RECOMMEND_METHOD,
};
use crate::validate;

/// Endpoints listed by the root document and the 404 fallback
pub const ENDPOINTS: [&str; 4] = ["/", "/health", "/search", "/recommend"];

/// Query parameters for the search endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search query string
    pub q: Option<String>,

    /// Maximum number of results to return
    pub limit: Option<String>,

    /// Preferred method: lexical/bm25 or vector/tfidf
    pub method: Option<String>,
}

/// Query parameters for the recommendation endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    /// Reference article title
    pub title: Option<String>,

    /// Maximum number of recommendations to return
    pub limit: Option<String>,
}

/// State shared across all handlers
///
/// The engine is immutable apart from its own write-once readiness
/// transitions; the caches and the limiter lock internally.
#[derive(Clone)]
pub struct AppState {
    /// Retrieval and recommendation engine
    pub engine: Arc<SearchEngine>,

    /// Cached search responses
    pub search_cache: Arc<ResponseCache<SearchResponse>>,

    /// Cached recommendation responses
    pub recommend_cache: Arc<ResponseCache<RecommendResponse>>,

    /// Per-client request limiter
    pub limiter: Arc<RateLimiter>,

    /// Requests admitted by the limiter
    pub request_count: Arc<AtomicU64>,

    /// Immutable server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create state around a shared engine
    pub fn new(engine: Arc<SearchEngine>, config: ServerConfig) -> Self {
        Self {
            engine,
            search_cache: Arc::new(ResponseCache::new(config.cache_ttl())),
            recommend_cache: Arc::new(ResponseCache::new(config.cache_ttl())),
            limiter: Arc::new(RateLimiter::new(config.rate_limit, config.rate_window())),
            request_count: Arc::new(AtomicU64::new(0)),
            config: Arc::new(config),
        }
    }

    /// Requests admitted so far
    pub fn total_requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// Reject clients over their request budget
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = limiter::client_id(&request);
    if !state.limiter.allow(&client) {
        warn!("Rate limit exceeded for {}", client);
        return ApiError::rate_limited().into_response();
    }

    state.request_count.fetch_add(1, Ordering::Relaxed);
    next.run(request).await
}

/// GET /search - Lexical or vector search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let start = Instant::now();

    let raw = validate::required(params.q.as_deref(), "q")?;
    let query = validate::validate_text(raw, state.config.max_query_len)?;
    let limit = validate::clamp_limit(params.limit.as_deref(), state.config.max_results)?;
    let preferred = params
        .method
        .as_deref()
        .and_then(|m| m.parse::<SearchMethod>().ok());

    let limit_arg = limit.to_string();
    let method_arg = preferred.map_or("", |m| m.as_str());
    let key = fingerprint("search", &[query.as_str(), limit_arg.as_str(), method_arg]);

    if let Some(mut cached) = state.search_cache.get(&key) {
        debug!("Search cache hit for '{}'", query);
        cached.cached = true;
        return Ok(Json(cached));
    }

    let outcome = state.engine.search(&query, limit, preferred).await;
    let response = SearchResponse {
        query,
        total_results: outcome.results.len(),
        results: outcome.results,
        search_method: outcome.method,
        processing_time: round_seconds(start.elapsed().as_secs_f64()),
        cached: false,
        degraded: outcome.degraded,
        system_info: SystemInfo {
            lexical_available: state.engine.lexical_status()
                == lerecherche::LexicalStatus::Available,
            vector_available: state.engine.vector_ready(),
        },
    };
    if response.degraded {
        warn!("Search for '{}' degraded; response not cached", response.query);
    } else {
        state.search_cache.put(key, response.clone());
    }

    info!(
        "Search: '{}' -> {} results via {}",
        response.query, response.total_results, response.search_method
    );
    Ok(Json(response))
}

/// GET /recommend - Hybrid content and title recommendations
pub async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> ApiResult<Json<RecommendResponse>> {
    let start = Instant::now();

    let raw = validate::required(params.title.as_deref(), "title")?;
    let title = validate::validate_text(raw, state.config.max_title_len)?;
    let limit =
        validate::clamp_limit(params.limit.as_deref(), state.config.max_recommendations)?;

    let limit_arg = limit.to_string();
    let key = fingerprint("recommend", &[title.as_str(), limit_arg.as_str()]);

    if let Some(mut cached) = state.recommend_cache.get(&key) {
        debug!("Recommendation cache hit for '{}'", title);
        cached.cached = true;
        return Ok(Json(cached));
    }

    let set = state.engine.recommend(&title, limit);
    let matched_title = set
        .matched
        .and_then(|m| state.engine.corpus().get(m.index))
        .map(|article| article.title.clone());

    let response = RecommendResponse {
        input_title: title,
        matched_title,
        match_kind: set.matched.map(|m| m.kind),
        total_recommendations: set.items.len(),
        recommendations: set.items,
        processing_time: round_seconds(start.elapsed().as_secs_f64()),
        cached: false,
        algorithm: RECOMMEND_ALGORITHM.to_string(),
        method: RECOMMEND_METHOD.to_string(),
    };
    state.recommend_cache.put(key, response.clone());

    info!(
        "Recommendations: '{}' -> {} items",
        response.input_title, response.total_recommendations
    );
    Ok(Json(response))
}

/// GET /health - Readiness and counters
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let vector_ready = state.engine.vector_ready();

    Json(HealthResponse {
        status: if vector_ready { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        articles: state.engine.corpus().len(),
        capabilities: Capabilities {
            vector_search: vector_ready,
            lexical_search: state.engine.lexical_status(),
            hybrid_recommendations: vector_ready,
        },
        metrics: Metrics {
            total_requests: state.total_requests(),
            cache_entries: state.search_cache.len() + state.recommend_cache.len(),
        },
    })
}

/// GET / - Service description
pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    let weighting = state.engine.scorer().weighting_label();
    Json(serde_json::json!({
        "service": "leserve",
        "description": "Article search and recommendation service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health - readiness of each retrieval mode and request counters",
            "search": "/search?q=<query>&limit=<num>&method=<lexical|vector>",
            "recommend": "/recommend?title=<title>&limit=<num>",
        },
        "limits": {
            "max_results": state.config.max_results,
            "max_recommendations": state.config.max_recommendations,
            "rate_limit": state.config.rate_limit,
            "rate_window_secs": state.config.rate_window_secs,
        },
        "recommendations": {
            "method": lerecherche::recommend::RECOMMENDATION_METHOD,
            "weighting": weighting,
        },
    }))
}

/// Unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    debug!("No route for {}", uri.path());
    ApiError::not_found("Endpoint not found").with_available(&ENDPOINTS)
}

/// Turn a handler panic into a 500 JSON error
pub fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("Request handler panicked");
    ApiError::internal("Internal server error").into_response()
}

/// Create router with all API endpoints
///
/// Search and recommendation are rate limited; the root document and the
/// health probe are not.
pub fn create_router(state: AppState) -> Router {
    let limited = Router::new()
        .route("/search", get(search))
        .route("/recommend", get(recommend))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(cors::Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(limited)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_search_params_empty() {
        let params = SearchParams::default();
        assert!(params.q.is_none());
        assert!(params.limit.is_none());
        assert!(params.method.is_none());
    }

    #[tokio::test]
    async fn test_not_found_lists_endpoints() {
        let error = not_found(Uri::from_static("/nowhere")).await;
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.available.as_deref(), Some(&ENDPOINTS[..]));
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
