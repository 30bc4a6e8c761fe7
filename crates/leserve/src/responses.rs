//! API response bodies

use lerecherche::{LexicalStatus, MatchKind, Recommendation, SearchHit, SearchMethod};
use serde::{Deserialize, Serialize};

/// Algorithm description attached to recommendation responses
pub const RECOMMEND_ALGORITHM: &str = "Hybrid TF-IDF (Content + Title)";

/// Method description attached to recommendation responses
pub const RECOMMEND_METHOD: &str = "Hybrid content-based with title boosting";

/// Retrieval readiness reported alongside search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Lexical index is open
    pub lexical_available: bool,

    /// Vector spaces are built
    pub vector_available: bool,
}

/// `/search` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Sanitized query
    pub query: String,

    /// Ranked hits
    pub results: Vec<SearchHit>,

    /// Number of hits
    pub total_results: usize,

    /// Strategy that served the request
    pub search_method: SearchMethod,

    /// Seconds spent producing the response, rounded to milliseconds
    pub processing_time: f64,

    /// Served from the response cache
    pub cached: bool,

    /// The chosen strategy failed or timed out; such responses are not cached
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,

    /// Retrieval readiness at the time of the search
    pub system_info: SystemInfo,
}

/// `/recommend` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    /// Sanitized reference title
    pub input_title: String,

    /// Corpus title the input resolved to
    pub matched_title: Option<String>,

    /// How the input was resolved
    pub match_kind: Option<MatchKind>,

    /// Ranked recommendations
    pub recommendations: Vec<Recommendation>,

    /// Number of recommendations
    pub total_recommendations: usize,

    /// Seconds spent producing the response, rounded to milliseconds
    pub processing_time: f64,

    /// Served from the response cache
    pub cached: bool,

    /// Algorithm description
    pub algorithm: String,

    /// Method description
    pub method: String,
}

/// Readiness of each capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Vector search can be served
    pub vector_search: bool,

    /// Lexical index lifecycle
    pub lexical_search: LexicalStatus,

    /// Recommendations can be served
    pub hybrid_recommendations: bool,
}

/// Request counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Requests admitted by the rate limiter
    pub total_requests: u64,

    /// Entries held by both response caches
    pub cache_entries: usize,
}

/// `/health` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    /// RFC 3339 timestamp
    pub timestamp: String,

    /// Service version
    pub version: String,

    /// Articles loaded
    pub articles: usize,

    /// Readiness of each capability
    pub capabilities: Capabilities,

    /// Request counters
    pub metrics: Metrics,
}

/// Round seconds to milliseconds
pub fn round_seconds(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
