// Core search engine implementation

use crate::corpus::{Article, Corpus};
use crate::lexical::{LexicalHit, LexicalIndex, LexicalStatus};
use crate::ranking::{HybridScorer, ScoringConfig};
use crate::space::{self, VectorSpace};
use crate::vector;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default bound on a single lexical query
pub const DEFAULT_LEXICAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    /// BM25 over the external index
    #[serde(alias = "bm25")]
    Lexical,
    /// TF-IDF cosine similarity
    #[serde(alias = "tfidf")]
    Vector,
    /// Neither strategy is ready
    Unavailable,
}

impl SearchMethod {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Vector => "vector",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" | "bm25" => Ok(Self::Lexical),
            "vector" | "tfidf" => Ok(Self::Vector),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// A method name that is neither lexical nor vector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown search method: {0}")]
pub struct UnknownMethod(pub String);

/// Search result in the shape shared by both strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Article title
    pub title: String,

    /// Public URL
    pub url: String,

    /// Relevance score (not comparable across methods)
    pub score: f32,

    /// Strategy that produced this hit
    pub method: SearchMethod,

    /// Leading content excerpt, vector results only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl From<LexicalHit> for SearchHit {
    fn from(hit: LexicalHit) -> Self {
        Self {
            title: hit.title,
            url: hit.url,
            score: hit.score,
            method: SearchMethod::Lexical,
            preview: None,
        }
    }
}

/// Results of one search together with the strategy used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Ranked hits
    pub results: Vec<SearchHit>,

    /// Strategy that served the request
    pub method: SearchMethod,

    /// The chosen strategy failed or timed out; results are not authoritative
    #[serde(default)]
    pub degraded: bool,
}

/// Search engine combining lexical and vector retrieval
///
/// Built once at startup and shared by reference. The vector space and the
/// lexical index each make a single transition to ready; everything else is
/// immutable.
pub struct SearchEngine {
    corpus: Arc<Corpus>,
    vectors: OnceCell<VectorSpace>,
    lexical: Arc<LexicalIndex>,
    scorer: HybridScorer,
    lexical_timeout: Duration,
}

impl SearchEngine {
    /// Create a new search engine; no index is built yet
    pub fn new(corpus: Corpus, lexical: LexicalIndex, scoring: ScoringConfig) -> Self {
        Self {
            corpus: Arc::new(corpus),
            vectors: OnceCell::new(),
            lexical: Arc::new(lexical),
            scorer: HybridScorer::with_config(scoring),
            lexical_timeout: DEFAULT_LEXICAL_TIMEOUT,
        }
    }

    /// Bound each lexical query
    pub fn with_lexical_timeout(mut self, timeout: Duration) -> Self {
        self.lexical_timeout = timeout;
        self
    }

    /// Build the vector spaces
    ///
    /// Succeeds immediately when they are already built.
    pub fn build_vectors(&self) -> Result<(), space::Error> {
        self.vectors
            .get_or_try_init(|| VectorSpace::build(&self.corpus))
            .map(|_| ())
    }

    /// Open the lexical index (blocking)
    pub fn initialize_lexical(&self) -> LexicalStatus {
        self.lexical.initialize()
    }

    /// The article table
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Vector spaces, once built
    pub fn vectors(&self) -> Option<&VectorSpace> {
        self.vectors.get()
    }

    /// Whether vector search can be served
    pub fn vector_ready(&self) -> bool {
        self.vectors.get().is_some()
    }

    /// Lexical index lifecycle
    pub fn lexical_status(&self) -> LexicalStatus {
        self.lexical.status()
    }

    /// Shared handle to the lexical adapter
    pub fn lexical(&self) -> Arc<LexicalIndex> {
        Arc::clone(&self.lexical)
    }

    /// Scoring rules
    pub fn scorer(&self) -> &HybridScorer {
        &self.scorer
    }

    /// Pick the strategy for one request
    pub fn select_method(&self, preferred: Option<SearchMethod>) -> SearchMethod {
        let lexical = self.lexical.is_available();
        let vector = self.vector_ready();

        match preferred {
            Some(SearchMethod::Lexical) if lexical => SearchMethod::Lexical,
            Some(SearchMethod::Vector) if vector => SearchMethod::Vector,
            _ if lexical => SearchMethod::Lexical,
            _ if vector => SearchMethod::Vector,
            _ => SearchMethod::Unavailable,
        }
    }

    /// Execute a search query
    ///
    /// Never fails: a degraded engine answers with an empty result list.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        preferred: Option<SearchMethod>,
    ) -> SearchOutcome {
        let method = self.select_method(preferred);
        let (results, degraded) = match method {
            SearchMethod::Lexical => match self.lexical_search(query, limit).await {
                Some(hits) => (hits, false),
                None => (Vec::new(), true),
            },
            SearchMethod::Vector => (self.vector_search(query, limit), false),
            SearchMethod::Unavailable => {
                warn!("Search requested but no retrieval method is ready");
                (Vec::new(), true)
            }
        };
        SearchOutcome {
            results,
            method,
            degraded,
        }
    }

    /// TF-IDF search with the exact-title boost
    ///
    /// The best `2 * limit` rows by cosine similarity are boosted, re-ranked
    /// and cut to `limit`.
    pub fn vector_search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let Some(space) = self.vectors.get() else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let config = self.scorer.config();
        let scores = space.search_scores(query);
        let mut pool: Vec<(usize, f32)> =
            vector::rank(&scores, limit.saturating_mul(2), config.search_min_score)
                .into_iter()
                .filter_map(|(idx, score)| {
                    let article = self.corpus.get(idx)?;
                    Some((idx, self.scorer.boost_title_match(query, &article.title, score)))
                })
                .collect();
        pool.sort_by(|a, b| b.1.total_cmp(&a.1));
        pool.truncate(limit);

        pool.into_iter()
            .filter_map(|(idx, score)| {
                let article = self.corpus.get(idx)?;
                Some(SearchHit {
                    title: article.title.clone(),
                    url: article.url.clone(),
                    score,
                    method: SearchMethod::Vector,
                    preview: Some(preview(article, config.preview_chars)),
                })
            })
            .collect()
    }

    /// BM25 search bounded by the lexical timeout
    ///
    /// `None` when the query failed or did not finish in time.
    async fn lexical_search(&self, query: &str, limit: usize) -> Option<Vec<SearchHit>> {
        let lexical = Arc::clone(&self.lexical);
        let text = query.to_string();
        let task = tokio::task::spawn_blocking(move || lexical.query(&text, limit));

        match tokio::time::timeout(self.lexical_timeout, task).await {
            Ok(Ok(Ok(hits))) => {
                debug!("Lexical search for {:?} returned {} hits", query, hits.len());
                Some(hits.into_iter().map(SearchHit::from).collect())
            }
            Ok(Ok(Err(e))) => {
                error!("Lexical search error: {}", e);
                None
            }
            Ok(Err(e)) => {
                error!("Lexical search task failed: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "Lexical search for {:?} timed out after {:?}",
                    query, self.lexical_timeout
                );
                None
            }
        }
    }
}

/// Leading `max_chars` characters of the content, with an ellipsis when cut
fn preview(article: &Article, max_chars: usize) -> String {
    let mut chars = article.content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{RawArticle, DEFAULT_PUBLIC_BASE_URL};
    use crate::lexical::{testing, LexicalConfig};
    use rstest::rstest;

    fn corpus() -> Corpus {
        Corpus::from_rows(
            vec![
                RawArticle::new("Intro to Graphs", "graph theory basics"),
                RawArticle::new("Graph Traversal", "BFS DFS graph traversal"),
                RawArticle::new("Cooking Pasta", "boil water add pasta"),
            ],
            DEFAULT_PUBLIC_BASE_URL,
        )
    }

    fn vector_engine() -> SearchEngine {
        let engine = SearchEngine::new(corpus(), LexicalIndex::disabled(), ScoringConfig::default());
        engine.build_vectors().unwrap();
        engine
    }

    #[rstest]
    #[case("lexical", SearchMethod::Lexical)]
    #[case("BM25", SearchMethod::Lexical)]
    #[case(" vector ", SearchMethod::Vector)]
    #[case("tfidf", SearchMethod::Vector)]
    fn test_method_parsing(#[case] input: &str, #[case] expected: SearchMethod) {
        assert_eq!(input.parse::<SearchMethod>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_method() {
        assert!("auto".parse::<SearchMethod>().is_err());
        assert!("unavailable".parse::<SearchMethod>().is_err());
    }

    #[test]
    fn test_method_serde_aliases() {
        let method: SearchMethod = serde_json::from_str("\"bm25\"").unwrap();
        assert_eq!(method, SearchMethod::Lexical);
        assert_eq!(serde_json::to_string(&SearchMethod::Vector).unwrap(), "\"vector\"");
    }

    #[tokio::test]
    async fn test_nothing_ready_is_unavailable() {
        let engine = SearchEngine::new(corpus(), LexicalIndex::disabled(), ScoringConfig::default());
        let outcome = engine.search("pasta", 5, None).await;

        assert_eq!(outcome.method, SearchMethod::Unavailable);
        assert!(outcome.results.is_empty());
        assert!(outcome.degraded);
    }

    #[tokio::test]
    async fn test_falls_back_to_vector() {
        let engine = vector_engine();
        let outcome = engine.search("pasta", 5, Some(SearchMethod::Lexical)).await;

        assert_eq!(outcome.method, SearchMethod::Vector);
        assert_eq!(outcome.results[0].title, "Cooking Pasta");
        assert_eq!(outcome.results[0].method, SearchMethod::Vector);
        assert!(!outcome.degraded);
    }

    #[test]
    fn test_title_boost_applied() {
        let engine = vector_engine();
        let space = engine.vectors().unwrap();
        let raw = space.search_scores("pasta")[2];

        let hits = engine.vector_search("pasta", 5);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - raw * 1.3).abs() < 1e-5);
    }

    #[test]
    fn test_preview() {
        let hits = vector_engine().vector_search("pasta", 5);
        assert_eq!(hits[0].preview.as_deref(), Some("boil water add pasta"));

        let article = Article {
            id: 0,
            title: "Long".to_string(),
            content: "é".repeat(250),
            url: String::new(),
        };
        let text = preview(&article, 200);
        assert_eq!(text.chars().count(), 203);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn test_vector_search_zero_limit() {
        assert!(vector_engine().vector_search("pasta", 0).is_empty());
    }

    #[tokio::test]
    async fn test_selection_policy_with_both_ready() {
        let dir = tempfile::tempdir().unwrap();
        testing::build_index(
            dir.path(),
            &[("./geek/cooking-pasta.html", "Cooking Pasta", "boil water add pasta")],
        );
        let lexical = LexicalIndex::new(LexicalConfig {
            index_paths: vec![dir.path().to_path_buf()],
            ..LexicalConfig::default()
        });

        let engine = SearchEngine::new(corpus(), lexical, ScoringConfig::default());
        engine.build_vectors().unwrap();
        assert_eq!(engine.select_method(None), SearchMethod::Vector);

        assert_eq!(engine.initialize_lexical(), LexicalStatus::Available);
        assert_eq!(engine.select_method(None), SearchMethod::Lexical);
        assert_eq!(engine.select_method(Some(SearchMethod::Vector)), SearchMethod::Vector);

        let outcome = engine.search("pasta", 5, None).await;
        assert_eq!(outcome.method, SearchMethod::Lexical);
        assert_eq!(outcome.results[0].title, "Cooking Pasta");
        assert_eq!(outcome.results[0].url, "https://www.geeksforgeeks.org/cooking-pasta/");
        assert!(outcome.results[0].preview.is_none());
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn test_lexical_timeout_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        testing::build_index(
            dir.path(),
            &[("./geek/cooking-pasta.html", "Cooking Pasta", "boil water add pasta")],
        );
        let lexical = LexicalIndex::new(LexicalConfig {
            index_paths: vec![dir.path().to_path_buf()],
            ..LexicalConfig::default()
        });

        let engine = SearchEngine::new(corpus(), lexical, ScoringConfig::default())
            .with_lexical_timeout(Duration::ZERO);
        assert_eq!(engine.initialize_lexical(), LexicalStatus::Available);

        let outcome = engine.search("pasta", 5, None).await;
        assert_eq!(outcome.method, SearchMethod::Lexical);
        assert!(outcome.results.is_empty());
        assert!(outcome.degraded);
    }

    #[test]
    fn test_build_vectors_is_idempotent() {
        let engine = vector_engine();
        assert!(engine.build_vectors().is_ok());
        assert!(engine.vector_ready());
    }
}
