// lerecherche - Hybrid Article Retrieval
//
// *La Recherche* (The Search) - TF-IDF vector search, BM25 lexical search and
// content/title recommendations over a fixed article corpus

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Article table loading and normalization
pub mod corpus;

/// Tokenization and n-gram analysis
pub mod text;

/// TF-IDF vectorizer
pub mod tfidf;

/// Sparse vectors, cosine similarity and ranking
pub mod vector;

/// Search, content and title vector spaces
pub mod space;

/// Scoring constants and the hybrid scorer
pub mod ranking;

/// BM25 adapter over an on-disk index
pub mod lexical;

/// Retrieval coordinator
pub mod search;

/// Title resolution and recommendations
pub mod recommend;

pub use corpus::{Article, Corpus, RawArticle};
pub use lexical::{LexicalConfig, LexicalHit, LexicalIndex, LexicalStatus};
pub use ranking::{Confidence, HybridScore, HybridScorer, ScoringConfig};
pub use recommend::{resolve_title, MatchKind, Recommendation, RecommendationSet, TitleMatch};
pub use search::{SearchEngine, SearchHit, SearchMethod, SearchOutcome};
pub use space::VectorSpace;
