// Hybrid scoring algorithm

use serde::{Deserialize, Serialize};

/// Tunable scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of content similarity in the hybrid score
    pub content_weight: f32,

    /// Weight of title similarity in the hybrid score
    pub title_weight: f32,

    /// Multiplier when the query appears verbatim in a title
    pub title_match_boost: f32,

    /// Vector search results must score above this
    pub search_min_score: f32,

    /// Recommendations must score above this
    pub recommend_min_score: f32,

    /// Lowest hybrid score rated high confidence
    pub high_confidence: f32,

    /// Lowest hybrid score rated medium confidence
    pub medium_confidence: f32,

    /// Characters of content shown with vector search results
    pub preview_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            content_weight: 0.8,
            title_weight: 0.2,
            title_match_boost: 1.3,
            search_min_score: 0.01,
            recommend_min_score: 0.1,
            high_confidence: 0.7,
            medium_confidence: 0.4,
            preview_chars: 200,
        }
    }
}

/// Blended recommendation score with its components
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct HybridScore {
    /// Weighted blend of the components
    pub hybrid: f32,

    /// Content similarity component
    pub content: f32,

    /// Title similarity component
    pub title: f32,
}

impl HybridScore {
    /// Get the overall score
    pub fn value(&self) -> f32 {
        self.hybrid
    }
}

/// Confidence bucket for a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Hybrid score at or above the high threshold
    High,
    /// Hybrid score at or above the medium threshold
    Medium,
    /// Anything lower
    Low,
}

/// Hybrid scorer combining content and title similarity
#[derive(Debug, Clone)]
pub struct HybridScorer {
    config: ScoringConfig,
}

impl HybridScorer {
    /// Create a scorer with the default weights
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    /// Create a scorer with custom constants
    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Set custom weights
    pub fn with_weights(mut self, content: f32, title: f32) -> Self {
        self.config.content_weight = content;
        self.config.title_weight = title;
        self
    }

    /// Calculate combined score
    pub fn score(&self, content: f32, title: f32) -> HybridScore {
        let hybrid = content * self.config.content_weight + title * self.config.title_weight;
        HybridScore {
            hybrid,
            content,
            title,
        }
    }

    /// Bucket a hybrid score
    pub fn confidence(&self, hybrid: f32) -> Confidence {
        if hybrid >= self.config.high_confidence {
            Confidence::High
        } else if hybrid >= self.config.medium_confidence {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Apply the exact-title boost when `query` appears in `title`
    pub fn boost_title_match(&self, query: &str, title: &str, score: f32) -> f32 {
        if title_contains(title, query) {
            score * self.config.title_match_boost
        } else {
            score
        }
    }

    /// Human-readable weighting, e.g. "80% content, 20% title"
    pub fn weighting_label(&self) -> String {
        format!(
            "{}% content, {}% title",
            (self.config.content_weight * 100.0).round() as i64,
            (self.config.title_weight * 100.0).round() as i64
        )
    }

    /// Active constants
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

impl Default for HybridScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive literal substring test
pub fn title_contains(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(&needle.to_lowercase())
}
