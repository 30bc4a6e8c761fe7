// Hybrid Recommendations
//
// *La Recommandation* (The Recommendation) - Content and title similarity blend

use crate::corpus::Corpus;
use crate::ranking::{title_contains, Confidence};
use crate::search::SearchEngine;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Provenance label attached to every recommendation
pub const RECOMMENDATION_METHOD: &str = "Hybrid (Content + Title)";

/// How an input title was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// The input is a case-insensitive substring of the title
    Exact,
    /// Best whitespace-token overlap
    Fuzzy,
}

/// A corpus row resolved from free-text input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleMatch {
    /// Article id
    pub index: usize,

    /// Resolution strategy that succeeded
    pub kind: MatchKind,

    /// Shared token count (fuzzy matches only)
    pub overlap: usize,
}

/// Resolve input text to a single article
///
/// The first title containing the input wins. Otherwise the title sharing the
/// most whitespace-separated tokens wins, earliest first on ties. `None` when
/// nothing shares a token.
pub fn resolve_title(corpus: &Corpus, input: &str) -> Option<TitleMatch> {
    if let Some(article) = corpus.iter().find(|a| title_contains(&a.title, input)) {
        return Some(TitleMatch {
            index: article.id,
            kind: MatchKind::Exact,
            overlap: 0,
        });
    }

    let wanted: HashSet<String> = tokens(input);
    let mut best: Option<(usize, usize)> = None;
    for article in corpus.iter() {
        let overlap = tokens(&article.title).intersection(&wanted).count();
        if overlap > best.map_or(0, |(_, o)| o) {
            best = Some((article.id, overlap));
        }
    }

    best.map(|(index, overlap)| TitleMatch {
        index,
        kind: MatchKind::Fuzzy,
        overlap,
    })
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// One recommended article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Article title
    pub title: String,

    /// Public URL
    pub url: String,

    /// Blended score
    pub similarity_score: f32,

    /// Content similarity to the reference article
    pub content_score: f32,

    /// Title similarity to the reference article
    pub title_score: f32,

    /// Bucket of the blended score
    pub confidence: Confidence,

    /// Provenance label
    pub method: String,

    /// Weighting description
    pub weighting: String,
}

/// Recommendations for one input title
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecommendationSet {
    /// How the input was resolved, if it was
    pub matched: Option<TitleMatch>,

    /// Ranked recommendations
    pub items: Vec<Recommendation>,
}

impl SearchEngine {
    /// Recommend articles similar to `input_title`
    ///
    /// An unresolvable title or an engine without vector spaces yields an
    /// empty set.
    pub fn recommend(&self, input_title: &str, limit: usize) -> RecommendationSet {
        let Some(space) = self.vectors() else {
            return RecommendationSet::default();
        };

        let Some(matched) = resolve_title(self.corpus(), input_title) else {
            debug!("No title matched {:?}", input_title);
            return RecommendationSet::default();
        };

        let (Some(content), Some(title)) = (
            space.content_similarity().row(matched.index),
            space.title_similarity().row(matched.index),
        ) else {
            return RecommendationSet {
                matched: Some(matched),
                items: Vec::new(),
            };
        };

        let scorer = self.scorer();
        let mut scored: Vec<(usize, crate::ranking::HybridScore)> = content
            .iter()
            .zip(title)
            .enumerate()
            .filter(|&(idx, _)| idx != matched.index)
            .map(|(idx, (&c, &t))| (idx, scorer.score(c, t)))
            .collect();
        scored.sort_by(|a, b| b.1.hybrid.total_cmp(&a.1.hybrid));

        let min_score = scorer.config().recommend_min_score;
        let weighting = scorer.weighting_label();
        let items = scored
            .into_iter()
            .filter(|(_, score)| score.hybrid > min_score)
            .take(limit)
            .filter_map(|(idx, score)| {
                let article = self.corpus().get(idx)?;
                Some(Recommendation {
                    title: article.title.clone(),
                    url: article.url.clone(),
                    similarity_score: score.hybrid,
                    content_score: score.content,
                    title_score: score.title,
                    confidence: scorer.confidence(score.hybrid),
                    method: RECOMMENDATION_METHOD.to_string(),
                    weighting: weighting.clone(),
                })
            })
            .collect();

        RecommendationSet {
            matched: Some(matched),
            items,
        }
    }
}
