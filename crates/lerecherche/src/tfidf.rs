// TF-IDF Vectorizer
//
// *Le Poids* (The Weight) - Term frequency scaled by inverse document frequency

use crate::text::Analyzer;
use crate::vector::SparseVector;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Vectorizer settings
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerConfig {
    /// Smallest and largest n-gram length, inclusive
    pub ngram_range: (usize, usize),

    /// Terms must occur in at least this many documents
    pub min_df: usize,

    /// Terms must occur in at most this fraction of documents
    pub max_df: f32,

    /// Vocabulary cap, keeping the most frequent terms
    pub max_features: Option<usize>,

    /// Drop English stop words
    pub stop_words: bool,
}

impl VectorizerConfig {
    /// Combined title and content space used for direct search
    pub fn search() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.8,
            max_features: Some(3000),
            stop_words: true,
        }
    }

    /// Content-only space used for recommendations
    pub fn content() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.95,
            max_features: Some(5000),
            stop_words: true,
        }
    }

    /// Title-only space used for recommendations
    pub fn title() -> Self {
        Self {
            ngram_range: (1, 1),
            min_df: 1,
            max_df: 1.0,
            max_features: Some(1000),
            stop_words: true,
        }
    }

    fn analyzer(&self) -> Analyzer {
        Analyzer::new(self.ngram_range, self.stop_words)
    }
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 1),
            min_df: 1,
            max_df: 1.0,
            max_features: None,
            stop_words: true,
        }
    }
}

/// Unfitted vectorizer
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,

    /// Terms exempt from the `min_df` cutoff
    protected: HashSet<String>,
}

impl TfidfVectorizer {
    /// Create a vectorizer
    pub fn new(config: VectorizerConfig) -> Self {
        Self {
            config,
            protected: HashSet::new(),
        }
    }

    /// Keep every term these texts produce, however rare
    ///
    /// Texts are analyzed with the same settings as the documents. The
    /// `max_df` cutoff and the vocabulary cap still apply.
    pub fn protect<'a>(mut self, texts: impl IntoIterator<Item = &'a str>) -> Self {
        let analyzer = self.config.analyzer();
        for text in texts {
            self.protected.extend(analyzer.analyze(text));
        }
        self
    }

    /// Learn the vocabulary and IDF weights, returning every document's vector
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> Result<(FittedVectorizer, Vec<SparseVector>), Error> {
        if documents.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let analyzer = self.config.analyzer();
        let counts: Vec<HashMap<String, u32>> = documents
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for term in analyzer.analyze(doc.as_ref()) {
                    *tf.entry(term).or_insert(0u32) += 1;
                }
                tf
            })
            .collect();

        // term -> (document frequency, total frequency)
        let mut stats: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
        for tf in &counts {
            for (term, &count) in tf {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u64::from(count);
            }
        }
        if stats.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let n_docs = documents.len();
        let max_doc_count = self.config.max_df * n_docs as f32;
        if max_doc_count < self.config.min_df as f32 {
            return Err(Error::InvalidDocumentFrequency {
                min_df: self.config.min_df,
                max_df: self.config.max_df,
                documents: n_docs,
            });
        }

        let mut kept: Vec<(&str, usize, u64)> = stats
            .into_iter()
            .filter(|&(term, (df, _))| {
                df as f32 <= max_doc_count
                    && (df >= self.config.min_df || self.protected.contains(term))
            })
            .map(|(term, (df, total))| (term, df, total))
            .collect();

        if let Some(cap) = self.config.max_features {
            if kept.len() > cap {
                kept.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));
                kept.truncate(cap);
                kept.sort_by(|a, b| a.0.cmp(b.0));
            }
        }
        if kept.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut terms = Vec::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (term, df, _)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), index);
            terms.push(term.to_string());
            idf.push(((1.0 + n_docs as f32) / (1.0 + df as f32)).ln() + 1.0);
        }

        let fitted = FittedVectorizer {
            analyzer,
            vocabulary,
            terms,
            idf,
            documents: n_docs,
        };

        let vectors = counts.iter().map(|tf| fitted.weigh(tf)).collect();
        Ok((fitted, vectors))
    }
}

/// Vocabulary and IDF weights learned from a corpus
#[derive(Debug, Clone)]
pub struct FittedVectorizer {
    analyzer: Analyzer,
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f32>,
    documents: usize,
}

impl FittedVectorizer {
    /// Vectorize new text against the fitted vocabulary
    ///
    /// Out-of-vocabulary terms contribute nothing; text with no known terms
    /// yields the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut tf: HashMap<String, u32> = HashMap::new();
        for term in self.analyzer.analyze(text) {
            if self.vocabulary.contains_key(&term) {
                *tf.entry(term).or_insert(0) += 1;
            }
        }
        self.weigh(&tf)
    }

    fn weigh(&self, tf: &HashMap<String, u32>) -> SparseVector {
        let pairs = tf
            .iter()
            .filter_map(|(term, &count)| {
                self.vocabulary
                    .get(term)
                    .map(|&idx| (idx, count as f32 * self.idf[idx]))
            })
            .collect();
        SparseVector::from_pairs(pairs).normalized()
    }

    /// Number of terms in the vocabulary
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Vocabulary in index order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Index of a term, if it survived pruning
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// IDF weight of a term index
    pub fn idf(&self, index: usize) -> Option<f32> {
        self.idf.get(index).copied()
    }

    /// Number of documents the vectorizer was fitted on
    pub fn document_count(&self) -> usize {
        self.documents
    }
}

/// Vectorizer errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// No documents to fit
    #[error("Cannot fit a vectorizer on an empty corpus")]
    EmptyCorpus,

    /// Every term was a stop word or pruned away
    #[error("No terms remain after pruning")]
    EmptyVocabulary,

    /// `max_df` admits fewer documents than `min_df` requires
    #[error("max_df {max_df} over {documents} documents is below min_df {min_df}")]
    InvalidDocumentFrequency {
        /// Configured minimum document count
        min_df: usize,
        /// Configured maximum document fraction
        max_df: f32,
        /// Corpus size
        documents: usize,
    },
}
