// Vector Space Builder
//
// *L'Espace* (The Space) - Search, content and title vector spaces for a corpus

use crate::corpus::Corpus;
use crate::tfidf::{self, FittedVectorizer, TfidfVectorizer, VectorizerConfig};
use crate::vector::{self, SimilarityMatrix, SparseVector};
use std::time::Instant;
use tracing::info;

/// One fitted vector space: vocabulary plus a vector per article
#[derive(Debug, Clone)]
pub struct FittedSpace {
    /// Vocabulary and IDF weights
    pub vectorizer: FittedVectorizer,

    /// Article vectors in corpus order
    pub vectors: Vec<SparseVector>,
}

impl FittedSpace {
    fn fit(
        name: &'static str,
        vectorizer: TfidfVectorizer,
        documents: &[String],
    ) -> Result<Self, Error> {
        let (vectorizer, vectors) = vectorizer
            .fit_transform(documents)
            .map_err(|source| Error::Vectorize { space: name, source })?;
        Ok(Self {
            vectorizer,
            vectors,
        })
    }

    /// Number of terms in this space
    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }
}

/// Vectorizer settings for each space
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceConfig {
    /// Combined title and content space
    pub search: VectorizerConfig,

    /// Content-only space
    pub content: VectorizerConfig,

    /// Title-only space
    pub title: VectorizerConfig,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            search: VectorizerConfig::search(),
            content: VectorizerConfig::content(),
            title: VectorizerConfig::title(),
        }
    }
}

/// All vector spaces derived from a corpus, plus recommendation matrices
#[derive(Debug, Clone)]
pub struct VectorSpace {
    search: FittedSpace,
    content: FittedSpace,
    title: FittedSpace,
    content_similarity: SimilarityMatrix,
    title_similarity: SimilarityMatrix,
}

impl VectorSpace {
    /// Build every space with the default settings
    pub fn build(corpus: &Corpus) -> Result<Self, Error> {
        Self::build_with(corpus, &SpaceConfig::default())
    }

    /// Build every space with custom settings
    pub fn build_with(corpus: &Corpus, config: &SpaceConfig) -> Result<Self, Error> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let start = Instant::now();

        let search_docs: Vec<String> = corpus
            .iter()
            .map(|a| format!("{} {}", a.title, a.content).to_lowercase())
            .collect();
        let content_docs: Vec<String> = corpus.iter().map(|a| a.content.clone()).collect();
        let title_docs: Vec<String> = corpus.iter().map(|a| a.title.clone()).collect();

        let search = FittedSpace::fit(
            "search",
            TfidfVectorizer::new(config.search.clone())
                .protect(title_docs.iter().map(String::as_str)),
            &search_docs,
        )?;
        let content = FittedSpace::fit(
            "content",
            TfidfVectorizer::new(config.content.clone()),
            &content_docs,
        )?;
        let title = FittedSpace::fit(
            "title",
            TfidfVectorizer::new(config.title.clone()),
            &title_docs,
        )?;

        let content_similarity = SimilarityMatrix::compute(&content.vectors);
        let title_similarity = SimilarityMatrix::compute(&title.vectors);

        info!(
            "Vector spaces built for {} articles in {:?} (search: {} terms, content: {} terms, title: {} terms)",
            corpus.len(),
            start.elapsed(),
            search.vocabulary_size(),
            content.vocabulary_size(),
            title.vocabulary_size()
        );

        Ok(Self {
            search,
            content,
            title,
            content_similarity,
            title_similarity,
        })
    }

    /// Cosine similarity of free text against every article's search vector
    pub fn search_scores(&self, query: &str) -> Vec<f32> {
        let query = self.search.vectorizer.transform(&query.to_lowercase());
        vector::similarities(&query, &self.search.vectors)
    }

    /// Combined title and content space
    pub fn search_space(&self) -> &FittedSpace {
        &self.search
    }

    /// Content-only space
    pub fn content_space(&self) -> &FittedSpace {
        &self.content
    }

    /// Title-only space
    pub fn title_space(&self) -> &FittedSpace {
        &self.title
    }

    /// Pairwise content similarity
    pub fn content_similarity(&self) -> &SimilarityMatrix {
        &self.content_similarity
    }

    /// Pairwise title similarity
    pub fn title_similarity(&self) -> &SimilarityMatrix {
        &self.title_similarity
    }

    /// Number of articles the spaces were built from
    pub fn len(&self) -> usize {
        self.search.vectors.len()
    }

    /// Whether the spaces hold no articles
    pub fn is_empty(&self) -> bool {
        self.search.vectors.is_empty()
    }
}

/// Vector space build errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nothing to build from
    #[error("Cannot build vector spaces from an empty corpus")]
    EmptyCorpus,

    /// One space could not be fitted
    #[error("Failed to build {space} space: {source}")]
    Vectorize {
        /// Which space failed
        space: &'static str,
        /// Underlying vectorizer error
        #[source]
        source: tfidf::Error,
    },
}
