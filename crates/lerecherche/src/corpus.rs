// Article Corpus
//
// *Le Corpus* (The Corpus) - Deduplicated, read-only article table

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default base used when a row carries no URL
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://www.geeksforgeeks.org/";

/// Placeholder the scraper writes for documents without a canonical URL
const URL_PLACEHOLDER: &str = "N/A";

/// A single article, immutable once the corpus is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Ordinal position in the deduplicated table
    pub id: usize,

    /// Trimmed, unique title
    pub title: String,

    /// Trimmed body text (may be empty)
    pub content: String,

    /// Public URL, synthesized from the title when the source had none
    pub url: String,
}

/// Row as it appears in the corpus file, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArticle {
    /// Title column
    pub title: Option<String>,

    /// Content column
    pub content: Option<String>,

    /// Optional URL column
    pub url: Option<String>,
}

impl RawArticle {
    /// Convenience constructor for in-memory rows
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            url: None,
        }
    }

    /// Attach a URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// The article table
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    articles: Vec<Article>,
}

impl Corpus {
    /// Build a corpus from raw rows
    ///
    /// Rows without a title are dropped, titles and content are trimmed,
    /// the first occurrence of a title wins and ids are reassigned in order.
    pub fn from_rows(rows: impl IntoIterator<Item = RawArticle>, public_base_url: &str) -> Self {
        let mut seen = HashSet::new();
        let mut articles = Vec::new();

        for row in rows {
            let title = match row.title.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => continue,
            };

            if !seen.insert(title.clone()) {
                continue;
            }

            let content = row
                .content
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string();

            let url = match row.url.as_deref().map(str::trim) {
                Some(u) if !u.is_empty() && u != URL_PLACEHOLDER => u.to_string(),
                _ => synthesize_url(public_base_url, &title),
            };

            articles.push(Article {
                id: articles.len(),
                title,
                content,
                url,
            });
        }

        Self { articles }
    }

    /// Load a CSV corpus file
    ///
    /// The file must have `title` and `content` columns; `url` is optional.
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    pub fn load(path: impl AsRef<Path>, public_base_url: &str) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let headers = reader.byte_headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| String::from_utf8_lossy(h).trim().eq_ignore_ascii_case(name))
        };

        let title_col = column("title").ok_or(Error::MissingColumn("title"))?;
        let content_col = column("content").ok_or(Error::MissingColumn("content"))?;
        let url_col = column("url");

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let field = |idx: usize| {
                record
                    .get(idx)
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            };
            rows.push(RawArticle {
                title: field(title_col),
                content: field(content_col),
                url: url_col.and_then(field),
            });
        }

        let raw_count = rows.len();
        let corpus = Self::from_rows(rows, public_base_url);
        info!(
            "Loaded {} articles from {} ({} rows before deduplication)",
            corpus.len(),
            path.display(),
            raw_count
        );
        Ok(corpus)
    }

    /// Load the first candidate path that exists
    ///
    /// Returns the corpus together with the path it was read from.
    pub fn discover(
        candidates: &[PathBuf],
        public_base_url: &str,
    ) -> Result<(Self, PathBuf), Error> {
        for candidate in candidates {
            if candidate.is_file() {
                info!("Found corpus file at: {}", candidate.display());
                let corpus = Self::load(candidate, public_base_url)?;
                return Ok((corpus, candidate.clone()));
            }
            debug!("No corpus at {}", candidate.display());
        }

        Err(Error::NotFound {
            tried: candidates.to_vec(),
        })
    }

    /// Number of articles
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the corpus has no articles
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Article at an ordinal position
    pub fn get(&self, id: usize) -> Option<&Article> {
        self.articles.get(id)
    }

    /// All articles in corpus order
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Iterate articles in corpus order
    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter()
    }
}

/// Derive a stable public URL from a title
pub fn synthesize_url(public_base_url: &str, title: &str) -> String {
    let slug = title.to_lowercase().replace(' ', "-");
    format!("{}{}/", public_base_url, slug)
}

/// Corpus loading errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No candidate path exists
    #[error("Corpus file not found. Tried paths: {tried:?}")]
    NotFound {
        /// Every path that was checked, in order
        tried: Vec<PathBuf>,
    },

    /// A required column is absent from the header row
    #[error("Corpus is missing required column: {0}")]
    MissingColumn(&'static str),

    /// The file could not be read or parsed
    #[error("Failed to read corpus: {0}")]
    Csv(#[from] csv::Error),
}
