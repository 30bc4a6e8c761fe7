// Lexical Index Adapter
//
// *Le Lexique* (The Lexicon) - BM25 retrieval over a prebuilt on-disk index

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, FieldType, Value};
use tantivy::{DocAddress, Index, IndexReader, ReloadPolicy, Searcher, TantivyDocument};
use tracing::{debug, info, warn};

use crate::corpus::DEFAULT_PUBLIC_BASE_URL;

/// Stored field holding the source file path
pub const FILENAME_FIELD: &str = "filename";

/// Optional stored field holding the article title
pub const TITLE_FIELD: &str = "title";

/// Marker file present in every index directory
const META_FILE: &str = "meta.json";

/// Where to find the index and how to turn its paths into URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// Candidate index directories, tried in order
    pub index_paths: Vec<PathBuf>,

    /// Local directory prefix stripped from stored filenames
    pub path_prefix: String,

    /// Base of every synthesized public URL
    pub public_base_url: String,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            index_paths: vec![
                PathBuf::from("./data/article_index"),
                PathBuf::from("data/article_index"),
                PathBuf::from("../data/article_index"),
            ],
            path_prefix: "./geek/".to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }
}

/// Lifecycle of the lexical index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexicalStatus {
    /// `initialize` has not finished yet
    Initializing,
    /// Index opened and queryable
    Available,
    /// No usable index for this process lifetime
    Unavailable,
}

/// One ranked hit from the lexical index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalHit {
    /// Stored title, or the filename when the index has none
    pub title: String,

    /// Public URL derived from the stored filename
    pub url: String,

    /// BM25 score
    pub score: f32,
}

struct LoadedIndex {
    path: PathBuf,
    reader: IndexReader,
    parser: QueryParser,
    filename: Field,
    title: Option<Field>,
}

/// Adapter over an external BM25 index
///
/// The index is opened at most once. Until `initialize` completes the
/// adapter reports `Initializing`; afterwards it is permanently either
/// `Available` or `Unavailable`.
pub struct LexicalIndex {
    config: LexicalConfig,
    state: OnceCell<Option<LoadedIndex>>,
}

impl LexicalIndex {
    /// Create an adapter; nothing is opened until `initialize`
    pub fn new(config: LexicalConfig) -> Self {
        Self {
            config,
            state: OnceCell::new(),
        }
    }

    /// Create an adapter that is already unavailable
    pub fn disabled() -> Self {
        let index = Self::new(LexicalConfig {
            index_paths: Vec::new(),
            ..LexicalConfig::default()
        });
        let _ = index.state.set(None);
        index
    }

    /// Open the first candidate index directory that exists
    ///
    /// Idempotent: later calls return the status reached by the first one.
    /// Blocks on disk I/O, so async callers should run it on a blocking task.
    pub fn initialize(&self) -> LexicalStatus {
        self.state.get_or_init(|| self.open_first());
        self.status()
    }

    /// Current status
    pub fn status(&self) -> LexicalStatus {
        match self.state.get() {
            None => LexicalStatus::Initializing,
            Some(Some(_)) => LexicalStatus::Available,
            Some(None) => LexicalStatus::Unavailable,
        }
    }

    /// Whether queries can be served
    pub fn is_available(&self) -> bool {
        self.status() == LexicalStatus::Available
    }

    /// Directory the index was opened from
    pub fn index_path(&self) -> Option<&Path> {
        self.loaded().map(|loaded| loaded.path.as_path())
    }

    /// Run a BM25 query
    ///
    /// Rows whose stored fields cannot be read are logged and skipped.
    pub fn query(&self, text: &str, limit: usize) -> Result<Vec<LexicalHit>, Error> {
        let loaded = self.loaded().ok_or(Error::Unavailable)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let (query, errors) = loaded.parser.parse_query_lenient(text);
        if !errors.is_empty() {
            debug!("Lenient parse of {:?} ignored {} error(s)", text, errors.len());
        }

        let searcher = loaded.reader.searcher();
        let top_docs = searcher.search(&*query, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (rank, (score, address)) in top_docs.into_iter().enumerate() {
            match self.map_hit(loaded, &searcher, address, score) {
                Ok(hit) => hits.push(hit),
                Err(e) => warn!("Skipping lexical result {}: {}", rank, e),
            }
        }
        Ok(hits)
    }

    fn loaded(&self) -> Option<&LoadedIndex> {
        self.state.get().and_then(Option::as_ref)
    }

    fn map_hit(
        &self,
        loaded: &LoadedIndex,
        searcher: &Searcher,
        address: DocAddress,
        score: f32,
    ) -> Result<LexicalHit, Error> {
        let doc: TantivyDocument = searcher.doc(address)?;

        let filename = doc
            .get_first(loaded.filename)
            .and_then(|v| v.as_str())
            .ok_or(Error::MissingField(FILENAME_FIELD))?;

        let title = loaded
            .title
            .and_then(|field| doc.get_first(field))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(filename)
            .trim()
            .to_string();

        Ok(LexicalHit {
            title,
            url: public_url(
                &self.config.public_base_url,
                &self.config.path_prefix,
                filename,
            ),
            score,
        })
    }

    fn open_first(&self) -> Option<LoadedIndex> {
        info!("Initializing lexical index...");
        for candidate in &self.config.index_paths {
            if !candidate.join(META_FILE).is_file() {
                debug!("No lexical index at {}", candidate.display());
                continue;
            }
            return match open_index(candidate) {
                Ok(loaded) => {
                    info!("Lexical index loaded from {}", candidate.display());
                    Some(loaded)
                }
                Err(e) => {
                    warn!(
                        "Lexical index at {} could not be opened: {}",
                        candidate.display(),
                        e
                    );
                    None
                }
            };
        }
        warn!(
            "Lexical index not found. Tried paths: {:?}",
            self.config.index_paths
        );
        None
    }
}

fn open_index(path: &Path) -> Result<LoadedIndex, Error> {
    let index = Index::open_in_dir(path)?;
    let schema = index.schema();

    let filename = schema
        .get_field(FILENAME_FIELD)
        .map_err(|_| Error::MissingField(FILENAME_FIELD))?;
    let title = schema.get_field(TITLE_FIELD).ok();

    let text_fields: Vec<Field> = schema
        .fields()
        .filter(|(_, entry)| {
            matches!(entry.field_type(), FieldType::Str(options)
                if options.get_indexing_options().is_some())
        })
        .map(|(field, _)| field)
        .collect();
    if text_fields.is_empty() {
        return Err(Error::NoTextFields);
    }

    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;
    let parser = QueryParser::for_index(&index, text_fields);

    Ok(LoadedIndex {
        path: path.to_path_buf(),
        reader,
        parser,
        filename,
        title,
    })
}

/// Turn a stored local filename into a public URL
///
/// Strips the local prefix, then a trailing `index.html`, then a trailing
/// `.html`, then trailing slashes.
pub fn public_url(base: &str, prefix: &str, filename: &str) -> String {
    let path = filename.strip_prefix(prefix).unwrap_or(filename);
    let path = path.strip_suffix("index.html").unwrap_or(path);
    let path = path.strip_suffix(".html").unwrap_or(path);
    let path = path.trim_end_matches('/');
    format!("{}{}/", base, path)
}

/// Lexical index errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The index is not (or not yet) open
    #[error("Lexical index is unavailable")]
    Unavailable,

    /// A required stored field is missing
    #[error("Lexical index document is missing field: {0}")]
    MissingField(&'static str),

    /// The schema has nothing to search
    #[error("Lexical index has no indexed text fields")]
    NoTextFields,

    /// Underlying index failure
    #[error("Lexical index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn adapter(paths: Vec<PathBuf>) -> LexicalIndex {
        LexicalIndex::new(LexicalConfig {
            index_paths: paths,
            ..LexicalConfig::default()
        })
    }

    #[rstest]
    #[case("./geek/binary-search/index.html", "https://x.org/binary-search/")]
    #[case("./geek/heap-sort.html", "https://x.org/heap-sort/")]
    #[case("./geek/tries/", "https://x.org/tries/")]
    #[case("other/graphs.html", "https://x.org/other/graphs/")]
    fn test_public_url(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(public_url("https://x.org/", "./geek/", filename), expected);
    }

    #[test]
    fn test_missing_index_is_unavailable() {
        let index = adapter(vec![PathBuf::from("/nonexistent/index")]);
        assert_eq!(index.status(), LexicalStatus::Initializing);
        assert_eq!(index.initialize(), LexicalStatus::Unavailable);
        assert!(matches!(index.query("graphs", 5), Err(Error::Unavailable)));
    }

    #[test]
    fn test_disabled() {
        let index = LexicalIndex::disabled();
        assert_eq!(index.status(), LexicalStatus::Unavailable);
        assert_eq!(index.initialize(), LexicalStatus::Unavailable);
    }

    #[test]
    fn test_first_existing_index_wins() {
        let dir = tempfile::tempdir().unwrap();
        testing::build_index(
            dir.path(),
            &[
                ("./geek/graph-traversal/index.html", "Graph Traversal", "bfs dfs graph"),
                ("./geek/cooking-pasta.html", "", "boil water add pasta"),
            ],
        );

        let index = adapter(vec![dir.path().join("missing"), dir.path().to_path_buf()]);
        assert_eq!(index.initialize(), LexicalStatus::Available);
        assert_eq!(index.index_path(), Some(dir.path()));

        let hits = index.query("pasta", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "./geek/cooking-pasta.html");
        assert_eq!(hits[0].url, "https://www.geeksforgeeks.org/cooking-pasta/");
        assert!(hits[0].score > 0.0);

        let hits = index.query("graph", 5).unwrap();
        assert_eq!(hits[0].title, "Graph Traversal");
        assert_eq!(hits[0].url, "https://www.geeksforgeeks.org/graph-traversal/");

        assert!(index.query("graph", 0).unwrap().is_empty());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let index = adapter(vec![dir.path().to_path_buf()]);
        assert_eq!(index.initialize(), LexicalStatus::Unavailable);

        // An index appearing later is not picked up
        testing::build_index(dir.path(), &[("a.html", "A", "alpha")]);
        assert_eq!(index.initialize(), LexicalStatus::Unavailable);
    }

    #[test]
    fn test_malformed_query_is_lenient() {
        let dir = tempfile::tempdir().unwrap();
        testing::build_index(dir.path(), &[("./geek/a.html", "Alpha", "alpha beta")]);

        let index = adapter(vec![dir.path().to_path_buf()]);
        index.initialize();
        assert!(index.query("alpha AND (", 5).is_ok());
    }

    #[test]
    fn test_unmappable_row_is_skipped() {
        use tantivy::doc;
        use tantivy::schema::{Schema, STORED, STRING, TEXT};

        let dir = tempfile::tempdir().unwrap();
        let mut builder = Schema::builder();
        let filename = builder.add_text_field(FILENAME_FIELD, STRING | STORED);
        let title = builder.add_text_field(TITLE_FIELD, TEXT | STORED);
        let index = Index::create_in_dir(dir.path(), builder.build()).unwrap();

        let mut writer = index.writer_with_num_threads(1, 50_000_000).unwrap();
        writer.add_document(doc!(title => "pasta one")).unwrap();
        writer
            .add_document(doc!(filename => "./geek/pasta-two.html", title => "pasta two"))
            .unwrap();
        writer.commit().unwrap();

        let adapter = adapter(vec![dir.path().to_path_buf()]);
        assert_eq!(adapter.initialize(), LexicalStatus::Available);

        let hits = adapter.query("pasta", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "pasta two");
        assert_eq!(hits[0].url, "https://www.geeksforgeeks.org/pasta-two/");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LexicalStatus::Initializing).unwrap(),
            "\"initializing\""
        );
    }
}
