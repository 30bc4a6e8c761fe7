// End-to-end retrieval over a small article corpus

use lerecherche::corpus::DEFAULT_PUBLIC_BASE_URL;
use lerecherche::lexical::{FILENAME_FIELD, TITLE_FIELD};
use lerecherche::{
    Confidence, Corpus, LexicalConfig, LexicalIndex, LexicalStatus, MatchKind, RawArticle,
    ScoringConfig, SearchEngine, SearchMethod,
};
use std::collections::HashSet;
use std::path::Path;
use tantivy::doc;
use tantivy::schema::{Schema, STORED, STRING, TEXT};
use tantivy::Index;

fn articles() -> Corpus {
    Corpus::from_rows(
        vec![
            RawArticle::new("Intro to Graphs", "graph theory basics"),
            RawArticle::new("Graph Traversal", "BFS DFS graph traversal"),
            RawArticle::new("Cooking Pasta", "boil water add pasta"),
        ],
        DEFAULT_PUBLIC_BASE_URL,
    )
}

fn vector_only_engine() -> SearchEngine {
    let engine = SearchEngine::new(articles(), LexicalIndex::disabled(), ScoringConfig::default());
    engine.build_vectors().expect("vector spaces");
    engine
}

fn write_index(dir: &Path) {
    let mut builder = Schema::builder();
    let filename = builder.add_text_field(FILENAME_FIELD, STRING | STORED);
    let title = builder.add_text_field(TITLE_FIELD, TEXT | STORED);
    let content = builder.add_text_field("content", TEXT);
    let index = Index::create_in_dir(dir, builder.build()).expect("create index");

    let mut writer = index.writer_with_num_threads(1, 50_000_000).expect("writer");
    writer
        .add_document(doc!(
            filename => "./geek/intro-to-graphs/index.html",
            title => "Intro to Graphs",
            content => "graph theory basics"
        ))
        .expect("add");
    writer
        .add_document(doc!(
            filename => "./geek/graph-traversal/index.html",
            title => "Graph Traversal",
            content => "BFS DFS graph traversal"
        ))
        .expect("add");
    writer
        .add_document(doc!(
            filename => "./geek/cooking-pasta.html",
            title => "Cooking Pasta",
            content => "boil water add pasta"
        ))
        .expect("add");
    writer.commit().expect("commit");
}

#[test]
fn test_recommend_ranks_related_article_first() {
    let engine = vector_only_engine();
    let set = engine.recommend("Intro to Graphs", 2);

    let matched = set.matched.expect("title resolves");
    assert_eq!(matched.index, 0);
    assert_eq!(matched.kind, MatchKind::Exact);

    assert_eq!(set.items[0].title, "Graph Traversal");
    assert_eq!(set.items[0].confidence, Confidence::High);
    if let Some(pasta) = set.items.iter().position(|r| r.title == "Cooking Pasta") {
        assert!(pasta > 0);
    }
}

#[test]
fn test_recommendations_are_consistent() {
    let engine = vector_only_engine();
    for title in ["Intro to Graphs", "Graph Traversal", "Cooking Pasta", "graphs intro"] {
        let set = engine.recommend(title, 6);
        let reference = set.matched.map(|m| engine.corpus().get(m.index).unwrap().title.clone());

        let mut seen = HashSet::new();
        for rec in &set.items {
            assert_ne!(Some(&rec.title), reference.as_ref());
            assert!(seen.insert(rec.title.clone()), "duplicate {}", rec.title);
            let blend = 0.8 * rec.content_score + 0.2 * rec.title_score;
            assert!((rec.similarity_score - blend).abs() < 1e-6);
        }
    }
}

#[tokio::test]
async fn test_search_falls_back_to_vector() {
    let engine = vector_only_engine();
    assert_eq!(engine.lexical_status(), LexicalStatus::Unavailable);

    let outcome = engine.search("pasta", 5, None).await;
    assert_eq!(outcome.method, SearchMethod::Vector);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].title, "Cooking Pasta");
    assert_eq!(
        outcome.results[0].url,
        "https://www.geeksforgeeks.org/cooking-pasta/"
    );
}

#[tokio::test]
async fn test_title_substring_boost() {
    let engine = vector_only_engine();
    let raw = engine.vectors().unwrap().search_scores("graph traversal");

    let outcome = engine.search("graph traversal", 5, Some(SearchMethod::Vector)).await;
    let top = &outcome.results[0];
    assert_eq!(top.title, "Graph Traversal");
    assert!(top.score >= raw[1] * 1.3 - 1e-5);
}

#[tokio::test]
async fn test_lexical_index_becomes_available() {
    let dir = tempfile::tempdir().unwrap();
    write_index(dir.path());

    let lexical = LexicalIndex::new(LexicalConfig {
        index_paths: vec![dir.path().join("absent"), dir.path().to_path_buf()],
        ..LexicalConfig::default()
    });
    let engine = SearchEngine::new(articles(), lexical, ScoringConfig::default());
    engine.build_vectors().unwrap();

    let before = engine.search("pasta", 5, None).await;
    assert_eq!(before.method, SearchMethod::Vector);

    let lexical = engine.lexical();
    let status = tokio::task::spawn_blocking(move || lexical.initialize())
        .await
        .unwrap();
    assert_eq!(status, LexicalStatus::Available);

    let after = engine.search("graph", 5, None).await;
    assert_eq!(after.method, SearchMethod::Lexical);
    assert_eq!(after.results.len(), 2);
    let urls: HashSet<_> = after.results.iter().map(|h| h.url.as_str()).collect();
    assert!(urls.contains("https://www.geeksforgeeks.org/graph-traversal/"));
    assert!(urls.contains("https://www.geeksforgeeks.org/intro-to-graphs/"));

    let forced = engine.search("pasta", 5, Some(SearchMethod::Vector)).await;
    assert_eq!(forced.method, SearchMethod::Vector);
    assert_eq!(forced.results[0].title, "Cooking Pasta");
}
