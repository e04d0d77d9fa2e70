use std::cell::Cell;

use wikirag_ai::corpus::CorpusSource;
use wikirag_ai::embeddings::{EmbedTask, Embedder};
use wikirag_ai::index::{IndexStore, VectorIndex};
use wikirag_ai::retrieve::Retriever;
use wikirag_core::domain::{DocumentChunk, TOP_K};
use wikirag_core::error::AppError;

struct CountABEmbedder {
    query_calls: Cell<usize>,
}

impl Embedder for CountABEmbedder {
    fn embed(&self, _model: &str, task: EmbedTask, input: &str) -> Result<Vec<f32>, AppError> {
        if task == EmbedTask::Query {
            self.query_calls.set(self.query_calls.get() + 1);
        }
        let a = input.chars().filter(|c| *c == 'a').count();
        let b = input.chars().filter(|c| *c == 'b').count();
        Ok(vec![a as f32, b as f32])
    }
}

struct TextsCorpus(Vec<DocumentChunk>);

impl CorpusSource for TextsCorpus {
    fn label(&self) -> String {
        "ab".to_string()
    }

    fn load(&self) -> Result<Vec<DocumentChunk>, AppError> {
        Ok(self.0.clone())
    }
}

fn build(texts: &[&str], embedder: &CountABEmbedder) -> (tempfile::TempDir, VectorIndex) {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = TextsCorpus(
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentChunk::new(format!("c{i}"), *t))
            .collect(),
    );
    let index = IndexStore::open(dir.path().to_path_buf())
        .build(&corpus, embedder, "mock")
        .expect("build");
    (dir, index)
}

fn embedder() -> CountABEmbedder {
    CountABEmbedder {
        query_calls: Cell::new(0),
    }
}

#[test]
fn returns_at_most_k_chunks_best_first() {
    let e = embedder();
    let (_dir, index) = build(
        &["aaaa", "aaab", "aabb", "abbb", "bbbb", "aaaaaab", "bbbbbba"],
        &e,
    );
    let retriever = Retriever::new(&index, &e);
    assert_eq!(retriever.top_k(), TOP_K);

    let hits = retriever.retrieve("aaaa").expect("retrieve");
    assert_eq!(hits.len(), TOP_K);
    assert_eq!(hits[0].id, "c0");
    assert!(hits.iter().all(|c| c.id != "c4"));
}

#[test]
fn small_index_returns_every_chunk() {
    let e = embedder();
    let (_dir, index) = build(&["ab", "ba"], &e);
    let hits = Retriever::new(&index, &e).retrieve("ab").expect("retrieve");
    // Equal scores keep corpus order.
    assert_eq!(
        hits.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["c0", "c1"]
    );
}

#[test]
fn empty_index_returns_nothing_without_embedding() {
    let e = embedder();
    let (_dir, index) = build(&[], &e);
    let hits = Retriever::new(&index, &e).retrieve("aaaa").expect("retrieve");
    assert!(hits.is_empty());
    assert_eq!(e.query_calls.get(), 0);
}

#[test]
fn blank_query_is_rejected() {
    let e = embedder();
    let (_dir, index) = build(&["ab"], &e);
    let err = Retriever::new(&index, &e).retrieve("   ").expect_err("blank");
    assert_eq!(err.code, "AI_RETRIEVAL_FAILED");
}

#[test]
fn custom_k_is_honoured() {
    let e = embedder();
    let (_dir, index) = build(&["a", "aa", "aaa", "b"], &e);
    let hits = Retriever::with_top_k(&index, &e, 1).retrieve("a").expect("retrieve");
    assert_eq!(hits.len(), 1);
}
