use std::cell::{Cell, RefCell};

use pretty_assertions::assert_eq;
use wikirag_ai::corpus::CorpusSource;
use wikirag_ai::embeddings::{EmbedTask, Embedder};
use wikirag_ai::index::{IndexStore, VectorIndex};
use wikirag_ai::llm::{ChatRequest, Llm};
use wikirag_ai::pipeline::AnswerPipeline;
use wikirag_ai::prompts::PromptBuilder;
use wikirag_ai::retrieve::Retriever;
use wikirag_ai::rewrite::QueryRewriter;
use wikirag_core::domain::{ConversationTurn, DocumentChunk, PromptLanguage};
use wikirag_core::error::AppError;
use wikirag_core::memory::ConversationMemory;

/// Bag-of-words hashing embedder.
struct WordsEmbedder;

impl Embedder for WordsEmbedder {
    fn embed(&self, _model: &str, _task: EmbedTask, input: &str) -> Result<Vec<f32>, AppError> {
        let mut v = vec![0.0f32; 32];
        for word in input
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            let slot = hash % 32;
            v[slot] += 1.0;
        }
        v[31] += 0.01;
        Ok(v)
    }
}

struct TestCorpus(Vec<DocumentChunk>);

impl CorpusSource for TestCorpus {
    fn label(&self) -> String {
        "pipeline-test".to_string()
    }

    fn load(&self) -> Result<Vec<DocumentChunk>, AppError> {
        Ok(self.0.clone())
    }
}

fn build_index(chunks: Vec<DocumentChunk>) -> (tempfile::TempDir, VectorIndex) {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = IndexStore::open(dir.path().join("wiki_index"))
        .build_or_load(&TestCorpus(chunks), &WordsEmbedder, "mock-embed")
        .expect("index");
    (dir, index)
}

fn between<'t>(text: &'t str, start: &str, end: &str) -> &'t str {
    let from = text.find(start).map(|i| i + start.len()).unwrap_or(0);
    let to = text[from..].find(end).map(|i| from + i).unwrap_or(text.len());
    &text[from..to]
}

/// A chat model that follows the system rules it is given, and knows a
/// handful of facts it may only state when the context supports them.
struct FaithfulChat {
    facts: Vec<(&'static str, &'static str)>,
    requests: RefCell<Vec<(String, String, Vec<ConversationTurn>)>>,
}

impl FaithfulChat {
    fn new() -> Self {
        Self {
            facts: vec![("capital of France", "Paris is the capital of France.")],
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Llm for FaithfulChat {
    fn generate(&self, _model: &str, req: &ChatRequest<'_>) -> Result<String, AppError> {
        self.requests.borrow_mut().push((
            req.system.to_string(),
            req.human.to_string(),
            req.history.to_vec(),
        ));

        let question = between(req.human, "Question: ", "\nAnswer:").trim();
        let bare = question.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if req.system.contains(&format!("“{bare}”"))
            && req.system.contains("How can I help you?")
        {
            return Ok("Hello! How can I help you?".to_string());
        }

        let context = between(req.human, "CONTEXT:\n", "\nQuestion:");
        for (needle, answer) in &self.facts {
            if context.contains(needle) {
                return Ok(answer.to_string());
            }
        }
        if req.system.contains("reply only “I don't know”") {
            return Ok("I don't know".to_string());
        }
        Ok("Probably something.".to_string())
    }
}

struct FailingChat;

impl Llm for FailingChat {
    fn generate(&self, _model: &str, _req: &ChatRequest<'_>) -> Result<String, AppError> {
        Err(AppError::new("AI_CHAT_FAILED", "Request rejected by the API")
            .with_details("status=403"))
    }
}

fn paris_corpus() -> Vec<DocumentChunk> {
    vec![DocumentChunk::new("1", "Paris is the capital of France.")]
}

#[test]
fn answers_from_retrieved_context_and_returns_its_sources() {
    let (_dir, index) = build_index(paris_corpus());
    let chat = FaithfulChat::new();
    let retriever = Retriever::with_top_k(&index, &WordsEmbedder, 1);
    let mut pipeline = AnswerPipeline::new(retriever, &chat, "stub");

    let res = pipeline.answer("What is the capital of France?").expect("answer");
    assert!(res.answer.contains("Paris"));
    assert_eq!(res.answer.matches('.').count(), 1);
    assert_eq!(res.source_chunks, paris_corpus());

    let requests = chat.requests.borrow();
    assert_eq!(
        requests[0].1,
        "CONTEXT:\nParis is the capital of France.\nQuestion: What is the capital of France?\nAnswer:"
    );
}

#[test]
fn greeting_gets_a_greeting_and_no_context() {
    let (_dir, index) = build_index(paris_corpus());
    let chat = FaithfulChat::new();
    let mut pipeline = AnswerPipeline::new(Retriever::new(&index, &WordsEmbedder), &chat, "stub");

    for greeting in PromptBuilder::default().greetings() {
        let res = pipeline.answer(greeting).expect("answer");
        assert!(res.answer.contains("How can I help you?"), "{greeting}");
        assert!(!res.answer.contains("Paris"), "{greeting}");
    }
}

#[test]
fn unsupported_question_yields_exactly_the_unknown_token() {
    let chunks = (1..=5)
        .map(|i| {
            DocumentChunk::new(
                i.to_string(),
                format!("Chunk {i} is about rivers and mountains."),
            )
        })
        .collect();
    let (_dir, index) = build_index(chunks);
    let chat = FaithfulChat::new();
    let mut pipeline = AnswerPipeline::new(Retriever::new(&index, &WordsEmbedder), &chat, "stub");

    let res = pipeline.answer("What is the capital of Peru?").expect("answer");
    assert_eq!(res.source_chunks.len(), 5);
    assert_eq!(res.answer, PromptBuilder::default().unknown_answer());
}

#[test]
fn each_answer_appends_one_turn_in_order_and_history_reaches_the_model() {
    let (_dir, index) = build_index(paris_corpus());
    let chat = FaithfulChat::new();
    let mut pipeline = AnswerPipeline::new(Retriever::new(&index, &WordsEmbedder), &chat, "stub");

    let questions = ["hello", "What is the capital of France?", "And of Spain?"];
    for (n, q) in questions.iter().enumerate() {
        pipeline.answer(q).expect("answer");
        assert_eq!(pipeline.history().len(), n + 1);
    }
    let asked: Vec<&str> = pipeline.history().iter().map(|t| t.question.as_str()).collect();
    assert_eq!(asked, questions.to_vec());

    let requests = chat.requests.borrow();
    assert!(requests[0].2.is_empty());
    assert_eq!(requests[2].2.len(), 2);
    assert_eq!(requests[2].2[1].question, "What is the capital of France?");
}

#[test]
fn history_limit_bounds_memory() {
    let (_dir, index) = build_index(paris_corpus());
    let chat = FaithfulChat::new();
    let mut pipeline = AnswerPipeline::new(Retriever::new(&index, &WordsEmbedder), &chat, "stub")
        .with_memory(ConversationMemory::with_limit(Some(2)));
    for q in ["hi", "hello", "hey"] {
        pipeline.answer(q).expect("answer");
    }
    assert_eq!(pipeline.history().len(), 2);
    assert_eq!(pipeline.history()[0].question, "hello");
    assert_eq!(pipeline.memory().total_turns(), 3);
}

#[test]
fn chat_failure_propagates_and_records_no_turn() {
    let (_dir, index) = build_index(paris_corpus());
    let mut pipeline =
        AnswerPipeline::new(Retriever::new(&index, &WordsEmbedder), &FailingChat, "stub");
    let err = pipeline.answer("What is the capital of France?").expect_err("fail");
    assert_eq!(err.code, "AI_CHAT_FAILED");
    assert!(pipeline.history().is_empty());
}

struct RecordingRewriter {
    seen: Cell<usize>,
}

impl QueryRewriter for RecordingRewriter {
    fn rewrite(&self, history: &[ConversationTurn], question: &str) -> Result<String, AppError> {
        self.seen.set(history.len());
        Ok(format!("{question} capital of France"))
    }
}

#[test]
fn rewritten_query_drives_retrieval_but_prompt_keeps_raw_question() {
    let (_dir, index) = build_index(vec![
        DocumentChunk::new("1", "Paris is the capital of France."),
        DocumentChunk::new("2", "Mountains rise above rivers."),
    ]);
    let chat = FaithfulChat::new();
    let rewriter = RecordingRewriter { seen: Cell::new(99) };
    let retriever = Retriever::with_top_k(&index, &WordsEmbedder, 1);
    let mut pipeline =
        AnswerPipeline::new(retriever, &chat, "stub").with_rewriter(Box::new(&rewriter));

    let res = pipeline.answer("Tell me about it").expect("answer");
    assert_eq!(rewriter.seen.get(), 0);
    assert_eq!(res.source_chunks[0].id, "1");
    assert!(chat.requests.borrow()[0].1.contains("Question: Tell me about it\n"));
}

#[test]
fn turkish_prompts_flow_through_the_pipeline() {
    let (_dir, index) = build_index(vec![DocumentChunk::new(
        "1",
        "Ankara Türkiye'nin başkentidir.",
    )]);
    let chat = FaithfulChat::new();
    let mut pipeline = AnswerPipeline::new(Retriever::new(&index, &WordsEmbedder), &chat, "stub")
        .with_prompts(PromptBuilder::new(PromptLanguage::Turkish));
    pipeline.answer("Türkiye'nin başkenti neresidir?").expect("answer");

    let requests = chat.requests.borrow();
    assert!(requests[0].0.contains("“Bilmiyorum”"));
    assert!(requests[0].1.starts_with("BAĞLAM:\nAnkara Türkiye'nin başkentidir.\n\nSoru: "));
}
