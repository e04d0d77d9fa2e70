pub mod corpus;
pub mod embeddings;
pub mod gemini;
pub mod index;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod retrieve;
pub mod retry;
pub mod rewrite;
pub mod session;

pub use session::RagSession;
