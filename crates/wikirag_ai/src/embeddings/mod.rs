use wikirag_core::error::AppError;

/// Which side of retrieval a text is embedded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTask {
    Document,
    Query,
}

pub trait Embedder {
    fn embed(&self, model: &str, task: EmbedTask, input: &str) -> Result<Vec<f32>, AppError>;

    /// Embed many inputs, preserving order. Implementations with a batch
    /// endpoint override this.
    fn embed_batch(
        &self,
        model: &str,
        task: EmbedTask,
        inputs: &[&str],
    ) -> Result<Vec<Vec<f32>>, AppError> {
        inputs
            .iter()
            .map(|input| self.embed(model, task, input))
            .collect()
    }
}

pub mod gemini_embed;
