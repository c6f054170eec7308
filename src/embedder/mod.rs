/// Embedder trait and shared types for text embedding.
///
/// Embeddings come from an external service; implementations are thin
/// request/response clients.
pub mod gemini;
pub mod mock;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("embedding service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("embedding response malformed: {0}")]
    MalformedResponse(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed multiple text strings into vectors, one per input, same order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Embed a single query string and L2-normalize the result, ready for
    /// direct inner-product index search.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}
