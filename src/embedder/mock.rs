/// Mock embedder for testing purposes.
///
/// Generates deterministic embeddings based on text hash, so tests can run
/// the full pipeline without the Gemini API.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError};
use crate::index::l2_normalize;

/// A mock embedder that produces deterministic vectors from text hashes.
pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

impl Embedder for MockEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut vector = self.embed_one(text)?;
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl MockEmbedder {
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        // Deterministic embedding seeded by the text hash
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        let bytes = hash.to_le_bytes();
        let mut embedding = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            embedding.push(bytes[i % 8] as f32 / 255.0 + (i % 7) as f32 * 0.01);
        }

        Ok(embedding)
    }
}
