/// Generator trait and shared types for answer generation.
///
/// The generative model is an external service with a single
/// prompt-in/text-out contract.
pub mod gemini;
pub mod mock;

use thiserror::Error;

/// Errors that can occur during answer generation.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("generation response malformed: {0}")]
    MalformedResponse(String),
}

/// Trait for answer generation implementations.
pub trait Generator: Send + Sync {
    /// Generate response text for an assembled instruction prompt.
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}
