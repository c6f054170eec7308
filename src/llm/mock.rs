/// Mock generator for testing the pipeline without the Gemini API.
///
/// Echoes a canned answer and records the last prompt it received.
use std::sync::Mutex;

use super::{Generator, GeneratorError};

pub struct MockGenerator {
    answer: String,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    #[must_use]
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            last_prompt: Mutex::new(None),
        }
    }

    /// The prompt passed to the most recent `generate` call, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().expect("lock poisoned").clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("mock answer")
    }
}

impl Generator for MockGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        *self.last_prompt.lock().expect("lock poisoned") = Some(prompt.to_string());
        Ok(self.answer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_returns_canned_answer() {
        let generator = MockGenerator::new("canned");
        assert_eq!(generator.generate("any prompt").unwrap(), "canned");
    }

    #[test]
    fn test_mock_records_prompt() {
        let generator = MockGenerator::default();
        assert!(generator.last_prompt().is_none());

        generator.generate("the prompt").unwrap();
        assert_eq!(generator.last_prompt().as_deref(), Some("the prompt"));
    }
}
