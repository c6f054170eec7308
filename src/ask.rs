//! Question-answering pipeline: route → retrieve → prompt → generate.
//!
//! All collaborators are injected; the pipeline owns no global state. One
//! logical task handles a question from routing through prompt assembly.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::agent::{AgentOutcome, TfsaAgent};
use crate::embedder::EmbedderError;
use crate::llm::{Generator, GeneratorError};
use crate::prompt::{build_context, build_prompt};
use crate::retriever::Retriever;

/// Informative answer used when retrieval finds nothing; the generative
/// model is never invoked in that case.
pub const NO_SECTIONS_MESSAGE: &str = "No relevant CRA sections found.";

#[derive(Error, Debug)]
pub enum AskError {
    #[error(transparent)]
    Embedding(#[from] EmbedderError),

    #[error(transparent)]
    Generation(#[from] GeneratorError),
}

/// How a question was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Retrieval-grounded (and possibly tool-grounded) generated answer.
    Answered(String),
    /// User-facing tool message (clarification or validation failure);
    /// no generation happened.
    ToolMessage(String),
    /// Retrieval found nothing relevant; no generation happened.
    NoSections,
}

pub struct AskPipeline {
    retriever: Arc<Retriever>,
    agent: TfsaAgent,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl AskPipeline {
    pub fn new(
        retriever: Arc<Retriever>,
        agent: TfsaAgent,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            agent,
            generator,
            top_k,
        }
    }

    /// Answer one question, optionally grounded in recent chat history.
    pub fn answer(
        &self,
        question: &str,
        chat_history: Option<&str>,
    ) -> Result<AskOutcome, AskError> {
        match self.agent.handle_question(question) {
            AgentOutcome::Calculation(answer) => {
                let context = build_context(&answer.sections);
                let tool_result = answer.to_string();
                let prompt =
                    build_prompt(&context, question, Some(&tool_result), chat_history);
                let text = self.generator.generate(&prompt)?;
                Ok(AskOutcome::Answered(text))
            }
            AgentOutcome::Error(err) => Ok(AskOutcome::ToolMessage(err.message)),
            AgentOutcome::NoMatch => {
                let sections = self.retriever.search(question, self.top_k)?;
                if sections.is_empty() {
                    info!("no relevant sections for question, skipping generation");
                    return Ok(AskOutcome::NoSections);
                }

                let context = build_context(&sections);
                let prompt = build_prompt(&context, question, None, chat_history);
                let text = self.generator.generate(&prompt)?;
                Ok(AskOutcome::Answered(text))
            }
        }
    }
}
