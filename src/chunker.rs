//! Bracket-delimited section chunking.
//!
//! The knowledge corpus uses `[Section Label]` markers to delimit sections.
//! Each label starts a new chunk whose body runs to the next label or the end
//! of the document.

use regex::Regex;
use std::sync::OnceLock;

/// A labeled, non-empty text segment extracted from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionChunk {
    pub section: String,
    pub text: String,
}

fn label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(.*?)\]").expect("valid label pattern"))
}

/// Splits a document into section-labeled chunks.
///
/// Labels and bodies are trimmed. A label immediately followed by another
/// label (empty body) is dropped. Text before the first label belongs to no
/// section and is discarded.
pub fn chunk_text(text: &str) -> Vec<SectionChunk> {
    let re = label_pattern();
    let mut chunks = Vec::new();

    let mut labels = re.captures_iter(text).peekable();
    while let Some(cap) = labels.next() {
        let whole = cap.get(0).expect("match group 0");
        let section = cap.get(1).expect("label group").as_str().trim();

        let body_end = labels
            .peek()
            .map_or(text.len(), |next| next.get(0).expect("match group 0").start());
        let body = text[whole.end()..body_end].trim();

        if !body.is_empty() {
            chunks.push(SectionChunk {
                section: section.to_string(),
                text: body.to_string(),
            });
        }
    }

    chunks
}
