//! Grounding context and instruction prompt assembly.
//!
//! The prompt layout is part of the service contract: preamble, optional
//! prior-conversation block, context block, optional deterministic-tool
//! block, question — in that order, always. Downstream prompt-compatibility
//! tests pin the exact strings.

use crate::retriever::Section;

/// Fixed system preamble: persona, grounding rules, prohibitions, fallback
/// answer, citation instruction.
const PREAMBLE: &str = "\
You are a regulatory knowledge assistant specializing in Canadian federal tax guidance.

You answer questions ONLY using the provided CRA TFSA source excerpts.
You must not use outside knowledge or assumptions.

Your goals are:
- Explain rules clearly in plain language
- Preserve the legal meaning of the CRA text
- Cite the relevant sections explicitly
- Avoid giving personalized tax advice

If the sources do not contain enough information to answer the question, say:
\"I don't have enough information in the provided CRA sources to answer this.\"

Do NOT:
- Invent rules or numbers
- Guess eligibility
- Provide optimization strategies
- Replace professional tax advice

Always include a \"Sources\" section listing the CRA sections used.";

/// Renders retrieved sections as a citable context block.
///
/// Each section becomes `[Section: <name>]` followed by its text; sections
/// are separated by a blank line and never reordered.
pub fn build_context(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| format!("[Section: {}]\n{}", s.section, s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Assembles the full instruction prompt for the generative model.
pub fn build_prompt(
    context: &str,
    question: &str,
    tool_result: Option<&str>,
    chat_history: Option<&str>,
) -> String {
    let mut prompt = String::from(PREAMBLE);

    if let Some(history) = chat_history {
        prompt.push_str("\n\nPREVIOUS CONVERSATION:\n");
        prompt.push_str(history);
    }

    prompt.push_str("\n\nContext:\n");
    prompt.push_str(context);

    if let Some(tool_result) = tool_result {
        prompt.push_str(
            "\n\nThe following result was computed using deterministic CRA rules.\n\
             Use this result when answering; do not recompute it.\n",
        );
        prompt.push_str(tool_result);
    }

    prompt.push_str("\n\nQuestion:\n");
    prompt.push_str(question);

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, text: &str) -> Section {
        Section {
            id: "1".to_string(),
            section: name.to_string(),
            topic: name.to_lowercase().replace(' ', "_"),
            text: text.to_string(),
            document: "CRA".to_string(),
            jurisdiction: "Canada".to_string(),
            year: 2025,
            score: 0.9,
        }
    }

    #[test]
    fn test_build_context_single_section() {
        let context = build_context(&[section("Test", "Test content")]);
        assert_eq!(context, "[Section: Test]\nTest content");
    }

    #[test]
    fn test_build_context_empty() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_build_context_joins_in_given_order() {
        let context = build_context(&[
            section("Section 1", "Content 1"),
            section("Section 2", "Content 2"),
            section("Section 3", "Content 3"),
        ]);

        let parts: Vec<&str> = context.split("\n\n").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "[Section: Section 1]\nContent 1");
        assert_eq!(parts[1], "[Section: Section 2]\nContent 2");
        assert_eq!(parts[2], "[Section: Section 3]\nContent 3");
    }

    #[test]
    fn test_build_prompt_basic() {
        let context = "[Section: Test]\nTest content";
        let prompt = build_prompt(context, "What is a TFSA?", None, None);

        assert!(prompt.contains("regulatory knowledge assistant"));
        assert!(prompt.contains("CRA TFSA source excerpts"));
        assert!(prompt.contains(context));
        assert!(prompt.contains("What is a TFSA?"));
        assert!(prompt.contains("Sources"));
        assert!(!prompt.contains("PREVIOUS CONVERSATION:"));
        assert!(!prompt.contains("deterministic CRA rules"));
    }

    #[test]
    fn test_build_prompt_field_order() {
        let prompt = build_prompt(
            "CTX-MARKER",
            "QUESTION-MARKER",
            Some("TOOL-MARKER"),
            Some("HISTORY-MARKER"),
        );

        let preamble = prompt.find("regulatory knowledge assistant").unwrap();
        let history = prompt.find("HISTORY-MARKER").unwrap();
        let context = prompt.find("CTX-MARKER").unwrap();
        let tool = prompt.find("TOOL-MARKER").unwrap();
        let question = prompt.find("QUESTION-MARKER").unwrap();

        assert!(preamble < history);
        assert!(history < context);
        assert!(context < tool);
        assert!(tool < question);
    }

    #[test]
    fn test_build_prompt_with_chat_history() {
        let history = "User: Hello\nAssistant: Hi there";
        let prompt = build_prompt("ctx", "q", None, Some(history));

        assert!(prompt.contains("PREVIOUS CONVERSATION:"));
        assert!(prompt.contains(history));
    }

    #[test]
    fn test_build_prompt_with_tool_result() {
        let tool = "{\n  \"total_contribution_room\": 50000\n}";
        let prompt = build_prompt("[Section: Limits]\nAnnual limits apply.", "room?", Some(tool), None);

        assert!(prompt.contains("computed using deterministic CRA rules"));
        assert!(prompt.contains("Use this result when answering"));
        assert!(prompt.contains(tool));
    }

    #[test]
    fn test_build_prompt_instructions_present() {
        let prompt = build_prompt("ctx", "q", None, None);

        assert!(prompt.contains("ONLY using the provided CRA TFSA source excerpts"));
        assert!(prompt.contains("not use outside knowledge"));
        assert!(prompt.contains("plain language"));
        assert!(prompt.contains("Cite the relevant sections"));
        assert!(prompt.contains("Do NOT:"));
        assert!(prompt.contains("Invent rules or numbers"));
        assert!(prompt.contains("Guess eligibility"));
        assert!(prompt.contains("optimization strategies"));
        assert!(prompt.contains("professional tax advice"));
        assert!(prompt.contains("I don't have enough information in the provided CRA sources to answer this."));
    }

    #[test]
    fn test_build_prompt_empty_history_still_renders_block() {
        let prompt = build_prompt("ctx", "q", None, Some(""));
        assert!(prompt.contains("PREVIOUS CONVERSATION:"));
    }
}
