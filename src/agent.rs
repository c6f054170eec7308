//! Keyword tool router.
//!
//! State-free, single-shot classification per request. Routes are an ordered
//! table of (predicate, handler) pairs evaluated first-match-wins, so adding
//! a second tool is a table entry, not a rewrite. Today there is exactly one
//! route: contribution-room questions go to the deterministic calculator.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::retriever::{Retriever, Section};
use crate::tools::calculate_contribution_room;
use crate::tools::CalculationResult;

/// Clarification returned when a contribution question names no year.
pub const CLARIFY_YEAR_MESSAGE: &str = "Please specify the year you turned 18.";

/// A calculator result with the citation sections retrieved for it.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationAnswer {
    pub calculation: CalculationResult,
    pub sections: Vec<Section>,
}

impl fmt::Display for CalculationAnswer {
    /// The verbatim string form interpolated into the prompt's tool block.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.calculation) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.calculation),
        }
    }
}

/// A recoverable, user-facing tool failure (missing year, invalid year).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub message: String,
}

/// Outcome of routing one question. Callers match exhaustively.
#[derive(Debug)]
pub enum AgentOutcome {
    Calculation(CalculationAnswer),
    Error(ToolError),
    /// No tool matched; fall back to retrieval-grounded generation.
    NoMatch,
}

struct ToolRoute {
    matches: fn(&str) -> bool,
    handle: fn(&TfsaAgent, &str) -> AgentOutcome,
}

fn mentions_contribution(question: &str) -> bool {
    question.to_lowercase().contains("contribution")
}

// Evaluated in order; first matching route wins.
static ROUTES: &[ToolRoute] = &[ToolRoute {
    matches: mentions_contribution,
    handle: TfsaAgent::handle_contribution,
}];

/// Extracts the first four-digit year starting with "20" from the question.
pub fn extract_year(question: &str) -> Option<i32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\b20\d{2}\b").expect("valid year pattern"));
    re.find(question).and_then(|m| m.as_str().parse().ok())
}

/// Decides, per question, between the deterministic calculator path and the
/// retrieval path.
pub struct TfsaAgent {
    retriever: Arc<Retriever>,
    top_k: usize,
}

impl TfsaAgent {
    pub fn new(retriever: Arc<Retriever>, top_k: usize) -> Self {
        Self { retriever, top_k }
    }

    pub fn handle_question(&self, question: &str) -> AgentOutcome {
        for route in ROUTES {
            if (route.matches)(question) {
                return (route.handle)(self, question);
            }
        }
        AgentOutcome::NoMatch
    }

    fn handle_contribution(&self, question: &str) -> AgentOutcome {
        info!("contribution question detected, using calculation tool");

        let Some(year_turned_18) = extract_year(question) else {
            return AgentOutcome::Error(ToolError {
                message: CLARIFY_YEAR_MESSAGE.to_string(),
            });
        };

        // Citations are gathered regardless of how the calculation goes;
        // a retrieval failure degrades to an uncited answer.
        let sections = self
            .retriever
            .search(question, self.top_k)
            .unwrap_or_else(|e| {
                warn!("citation retrieval failed: {e}");
                Vec::new()
            });

        match calculate_contribution_room(year_turned_18) {
            Ok(calculation) => AgentOutcome::Calculation(CalculationAnswer {
                calculation,
                sections,
            }),
            Err(e) => AgentOutcome::Error(ToolError {
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use crate::embedder::Embedder;
    use crate::embedder::mock::MockEmbedder;
    use crate::index::{ChunkRecord, VectorStore};

    fn agent_with_sections(sections: &[&str]) -> TfsaAgent {
        let embedder = MockEmbedder::new(32);
        let records: Vec<ChunkRecord> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| ChunkRecord {
                id: format!("guide.txt_{i:03}"),
                section: s.to_string(),
                topic: s.to_lowercase().replace(' ', "_"),
                text: format!("{s} rules."),
                source: "CRA".to_string(),
                document: "RC4466 - TFSA Guide".to_string(),
                jurisdiction: "Canada".to_string(),
                year: 2025,
                embedding: None,
            })
            .collect();
        let vectors = records
            .iter()
            .map(|r| embedder.embed_query(&r.text).unwrap())
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::build(
            records,
            vectors,
            dir.path().join("t.index"),
            dir.path().join("t.json"),
        )
        .unwrap();

        let retriever = Retriever::new(Arc::new(MockEmbedder::new(32)), Arc::new(store));
        TfsaAgent::new(Arc::new(retriever), 5)
    }

    #[test]
    fn test_contribution_question_with_year() {
        let agent = agent_with_sections(&["Contribution Limits"]);
        let outcome = agent.handle_question("What is my contribution room if I turned 18 in 2010?");

        match outcome {
            AgentOutcome::Calculation(answer) => {
                assert!(answer.calculation.total_contribution_room > 0);
                assert_eq!(answer.calculation.yearly_breakdown[&2010], 5000);
                assert!(!answer.sections.is_empty());
            }
            other => panic!("expected calculation, got {other:?}"),
        }
    }

    #[test]
    fn test_contribution_question_without_year() {
        let agent = agent_with_sections(&["Contribution Limits"]);
        let outcome = agent.handle_question("What is my contribution room?");

        match outcome {
            AgentOutcome::Error(err) => {
                assert_eq!(err.message, "Please specify the year you turned 18.");
            }
            other => panic!("expected tool error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_contribution_question_declines() {
        let agent = agent_with_sections(&["Eligibility"]);
        let outcome = agent.handle_question("What is a TFSA?");
        assert!(matches!(outcome, AgentOutcome::NoMatch));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let agent = agent_with_sections(&["Contribution Limits"]);
        for question in [
            "What is my CONTRIBUTION room for 2015?",
            "Tell me about my Contribution limits in 2015",
            "contribution room for 2015",
        ] {
            let outcome = agent.handle_question(question);
            assert!(
                matches!(outcome, AgentOutcome::Calculation(_)),
                "{question} should route to the calculator"
            );
        }
    }

    #[test]
    fn test_future_year_becomes_tool_error() {
        let agent = agent_with_sections(&["Contribution Limits"]);
        let future = chrono::Utc::now().year() + 1;
        let outcome = agent.handle_question(&format!("contribution room, turned 18 in {future}"));

        match outcome {
            AgentOutcome::Error(err) => {
                assert!(err.message.contains("future"), "got: {}", err.message);
            }
            other => panic!("expected tool error, got {other:?}"),
        }
    }

    #[test]
    fn test_first_year_wins() {
        let agent = agent_with_sections(&["Contribution Limits"]);
        let outcome = agent.handle_question("From 2010 to 2023, what is my total contribution room?");

        match outcome {
            AgentOutcome::Calculation(answer) => {
                assert!(answer.calculation.yearly_breakdown.contains_key(&2010));
                assert_eq!(
                    *answer.calculation.yearly_breakdown.keys().next().unwrap(),
                    2010
                );
            }
            other => panic!("expected calculation, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("I turned 18 in 2010"), Some(2010));
        assert_eq!(extract_year("room for 2023?"), Some(2023));
        assert_eq!(extract_year("what is my room?"), None);
        assert_eq!(extract_year("I turned 18 in 1999"), None);
        assert_eq!(extract_year("From 2010 to 2023"), Some(2010));
        assert_eq!(extract_year("year 20235 is not a year"), None);
    }

    #[test]
    fn test_answer_display_is_calculation_json() {
        let agent = agent_with_sections(&["Contribution Limits"]);
        let outcome = agent.handle_question("contribution room 2024");

        let AgentOutcome::Calculation(answer) = outcome else {
            panic!("expected calculation");
        };
        let rendered = answer.to_string();
        assert!(rendered.contains("total_contribution_room"));
        assert!(rendered.contains("yearly_breakdown"));
        assert!(rendered.contains("CRA annual limits used"));
    }
}
