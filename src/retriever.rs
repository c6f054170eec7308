//! Retrieval: query embedding → index search → scored sections.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedder::{Embedder, EmbedderError};
use crate::index::{ChunkRecord, VectorStore};

/// Default number of sections returned by a search.
pub const DEFAULT_TOP_K: usize = 5;

/// A retrieved section with its similarity score, used both for grounding
/// the generative model and for agent-tool citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub section: String,
    pub topic: String,
    pub text: String,
    pub document: String,
    pub jurisdiction: String,
    pub year: i32,
    pub score: f32,
}

impl Section {
    fn from_record(record: &ChunkRecord, score: f32) -> Self {
        Self {
            id: record.id.clone(),
            section: record.section.clone(),
            topic: record.topic.clone(),
            text: record.text.clone(),
            document: record.document.clone(),
            jurisdiction: record.jurisdiction.clone(),
            year: record.year,
            score,
        }
    }
}

/// Composes the embedder and the loaded vector store into a single search
/// operation. No caching: every call re-embeds the query.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Return up to `top_k` sections ranked by descending similarity.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<Section>, EmbedderError> {
        let query_vector = self.embedder.embed_query(query)?;

        Ok(self
            .store
            .query(&query_vector, top_k)
            .into_iter()
            .map(|(score, record)| Section::from_record(record, score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use crate::index::VectorStore;

    fn store_with(sections: &[&str]) -> Arc<VectorStore> {
        let embedder = MockEmbedder::new(32);
        let records: Vec<ChunkRecord> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| ChunkRecord {
                id: format!("guide.txt_{i:03}"),
                section: s.to_string(),
                topic: s.to_lowercase().replace(' ', "_"),
                text: format!("{s} text"),
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
        Arc::new(store)
    }

    #[test]
    fn test_search_returns_scored_sections() {
        let store = store_with(&["Eligibility", "Contribution Limits"]);
        let retriever = Retriever::new(Arc::new(MockEmbedder::new(32)), store);

        let results = retriever.search("Eligibility text", 5).unwrap();
        assert_eq!(results.len(), 2);
        // Exact text match with the mock embedder scores 1.0
        assert_eq!(results[0].section, "Eligibility");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_search_is_idempotent() {
        let store = store_with(&["A", "B", "C"]);
        let retriever = Retriever::new(Arc::new(MockEmbedder::new(32)), store);

        let first = retriever.search("some question", 3).unwrap();
        let second = retriever.search("some question", 3).unwrap();

        let ids = |sections: &[Section]| -> Vec<String> {
            sections.iter().map(|s| s.id.clone()).collect()
        };
        assert_eq!(ids(&first), ids(&second));
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn test_search_respects_top_k() {
        let store = store_with(&["A", "B", "C", "D"]);
        let retriever = Retriever::new(Arc::new(MockEmbedder::new(32)), store);

        let results = retriever.search("anything", 2).unwrap();
        assert_eq!(results.len(), 2);
    }
}
