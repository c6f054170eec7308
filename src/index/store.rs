//! Persisted vector store: index artifact + parallel metadata records.
//!
//! The ordinal position of a record in the metadata array is its row in the
//! vector index. That correspondence is the store's core invariant: the
//! record count must equal the index vector count, and a load that violates
//! it must not be served.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::{IndexError, VectorIndex};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("index/metadata mismatch: index has {index_len} vectors, metadata has {record_len} records")]
    CountMismatch { index_len: usize, record_len: usize },

    #[error("metadata artifact unreadable: {0}")]
    BadMetadata(#[from] serde_json::Error),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One ingested chunk with its provenance fields.
///
/// `embedding` is retained in the build-time JSON artifact for
/// reproducibility and cleared on load — served records carry no vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub section: String,
    pub topic: String,
    pub text: String,
    pub source: String,
    pub document: String,
    pub jurisdiction: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Read-only pairing of a [`VectorIndex`] with its parallel records.
#[derive(Debug)]
pub struct VectorStore {
    index: VectorIndex,
    records: Vec<ChunkRecord>,
}

impl VectorStore {
    /// Build the store from records and their raw embedding vectors and
    /// persist both artifacts.
    ///
    /// The JSON artifact keeps each record's raw embedding; the index holds
    /// the normalized copies.
    pub fn build<P: AsRef<Path>>(
        mut records: Vec<ChunkRecord>,
        vectors: Vec<Vec<f32>>,
        index_path: P,
        metadata_path: P,
    ) -> Result<Self, StoreError> {
        assert_eq!(
            records.len(),
            vectors.len(),
            "records and vectors length mismatch"
        );

        let index = VectorIndex::build(&vectors)?;

        for (record, vector) in records.iter_mut().zip(&vectors) {
            record.embedding = Some(vector.clone());
        }

        let metadata_file = BufWriter::new(File::create(metadata_path.as_ref())?);
        serde_json::to_writer_pretty(metadata_file, &records)?;
        index.write_to(index_path.as_ref())?;

        info!(
            "Persisted {} records to {} and {}",
            records.len(),
            metadata_path.as_ref().display(),
            index_path.as_ref().display()
        );

        // The serving path never reads per-record embeddings
        for record in &mut records {
            record.embedding = None;
        }

        Ok(Self { index, records })
    }

    /// Load both artifacts and verify the count invariant.
    ///
    /// A mismatch means a corrupted or mixed build; the error must abort
    /// startup rather than serve stale answers.
    pub fn load<P: AsRef<Path>>(index_path: P, metadata_path: P) -> Result<Self, StoreError> {
        let index = VectorIndex::read_from(index_path.as_ref())?;

        let metadata_file = BufReader::new(File::open(metadata_path.as_ref())?);
        let mut records: Vec<ChunkRecord> = serde_json::from_reader(metadata_file)?;

        if index.len() != records.len() {
            return Err(StoreError::CountMismatch {
                index_len: index.len(),
                record_len: records.len(),
            });
        }

        for record in &mut records {
            record.embedding = None;
        }

        info!("Vector store loaded: {} records", records.len());
        Ok(Self { index, records })
    }

    /// Number of records (== number of index vectors).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    /// Top-k records by descending similarity. Sentinel positions from the
    /// index (no result) are filtered out, never surfaced as empty records.
    #[must_use]
    pub fn query(&self, vector: &[f32], k: usize) -> Vec<(f32, &ChunkRecord)> {
        let (scores, positions) = self.index.search(vector, k);

        scores
            .into_iter()
            .zip(positions)
            .filter(|&(_, position)| position >= 0)
            .map(|(score, position)| (score, &self.records[position as usize]))
            .collect()
    }
}
