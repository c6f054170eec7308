//! Flat inner-product vector index.
//!
//! Vectors are L2-normalized at build time so that inner product approximates
//! cosine similarity; query vectors must be normalized by the caller (the
//! embedder's query path does this). The index is built once, offline, and is
//! immutable afterwards — concurrent readers need no locking.

pub mod store;

pub use store::{ChunkRecord, StoreError, VectorStore};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

/// Artifact header magic.
const MAGIC: [u8; 4] = *b"TFIX";
/// Artifact format version.
const FORMAT_VERSION: u32 = 1;

/// Sentinel position returned by [`VectorIndex::search`] for empty slots.
pub const NO_RESULT: i64 = -1;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("vector {position} has {got} dimensions, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        got: usize,
    },

    #[error("index artifact corrupt: {0}")]
    BadArtifact(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// L2-normalize a vector in place. Zero vectors are left unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm_sq: f32 = vector.iter().map(|v| v * v).sum();
    if norm_sq > 0.0 {
        let inv = 1.0 / norm_sq.sqrt();
        for v in vector.iter_mut() {
            *v *= inv;
        }
    }
}

/// An exact inner-product similarity index over L2-normalized vectors.
#[derive(Debug)]
pub struct VectorIndex {
    dimensions: usize,
    // Row-major, one normalized vector per row
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build an index from raw vectors, normalizing each one.
    ///
    /// All vectors must share the same dimensionality.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let dimensions = vectors.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(dimensions * vectors.len());

        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    position,
                    expected: dimensions,
                    got: vector.len(),
                });
            }
            let mut row = vector.clone();
            l2_normalize(&mut row);
            data.extend_from_slice(&row);
        }

        info!("Vector index built with {} vectors", vectors.len());
        Ok(Self { dimensions, data })
    }

    /// Number of vectors in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Return exactly `k` (score, position) pairs by descending inner
    /// product, padded with [`NO_RESULT`] positions when the index holds
    /// fewer than `k` vectors. Ties break by ascending row order.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize) -> (Vec<f32>, Vec<i64>) {
        if self.is_empty() {
            return (vec![0.0; k], vec![NO_RESULT; k]);
        }
        assert_eq!(
            query.len(),
            self.dimensions,
            "query dimensionality mismatch"
        );

        let mut hits: Vec<(f32, usize)> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(row, vector)| {
                let dot: f32 = vector.iter().zip(query).map(|(a, b)| a * b).sum();
                (dot, row)
            })
            .collect();

        hits.sort_unstable_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        hits.truncate(k);

        let mut scores = vec![0.0; k];
        let mut positions = vec![NO_RESULT; k];
        for (slot, (score, row)) in hits.into_iter().enumerate() {
            scores[slot] = score;
            positions[slot] = row as i64;
        }
        (scores, positions)
    }

    /// Write the index to its binary artifact.
    ///
    /// Layout: `"TFIX" | version u32 | dimensions u32 | count u32 | f32...`,
    /// all little-endian.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), IndexError> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        w.write_all(&MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_le_bytes())?;
        w.write_all(&(self.dimensions as u32).to_le_bytes())?;
        w.write_all(&(self.len() as u32).to_le_bytes())?;
        for v in &self.data {
            w.write_all(&v.to_le_bytes())?;
        }
        w.flush()?;
        Ok(())
    }

    /// Read an index from its binary artifact.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let mut r = BufReader::new(File::open(path.as_ref())?);

        let mut header = [0u8; 16];
        r.read_exact(&mut header)
            .map_err(|_| IndexError::BadArtifact("truncated header".to_string()))?;

        if header[0..4] != MAGIC {
            return Err(IndexError::BadArtifact("bad magic".to_string()));
        }
        let version = u32::from_le_bytes(header[4..8].try_into().expect("4 bytes"));
        if version != FORMAT_VERSION {
            return Err(IndexError::BadArtifact(format!(
                "unsupported format version {version}"
            )));
        }
        let dimensions = u32::from_le_bytes(header[8..12].try_into().expect("4 bytes")) as usize;
        let count = u32::from_le_bytes(header[12..16].try_into().expect("4 bytes")) as usize;

        let mut raw = vec![0u8; dimensions * count * 4];
        r.read_exact(&mut raw)
            .map_err(|_| IndexError::BadArtifact("truncated vector data".to_string()))?;

        let data = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(b.try_into().expect("4 bytes")))
            .collect();

        info!("Vector index loaded: {count} vectors, {dimensions} dimensions");
        Ok(Self { dimensions, data })
    }
}
