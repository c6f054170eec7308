//! Offline ingestion: knowledge directory → chunks → embeddings → persisted
//! vector store.
//!
//! Runs once, with exclusive access to the artifacts; serving only ever
//! reads them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::chunker::chunk_text;
use crate::embedder::Embedder;
use crate::index::{ChunkRecord, VectorStore};

// Provenance constants for the ingested corpus.
const SOURCE: &str = "CRA";
const DOCUMENT: &str = "RC4466 - TFSA Guide";
const JURISDICTION: &str = "Canada";
const GUIDE_YEAR: i32 = 2025;

pub struct Ingestor<'a, E: Embedder + ?Sized> {
    embedder: &'a E,
}

impl<'a, E: Embedder + ?Sized> Ingestor<'a, E> {
    pub fn new(embedder: &'a E) -> Self {
        Self { embedder }
    }

    /// Ingest every `.txt` document under `knowledge_dir` (sorted filename
    /// order) and persist the index and metadata artifacts.
    ///
    /// Returns the number of chunks indexed.
    pub fn run(
        &self,
        knowledge_dir: &Path,
        index_path: &Path,
        metadata_path: &Path,
    ) -> Result<usize> {
        let files = list_documents(knowledge_dir)?;
        if files.is_empty() {
            warn!("no .txt documents found in {}", knowledge_dir.display());
        }

        let mut records = Vec::new();
        let mut texts_to_embed = Vec::new();

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("█▓░"),
        );

        for path in &files {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            pb.set_message(filename.clone());

            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;

            for (i, chunk) in chunk_text(&text).into_iter().enumerate() {
                records.push(ChunkRecord {
                    id: format!("{filename}_{i:03}"),
                    topic: chunk.section.to_lowercase().replace(' ', "_"),
                    section: chunk.section,
                    text: chunk.text.clone(),
                    source: SOURCE.to_string(),
                    document: DOCUMENT.to_string(),
                    jurisdiction: JURISDICTION.to_string(),
                    year: GUIDE_YEAR,
                    embedding: None,
                });
                texts_to_embed.push(chunk.text);
            }

            pb.inc(1);
        }
        pb.finish_and_clear();

        info!("Embedding {} chunks", texts_to_embed.len());
        let texts: Vec<&str> = texts_to_embed.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        let count = records.len();
        for artifact in [index_path, metadata_path] {
            if let Some(parent) = artifact.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        VectorStore::build(records, embeddings, index_path, metadata_path)?;

        info!("Embedded and indexed {count} chunks");
        Ok(count)
    }
}

/// The `.txt` documents under `dir`, in sorted filename order.
fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("missing knowledge folder at {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
        })
        .collect();

    files.sort();
    Ok(files)
}
