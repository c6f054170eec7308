//! # tfsarag — TFSA Guidance RAG Service
//!
//! Retrieval-augmented question answering over the CRA TFSA guide. An offline
//! ingestion step chunks the guide into labeled sections, embeds them via the
//! Gemini embedding API and persists a flat inner-product vector index. At
//! query time a small rule-based agent routes each question either to a
//! deterministic contribution-room calculator or to retrieval-grounded
//! generation.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and defaults
//! - **[`chunker`]** — Bracket-delimited section chunking
//! - **[`embedder`]** — Text embedding via the Gemini API (batch + query)
//! - **[`index`]** — Flat inner-product vector index + parallel record store
//! - **[`retriever`]** — Query embedding → index search → scored sections
//! - **[`tools`]** — Deterministic contribution-room calculator
//! - **[`agent`]** — Keyword tool router (first-match-wins route table)
//! - **[`prompt`]** — Grounding context and instruction prompt assembly
//! - **[`llm`]** — Answer generation via the Gemini API
//! - **[`ask`]** — Question-answering pipeline (route → retrieve → generate)
//! - **[`ingest`]** — Offline ingestion (knowledge dir → persisted artifacts)
//! - **[`db`]** — SQLite chat/message history store
//! - **[`api`]** — HTTP API (axum) over chats, messages, and search

pub mod agent;
pub mod api;
pub mod ask;
pub mod chunker;
pub mod config;
pub mod db;
pub mod embedder;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod prompt;
pub mod retriever;
pub mod tools;
