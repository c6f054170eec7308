/// Configuration module.
///
/// Handles loading, validating, and providing default configuration values.
/// The Gemini API key is deliberately not part of the file; it comes from
/// the environment.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_knowledge_dir() -> String {
    "./knowledge".to_string()
}

fn default_index_path() -> String {
    "./embedding/tfsa.index".to_string()
}

fn default_metadata_path() -> String {
    "./embedding/tfsa_records.json".to_string()
}

fn default_db_path() -> String {
    "./chats.db".to_string()
}

fn default_search_top_k() -> usize {
    5
}

fn default_history_window() -> usize {
    10
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_generation_model() -> String {
    "gemini-2.0-flash".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: String,

    #[serde(default = "default_index_path")]
    pub index_path: String,

    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    /// How many recent messages feed the prompt's conversation block.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_dir: default_knowledge_dir(),
            index_path: default_index_path(),
            metadata_path: default_metadata_path(),
            db_path: default_db_path(),
            search_top_k: default_search_top_k(),
            history_window: default_history_window(),
            bind_addr: default_bind_addr(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            dimensions: default_dimensions(),
            generation_model: default_generation_model(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and optionally
    /// generates a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        anyhow::ensure!(
            !self.model.embedding_model.is_empty(),
            "model.embedding_model must be set"
        );
        anyhow::ensure!(
            !self.model.generation_model.is_empty(),
            "model.generation_model must be set"
        );
        anyhow::ensure!(!self.bind_addr.is_empty(), "bind_addr must be set");
        Ok(())
    }

    /// The Gemini API key from the environment.
    pub fn gemini_api_key() -> Result<String> {
        std::env::var("GEMINI_API_KEY").context("Missing GEMINI_API_KEY")
    }
}

// ── Tests ────────────────────────────────────────────────────────────
