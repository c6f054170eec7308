//! Gemini embedding client.
//!
//! Talks to the `embedContent` / `batchEmbedContents` endpoints of the
//! Generative Language API. Failures surface as a single
//! service-unavailable error; retry policy belongs to callers.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{Embedder, EmbedderError};
use crate::index::l2_normalize;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking embeddings client for the Gemini API.
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Builds a new Gemini embeddings client.
    pub fn new(api_key: String, model: String, dimensions: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Gemini API key");
        anyhow::ensure!(!model.trim().is_empty(), "missing embedding model name");
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            api_key,
            dimensions,
        })
    }

    /// Override the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            method,
            self.api_key
        )
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, EmbedderError> {
        let resp = self
            .client
            .post(self.endpoint(method))
            .json(body)
            .send()
            .map_err(|e| EmbedderError::ServiceUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbedderError::ServiceUnavailable(format!(
                "{status}: {body}"
            )));
        }

        resp.json()
            .map_err(|e| EmbedderError::MalformedResponse(e.to_string()))
    }
}

impl Embedder for GeminiEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model_path = format!("models/{}", self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| EmbedRequest {
                    model: &model_path,
                    content: Content {
                        parts: vec![Part { text: t }],
                    },
                })
                .collect(),
        };

        let parsed: BatchEmbedResponse = self.post("batchEmbedContents", &request)?;
        if parsed.embeddings.len() != texts.len() {
            return Err(EmbedderError::MalformedResponse(format!(
                "{} embeddings returned for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let request = SingleEmbedRequest {
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let parsed: SingleEmbedResponse = self.post("embedContent", &request)?;
        let mut vector = parsed.embedding.values;
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
struct SingleEmbedRequest<'a> {
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct SingleEmbedResponse {
    embedding: EmbeddingValues,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_shape() {
        let request = BatchEmbedRequest {
            requests: vec![EmbedRequest {
                model: "models/text-embedding-004",
                content: Content {
                    parts: vec![Part { text: "hello" }],
                },
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["requests"][0]["content"]["parts"][0]["text"],
            "hello"
        );
        assert_eq!(json["requests"][0]["model"], "models/text-embedding-004");
    }

    #[test]
    fn test_batch_response_parse() {
        let raw = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let parsed: BatchEmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn test_single_response_parse() {
        let raw = r#"{"embedding": {"values": [1.0, 0.0, 0.0]}}"#;
        let parsed: SingleEmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embedding.values.len(), 3);
    }

    #[test]
    fn test_endpoint_url() {
        let embedder = GeminiEmbedder::new("k".into(), "text-embedding-004".into(), 768).unwrap();
        assert_eq!(
            embedder.endpoint("embedContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent?key=k"
        );
    }

    #[test]
    fn test_new_rejects_blank_key() {
        assert!(GeminiEmbedder::new("  ".into(), "m".into(), 768).is_err());
    }
}
