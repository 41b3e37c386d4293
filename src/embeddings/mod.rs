#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::EmbeddingConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Turns text into a vector.
///
/// The embedding model is an external collaborator; the pipeline only
/// depends on this trait.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Client for an Ollama-compatible embedding endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    dimension: u32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base_url = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid embedding endpoint: {}", config.endpoint))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            dimension: config.dimension,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            match request_fn() {
                Ok(response_text) => return Ok(response_text),
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                return Err(anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Request failed after retries")))
    }
}

impl Embedder for OllamaClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let url = self
            .base_url
            .join("/api/embeddings")
            .context("Failed to build embedding URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to generate embedding")?;

        let response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        if response.embedding.len() != self.dimension as usize {
            return Err(anyhow!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                response.embedding.len()
            ));
        }

        Ok(response.embedding)
    }
}
