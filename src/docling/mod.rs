#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Converts a web page into normalized Markdown.
///
/// The conversion service is an external collaborator; the pipeline only
/// depends on this trait.
pub trait UrlConverter {
    fn convert(&self, url: &str) -> Result<String>;
}

/// Client for a docling-serve instance.
#[derive(Debug, Clone)]
pub struct DoclingClient {
    base_url: Url,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct ConvertRequest {
    options: ConvertOptions,
    http_sources: Vec<HttpSource>,
}

#[derive(Debug, Serialize)]
struct ConvertOptions {
    to_formats: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HttpSource {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    document: Option<ConvertedDocument>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConvertedDocument {
    md_content: Option<String>,
}

impl DoclingClient {
    #[inline]
    pub fn new(endpoint: &str) -> Result<Self> {
        let base_url = Url::parse(endpoint)
            .with_context(|| format!("Invalid docling endpoint: {endpoint}"))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
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
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

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

impl UrlConverter for DoclingClient {
    #[inline]
    fn convert(&self, url: &str) -> Result<String> {
        debug!("Converting: {}", url);

        let request = ConvertRequest {
            options: ConvertOptions {
                to_formats: vec!["md".to_string()],
            },
            http_sources: vec![HttpSource {
                url: url.to_string(),
            }],
        };

        let endpoint = self
            .base_url
            .join("/v1alpha/convert/source")
            .context("Failed to build conversion URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize conversion request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(endpoint.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .with_context(|| format!("Failed to convert {url}"))?;

        let response: ConvertResponse =
            serde_json::from_str(&response_text).context("Failed to parse conversion response")?;

        if let Some(status) = &response.status {
            if status != "success" {
                return Err(anyhow!("Conversion of {url} reported status {status}"));
            }
        }

        let markdown = response
            .document
            .and_then(|d| d.md_content)
            .ok_or_else(|| anyhow!("Conversion of {url} returned no document"))?;

        debug!("Converted {} -> {} chars", url, markdown.len());
        Ok(markdown)
    }
}
