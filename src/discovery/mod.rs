
use anyhow::{Context, Result, anyhow};
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use ureq::Agent;
use url::Url;

use crate::BakeError;

/// Configuration for the index-page HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for HttpConfig {
    #[inline]
    fn default() -> Self {
        Self {
            user_agent: "docs-bake/0.1.0 (Documentation Ingester)".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 2,
        }
    }
}

/// HTTP client wrapper with retry logic for transient failures.
#[derive(Debug)]
pub struct HttpClient {
    agent: Agent,
    config: HttpConfig,
}

impl HttpClient {
    #[inline]
    pub fn new(config: HttpConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .user_agent(&config.user_agent)
            .build()
            .into();

        Self { agent, config }
    }

    /// Perform an HTTP GET request, retrying transient failures.
    #[inline]
    pub async fn get(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!("Retrying request to {} (attempt {})", url, attempt + 1);
                tokio::time::sleep(Duration::from_secs(self.config.retry_delay_seconds)).await;
            }

            match self.try_get(url) {
                Ok(response) => {
                    debug!("Successfully fetched {} (attempt {})", url, attempt + 1);
                    return Ok(response);
                }
                Err(e) if is_retryable_error(&e) && attempt < self.config.max_retries => {
                    warn!("Retryable error for {}: {}", url, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    error!("Non-retryable error for {}: {}", url, e);
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("All retry attempts failed")))
    }

    fn try_get(&self, url: &str) -> Result<String> {
        debug!("Making HTTP GET request to: {}", url);

        match self.agent.get(url).call() {
            Ok(mut response) => {
                let text = response
                    .body_mut()
                    .read_to_string()
                    .with_context(|| format!("Failed to read response body from {}", url))?;
                debug!("Read {} bytes from {}", text.len(), url);
                Ok(text)
            }
            Err(ureq::Error::StatusCode(code)) => Err(anyhow!("HTTP error {}", code)),
            Err(e) => Err(anyhow::Error::from(e))
                .with_context(|| format!("Failed to make HTTP request to {}", url)),
        }
    }
}

/// Check if an error is retryable (network problems, 5xx, 429).
fn is_retryable_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("timeout")
        || error_str.contains("connection")
        || error_str.contains("network")
    {
        return true;
    }

    if error_str.contains("http error 5") {
        return true;
    }

    if error_str.contains("http error 429") {
        return true;
    }

    false
}

/// One documentation unit eligible for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideDescriptor {
    /// Absolute URL, unique across a run.
    pub identifier: String,
    /// Last path segment of the URL.
    pub title: String,
    /// Keyword hints scraped from the index page; may be empty.
    pub keywords: String,
}

impl GuideDescriptor {
    #[inline]
    pub fn new(identifier: String, keywords: String) -> Self {
        let title = title_from_url(&identifier);
        Self {
            identifier,
            title,
            keywords,
        }
    }
}

/// Derive a guide title from the last non-empty path segment of a URL.
fn title_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("unknown")
        .to_string()
}

/// Discovers the guide work list by scraping the guides index page.
#[derive(Debug)]
pub struct GuideDiscovery {
    http_client: HttpClient,
    index_url: String,
    base_url: String,
}

impl GuideDiscovery {
    #[inline]
    pub fn new(index_url: String, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(HttpConfig::default()),
            index_url,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the index page and extract the deduplicated guide mapping.
    ///
    /// Any failure here is fatal: without a work list there is no partial
    /// corpus worth salvaging.
    #[inline]
    pub async fn discover(&self) -> crate::Result<BTreeMap<String, String>> {
        validate_url(&self.index_url)
            .map_err(|e| BakeError::Discovery(format!("invalid index URL: {e}")))?;

        info!("Fetching guides index from: {}", self.index_url);

        let html = self
            .http_client
            .get(&self.index_url)
            .await
            .map_err(|e| BakeError::Discovery(format!("index page unreachable: {e}")))?;

        let guides = discover_guides(&html, &self.base_url);

        if guides.is_empty() {
            return Err(BakeError::Discovery(format!(
                "no guides found on index page {}",
                self.index_url
            )));
        }

        let with_keywords = guides.values().filter(|k| !k.is_empty()).count();
        info!(
            "Found {} guides ({} with keywords)",
            guides.len(),
            with_keywords
        );

        Ok(guides)
    }
}

/// Extract guide URLs and keywords from index page HTML.
///
/// Structured `<qs-guide>` blocks are the high-fidelity source; generic
/// `/guides/...` links only fill gaps. The result is keyed by absolute URL.
#[inline]
pub fn discover_guides(html: &str, base_url: &str) -> BTreeMap<String, String> {
    let document = Html::parse_document(html);

    let structured = extract_structured_blocks(&document, base_url);
    let generic = extract_guide_links(&document, base_url);

    merge_discovered(structured, generic)
}

/// Merge the two discovery signals; structured entries always win.
fn merge_discovered(
    structured: BTreeMap<String, String>,
    generic: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = generic;
    // Structured blocks overwrite: they carry the keyword metadata.
    merged.extend(structured);
    merged
}

/// Extract `<qs-guide url=".." keywords="..">` blocks.
fn extract_structured_blocks(document: &Html, base_url: &str) -> BTreeMap<String, String> {
    let selector = Selector::parse("qs-guide").expect("valid selector");

    let mut guides = BTreeMap::new();
    for element in document.select(&selector) {
        let Some(path) = element.value().attr("url") else {
            continue;
        };
        if !path.starts_with("/guides/") {
            continue;
        }
        let keywords = element.value().attr("keywords").unwrap_or("");
        guides.insert(format!("{base_url}{path}"), keywords.to_string());
    }

    debug!("Structured blocks yielded {} guides", guides.len());
    guides
}

/// Extract bare `/guides/...` hyperlinks, excluding static assets.
fn extract_guide_links(document: &Html, base_url: &str) -> BTreeMap<String, String> {
    let selector = Selector::parse("a[href]").expect("valid selector");

    let mut guides = BTreeMap::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        // Strip fragment and query before filtering.
        let path = href
            .split(['#', '?'])
            .next()
            .unwrap_or(href);

        if is_guide_page(path) {
            guides.insert(format!("{base_url}{path}"), String::new());
        }
    }

    debug!("Generic links yielded {} guides", guides.len());
    guides
}

/// Filter for actual guide pages, rejecting the index itself and assets.
fn is_guide_page(path: &str) -> bool {
    path.starts_with("/guides/")
        && !path.ends_with("/guides/")
        && !path.contains("/stylesheet/")
        && !path.contains("/assets/")
        && !path.ends_with(".css")
        && !path.ends_with(".js")
        && !path.ends_with(".png")
        && !path.ends_with(".jpg")
        && !path.ends_with(".svg")
}

/// Validate and normalize a URL.
#[inline]
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).with_context(|| format!("Invalid URL format: {}", url_str))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("URL must use HTTP or HTTPS scheme: {}", url_str));
    }

    if url.host_str().is_none() {
        return Err(anyhow!("URL must have a valid host: {}", url_str));
    }

    Ok(url)
}
