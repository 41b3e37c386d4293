#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use fancy_regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::docling::UrlConverter;

static PATCH_VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("version pattern is valid"));

/// Normalized guide content with the URL that actually resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedGuide {
    pub markdown: String,
    pub resolved_url: String,
}

/// Truncate a patch version to major.minor for URL construction; a version
/// already in major.minor form is used as-is.
#[inline]
pub fn version_for_url(version: &str) -> &str {
    if PATCH_VERSION_PATTERN.is_match(version).unwrap_or(false) {
        version
            .rsplit_once('.')
            .map_or(version, |(major_minor, _)| major_minor)
    } else {
        version
    }
}

/// Resolves a guide to normalized Markdown through the conversion
/// collaborator, preferring version-accurate content.
///
/// Version-specific pages may not exist for guides that are older or newer
/// than the site's current release, so a failed versioned fetch falls back
/// exactly once to the unversioned page.
#[derive(Debug)]
pub struct ContentFetcher<C> {
    converter: C,
    base_url: String,
    url_version: String,
}

impl<C: UrlConverter> ContentFetcher<C> {
    #[inline]
    pub fn new(converter: C, base_url: &str, product_version: &str) -> Self {
        let url_version = version_for_url(product_version).to_string();
        debug!("Using version {} for guide URLs", url_version);

        Self {
            converter,
            base_url: base_url.trim_end_matches('/').to_string(),
            url_version,
        }
    }

    #[inline]
    pub fn versioned_url(&self, title: &str) -> String {
        format!(
            "{}/version/{}/guides/{}",
            self.base_url, self.url_version, title
        )
    }

    #[inline]
    pub fn fallback_url(&self, title: &str) -> String {
        format!("{}/guides/{}", self.base_url, title)
    }

    /// Fetch a guide, trying the version-qualified URL first.
    #[inline]
    pub fn fetch(&self, title: &str) -> Result<FetchedGuide> {
        let versioned = self.versioned_url(title);

        match self.converter.convert(&versioned) {
            Ok(markdown) => {
                info!("Fetched versioned URL: {}", versioned);
                Ok(FetchedGuide {
                    markdown,
                    resolved_url: versioned,
                })
            }
            Err(e) => {
                let fallback = self.fallback_url(title);
                warn!(
                    "Versioned URL failed ({}), trying fallback URL: {}",
                    e, fallback
                );

                let markdown = self
                    .converter
                    .convert(&fallback)
                    .with_context(|| {
                        format!("both versioned and fallback URLs failed for {title}")
                    })?;

                info!("Fetched fallback URL: {}", fallback);
                Ok(FetchedGuide {
                    markdown,
                    resolved_url: fallback,
                })
            }
        }
    }
}
