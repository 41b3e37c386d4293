use super::*;
use anyhow::anyhow;
use std::cell::RefCell;
use std::collections::HashMap;

/// Converter stub with canned per-URL outcomes and call recording.
struct StubConverter {
    responses: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl StubConverter {
    fn new(responses: &[(&str, &str)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl UrlConverter for StubConverter {
    fn convert(&self, url: &str) -> anyhow::Result<String> {
        self.calls.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP error 404 for {url}"))
    }
}

const BASE: &str = "https://quarkus.io";

#[test]
fn patch_version_is_truncated() {
    assert_eq!(version_for_url("3.30.6"), "3.30");
    assert_eq!(version_for_url("3.15.0"), "3.15");
}

#[test]
fn major_minor_version_is_unchanged() {
    assert_eq!(version_for_url("3.30"), "3.30");
}

#[test]
fn unrecognized_version_is_unchanged() {
    assert_eq!(version_for_url("3.30.6.Final"), "3.30.6.Final");
}

#[test]
fn versioned_url_uses_truncated_version() {
    let fetcher = ContentFetcher::new(StubConverter::new(&[]), BASE, "3.30.6");

    assert_eq!(
        fetcher.versioned_url("kafka"),
        "https://quarkus.io/version/3.30/guides/kafka"
    );
    assert_eq!(
        fetcher.fallback_url("kafka"),
        "https://quarkus.io/guides/kafka"
    );
}

#[test]
fn versioned_url_preferred_when_available() {
    let converter = StubConverter::new(&[
        ("https://quarkus.io/version/3.30/guides/kafka", "# Versioned"),
        ("https://quarkus.io/guides/kafka", "# Latest"),
    ]);
    let fetcher = ContentFetcher::new(converter, BASE, "3.30.6");

    let fetched = fetcher.fetch("kafka").expect("fetch succeeds");

    assert_eq!(fetched.markdown, "# Versioned");
    assert_eq!(
        fetched.resolved_url,
        "https://quarkus.io/version/3.30/guides/kafka"
    );
}

#[test]
fn fallback_url_is_resolved_when_versioned_fails() {
    let converter = StubConverter::new(&[("https://quarkus.io/guides/kafka", "# Latest")]);
    let fetcher = ContentFetcher::new(converter, BASE, "3.30.6");

    let fetched = fetcher.fetch("kafka").expect("fetch succeeds");

    // The recorded URL is the one that actually resolved.
    assert_eq!(fetched.markdown, "# Latest");
    assert_eq!(fetched.resolved_url, "https://quarkus.io/guides/kafka");
}

#[test]
fn fallback_is_attempted_exactly_once() {
    let fetcher = ContentFetcher::new(StubConverter::new(&[]), BASE, "3.30.6");

    let err = fetcher.fetch("kafka").expect_err("fetch fails");

    assert!(err.to_string().contains("both versioned and fallback"));
    assert_eq!(
        fetcher.converter.calls(),
        vec![
            "https://quarkus.io/version/3.30/guides/kafka".to_string(),
            "https://quarkus.io/guides/kafka".to_string(),
        ]
    );
}
