#[cfg(test)]
mod tests;

use fancy_regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Attribute declarations recognized in a guide source header.
const RECOGNIZED_KEYS: usize = 4;

/// Lines scanned before giving up on the header region.
pub const DEFAULT_MAX_SCAN_LINES: usize = 120;

static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*:(categories|summary|extensions|topics):\s*(.*)$")
        .expect("attribute pattern is valid")
});

/// Structured attributes extracted from a guide source header.
///
/// Absent keys stay `None`; they are omitted from the document metadata
/// rather than stored as empty placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideMetadata {
    pub topics: Option<String>,
    pub categories: Option<String>,
    pub extensions: Option<String>,
    pub summary: Option<String>,
}

impl GuideMetadata {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.topics.is_none()
            && self.categories.is_none()
            && self.extensions.is_none()
            && self.summary.is_none()
    }

    fn seen(&self) -> usize {
        [
            &self.topics,
            &self.categories,
            &self.extensions,
            &self.summary,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }

    /// Record a declaration. A re-declaration seen before the early stop
    /// overwrites; one after the early stop is never observed.
    fn record(&mut self, key: &str, value: &str) {
        let slot = match key {
            "topics" => &mut self.topics,
            "categories" => &mut self.categories,
            "extensions" => &mut self.extensions,
            "summary" => &mut self.summary,
            _ => return,
        };
        *slot = Some(value.to_string());
    }
}

/// Extract header attributes from guide source text.
///
/// Scans at most `max_lines` lines for `:key: value` declarations, keys
/// restricted to categories, summary, extensions and topics
/// (case-insensitive), values trimmed. Stops early once all four keys have
/// been seen.
#[inline]
pub fn extract_header(text: &str, max_lines: usize) -> GuideMetadata {
    let mut metadata = GuideMetadata::default();

    for line in text.lines().take(max_lines) {
        if let Ok(Some(captures)) = ATTR_PATTERN.captures(line) {
            let key = captures.get(1).map_or("", |m| m.as_str()).to_lowercase();
            let value = captures.get(2).map_or("", |m| m.as_str()).trim();
            metadata.record(&key, value);

            if metadata.seen() == RECOGNIZED_KEYS {
                break;
            }
        }
    }

    metadata
}

/// Extract header attributes from a guide source file.
///
/// Metadata is best-effort enrichment: a missing or unreadable file yields
/// the empty metadata instead of an error.
#[inline]
pub fn extract_from_file(path: &Path) -> GuideMetadata {
    if !path.is_file() {
        return GuideMetadata::default();
    }

    match fs::read_to_string(path) {
        Ok(text) => {
            let metadata = extract_header(&text, DEFAULT_MAX_SCAN_LINES);
            debug!(
                "Extracted {} header attributes from {}",
                metadata.seen(),
                path.display()
            );
            metadata
        }
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            GuideMetadata::default()
        }
    }
}
