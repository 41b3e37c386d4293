use thiserror::Error;

pub type Result<T> = std::result::Result<T, BakeError>;

/// How a failure affects the run.
///
/// Recoverable failures are scoped to a single guide: the pipeline records
/// them and moves on. Fatal failures terminate the run with a non-zero
/// outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Fatal,
}

#[derive(Error, Debug)]
pub enum BakeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Guide discovery failed: {0}")]
    Discovery(String),

    #[error("Fetch failed for guide {guide}: {reason}")]
    Fetch { guide: String, reason: String },

    #[error("Chunking failed for guide {guide}: {reason}")]
    Chunking { guide: String, reason: String },

    #[error("Ingest failed for guide {guide}: {reason}")]
    Ingest { guide: String, reason: String },

    #[error("Snapshot export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl BakeError {
    /// Classify this error; callers must not treat a fatal failure as a
    /// per-guide one or vice versa.
    #[inline]
    pub fn severity(&self) -> Severity {
        match self {
            BakeError::Fetch { .. } | BakeError::Chunking { .. } | BakeError::Ingest { .. } => {
                Severity::Recoverable
            }
            BakeError::Config(_)
            | BakeError::Discovery(_)
            | BakeError::Export(_)
            | BakeError::Io(_)
            | BakeError::Other(_) => Severity::Fatal,
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// The guide identifier this failure is scoped to, if any.
    #[inline]
    pub fn guide(&self) -> Option<&str> {
        match self {
            BakeError::Fetch { guide, .. }
            | BakeError::Chunking { guide, .. }
            | BakeError::Ingest { guide, .. } => Some(guide),
            _ => None,
        }
    }
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod docling;
pub mod embeddings;
pub mod fetcher;
pub mod metadata;
pub mod pipeline;
pub mod snapshot;
pub mod sources;
pub mod store;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_guide_failures_are_recoverable() {
        let err = BakeError::Fetch {
            guide: "https://quarkus.io/guides/kafka".to_string(),
            reason: "both URLs failed".to_string(),
        };
        assert_eq!(err.severity(), Severity::Recoverable);
        assert_eq!(err.guide(), Some("https://quarkus.io/guides/kafka"));
    }

    #[test]
    fn run_level_failures_are_fatal() {
        assert!(BakeError::Discovery("index unreachable".to_string()).is_fatal());
        assert!(BakeError::Export("pg_dump exited with 1".to_string()).is_fatal());
        assert!(
            BakeError::Config("chunk_overlap must be less than chunk_size".to_string()).is_fatal()
        );
    }
}
