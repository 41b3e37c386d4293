
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::chunking::{ChunkSplitter, SplitStrategy};
use crate::config::BakeConfig;
use crate::discovery::GuideDescriptor;
use crate::docling::UrlConverter;
use crate::embeddings::Embedder;
use crate::fetcher::ContentFetcher;
use crate::metadata;
use crate::sources::GuideSources;
use crate::store::{DocumentMetadata, DocumentRecord, DocumentSink, EmbeddedChunk};
use crate::{BakeError, Severity};

/// Guides between progress reports.
const PROGRESS_INTERVAL: usize = 10;

/// Stages a guide moves through. `Failed` is absorbing and reachable from
/// any non-terminal stage; the failure record names the stage that was
/// being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideStage {
    Discovered,
    MetadataResolved,
    ContentFetched,
    Chunked,
    Ingested,
}

/// One recorded per-guide failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideFailure {
    pub identifier: String,
    pub stage: GuideStage,
    pub cause: String,
}

/// Per-run accounting. Counters only ever increase; per-guide failures are
/// recorded here instead of aborting the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<GuideFailure>,
}

impl IngestionResult {
    fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    fn record_failure(&mut self, failure: GuideFailure) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(failure);
    }
}

/// Orchestrates metadata extraction, fetch, chunking, embedding and
/// storage for every discovered guide, isolating per-guide failures.
pub struct IngestionPipeline<C, E, S> {
    fetcher: ContentFetcher<C>,
    embedder: E,
    sink: S,
    sources: GuideSources,
    splitter: ChunkSplitter,
    version: String,
    max_guides: usize,
    shutdown: Arc<AtomicBool>,
}

impl<C, E, S> IngestionPipeline<C, E, S>
where
    C: UrlConverter,
    E: Embedder,
    S: DocumentSink,
{
    #[inline]
    pub fn new(
        config: &BakeConfig,
        converter: C,
        embedder: E,
        sink: S,
        sources: GuideSources,
    ) -> Self {
        let strategy = if config.semantic_chunking {
            SplitStrategy::Semantic
        } else {
            SplitStrategy::Recursive
        };

        info!(
            "Using {} chunking, size={}, overlap={}",
            if config.semantic_chunking {
                "semantic"
            } else {
                "recursive"
            },
            config.chunk_size,
            config.chunk_overlap
        );

        Self {
            fetcher: ContentFetcher::new(converter, &config.site_base_url, &config.quarkus_version),
            embedder,
            sink,
            sources,
            splitter: ChunkSplitter::new(strategy, config.chunk_size, config.chunk_overlap),
            version: config.quarkus_version.clone(),
            max_guides: config.max_guides,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between guides; an in-flight guide completes rather
    /// than being hard-cancelled.
    #[inline]
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Process every discovered guide. The mapping is already deduplicated
    /// and ordered by identifier; `max_guides` truncates it for bounded
    /// test runs.
    #[inline]
    pub async fn run(&self, guides: &BTreeMap<String, String>) -> IngestionResult {
        let descriptors: Vec<GuideDescriptor> = guides
            .iter()
            .map(|(url, keywords)| GuideDescriptor::new(url.clone(), keywords.clone()))
            .collect();

        let descriptors = if self.max_guides > 0 && descriptors.len() > self.max_guides {
            info!(
                "Limiting to first {} guides (out of {})",
                self.max_guides,
                descriptors.len()
            );
            descriptors[..self.max_guides].to_vec()
        } else {
            descriptors
        };

        let total = descriptors.len();
        let started = Instant::now();
        let mut result = IngestionResult::default();

        let bar = if console::user_attended_stderr() {
            ProgressBar::new(total as u64).with_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] Baking {msg}")
                    .expect("style template is valid"),
            )
        } else {
            ProgressBar::hidden()
        };

        for descriptor in &descriptors {
            if self.shutdown.load(Ordering::SeqCst) {
                warn!(
                    "Shutdown requested, stopping after {} of {} guides",
                    result.attempted, total
                );
                break;
            }

            bar.set_message(descriptor.title.clone());

            match self.process(descriptor).await {
                Ok(()) => result.record_success(),
                Err((stage, error)) => {
                    debug_assert_eq!(error.severity(), Severity::Recoverable);
                    warn!("Failed to process {}: {} - skipping", descriptor.identifier, error);
                    result.record_failure(GuideFailure {
                        identifier: descriptor.identifier.clone(),
                        stage,
                        cause: error.to_string(),
                    });
                }
            }

            bar.inc(1);

            if result.attempted % PROGRESS_INTERVAL == 0 || result.attempted == total {
                info!("Processed {} / {} guides", result.attempted, total);
            }
        }

        bar.finish_and_clear();

        info!(
            "Ingested {} / {} guides ({} failed) in {:.1?}",
            result.succeeded,
            result.attempted,
            result.failed,
            started.elapsed()
        );
        if !result.failures.is_empty() {
            info!(
                "Failed guides: {}",
                result
                    .failures
                    .iter()
                    .map(|f| f.identifier.as_str())
                    .join(", ")
            );
        }

        result
    }

    /// Run one guide through the stage sequence. The returned error is
    /// always recoverable and tagged with the stage that failed.
    async fn process(
        &self,
        descriptor: &GuideDescriptor,
    ) -> Result<(), (GuideStage, BakeError)> {
        debug!("Processing guide {}", descriptor.identifier);

        // Header metadata is best-effort enrichment; a missing source
        // never fails the guide.
        let header = self
            .sources
            .lookup(&descriptor.title)
            .map(|path| metadata::extract_from_file(&path))
            .unwrap_or_default();

        let fetched = self.fetcher.fetch(&descriptor.title).map_err(|e| {
            (
                GuideStage::ContentFetched,
                BakeError::Fetch {
                    guide: descriptor.identifier.clone(),
                    reason: e.to_string(),
                },
            )
        })?;

        let mut doc_metadata = DocumentMetadata::new(
            fetched.resolved_url.clone(),
            self.version.clone(),
            descriptor.title.clone(),
        );
        doc_metadata.apply_header(&header);

        let chunks = self.splitter.split(&fetched.markdown);
        if chunks.is_empty() {
            return Err((
                GuideStage::Chunked,
                BakeError::Chunking {
                    guide: descriptor.identifier.clone(),
                    reason: "no content after normalization".to_string(),
                },
            ));
        }
        debug!(
            "Chunked {} into {} chunks",
            descriptor.identifier,
            chunks.len()
        );

        let mut embedded = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.embedder.embed(&chunk.text).map_err(|e| {
                (
                    GuideStage::Ingested,
                    BakeError::Ingest {
                        guide: descriptor.identifier.clone(),
                        reason: format!("embedding failed: {e}"),
                    },
                )
            })?;

            embedded.push(EmbeddedChunk {
                text: chunk.text,
                sequence_index: chunk.sequence_index,
                embedding,
                metadata: doc_metadata.clone(),
            });
        }

        let record = DocumentRecord {
            identifier: descriptor.identifier.clone(),
            metadata: doc_metadata,
            chunks: embedded,
        };

        self.sink.upsert(&record).await.map_err(|e| {
            (
                GuideStage::Ingested,
                BakeError::Ingest {
                    guide: descriptor.identifier.clone(),
                    reason: format!("store write failed: {e}"),
                },
            )
        })?;

        debug!("Ingested {}", descriptor.identifier);
        Ok(())
    }
}
