use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::BakeConfig;
use crate::discovery::GuideDiscovery;
use crate::docling::DoclingClient;
use crate::embeddings::OllamaClient;
use crate::pipeline::IngestionPipeline;
use crate::snapshot::{InitDirPublisher, SnapshotExporter, SnapshotPublisher};
use crate::sources::GuideSources;
use crate::store::PgVectorStore;
use crate::{BakeError, Result};

/// Run the full pipeline: discover, ingest, snapshot, stage.
///
/// Per-guide failures are absorbed into the run summary; only fatal
/// failures (configuration, discovery, export) surface as errors.
#[inline]
pub async fn bake(config: BakeConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| BakeError::Config(e.to_string()))?;

    let started = Instant::now();
    info!(
        "Baking Quarkus {} documentation (started at {})",
        config.quarkus_version,
        chrono::Utc::now().to_rfc3339()
    );

    // Discovery completes fully before any fetch: it produces the
    // complete, deduplicated work list.
    let discovery = GuideDiscovery::new(
        config.guides_index_url.clone(),
        config.site_base_url.clone(),
    );
    let guides = discovery.discover().await?;

    let sources = GuideSources::prepare(&config).await;

    let converter = DoclingClient::new(&config.docling.endpoint)?;
    let embedder = OllamaClient::new(&config.embedding)?;
    let store = PgVectorStore::connect(&config.postgres, config.embedding.dimension).await?;

    let pipeline = IngestionPipeline::new(&config, converter, embedder, store, sources);

    let shutdown = pipeline.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received; finishing the current guide");
            shutdown.store(true, Ordering::SeqCst);
        }
    });

    let result = pipeline.run(&guides).await;

    println!("Ingestion complete:");
    println!("  Attempted: {}", result.attempted);
    println!("  Succeeded: {}", result.succeeded);
    println!("  Failed:    {}", result.failed);
    for failure in &result.failures {
        println!("  ! {} ({:?}): {}", failure.identifier, failure.stage, failure.cause);
    }

    let exporter = SnapshotExporter::new(config.postgres.clone(), &config.output_dir);
    let artifact = exporter.export().await?;

    let publisher = InitDirPublisher::new(&config.output_dir.join("init"));
    publisher.publish(&artifact)?;

    println!(
        "Snapshot staged at {} ({} bytes)",
        config.output_dir.join("init").display(),
        artifact.size_bytes
    );
    info!("Completed in {:.1?}", started.elapsed());

    Ok(())
}

/// List the guides discovered on the index page, with their keywords.
#[inline]
pub async fn discover(config: BakeConfig) -> Result<()> {
    let discovery = GuideDiscovery::new(
        config.guides_index_url.clone(),
        config.site_base_url.clone(),
    );
    let guides = discovery.discover().await?;

    for (url, keywords) in &guides {
        if keywords.is_empty() {
            println!("{url}");
        } else {
            println!("{url}  [{keywords}]");
        }
    }

    let with_keywords = guides.values().filter(|k| !k.is_empty()).count();
    println!();
    println!("{} guides ({} with keywords)", guides.len(), with_keywords);

    Ok(())
}
