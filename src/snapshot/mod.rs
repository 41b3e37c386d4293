
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::BakeError;
use crate::config::PostgresConfig;

const DUMP_FILE_NAME: &str = "01-rag.sql";

/// A portable, replayable serialization of the populated store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Dumps the populated store into a plain-text SQL artifact.
///
/// Ownership and privilege statements are stripped so the artifact can be
/// restored into an unrelated environment. A failed dump is fatal: a
/// partial corpus artifact is worse than none.
#[derive(Debug, Clone)]
pub struct SnapshotExporter {
    program: String,
    postgres: PostgresConfig,
    output_dir: PathBuf,
}

impl SnapshotExporter {
    #[inline]
    pub fn new(postgres: PostgresConfig, output_dir: &Path) -> Self {
        Self {
            program: "pg_dump".to_string(),
            postgres,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Override the dump binary (alternate install locations, tests).
    #[inline]
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Produce the snapshot artifact in the output directory.
    #[inline]
    pub async fn export(&self) -> crate::Result<SnapshotArtifact> {
        info!("Dumping store with {}", self.program);

        fs::create_dir_all(&self.output_dir)
            .await
            .context("Failed to create output directory")?;

        let output = Command::new(&self.program)
            .args([
                "-h",
                &self.postgres.host,
                "-p",
                &self.postgres.port.to_string(),
                "-U",
                &self.postgres.user,
                "-d",
                &self.postgres.database,
                "--no-owner",
                "--no-privileges",
                "--format=plain",
            ])
            .env("PGPASSWORD", &self.postgres.password)
            .output()
            .await
            .map_err(|e| BakeError::Export(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BakeError::Export(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let path = self.output_dir.join(DUMP_FILE_NAME);
        fs::write(&path, &output.stdout)
            .await
            .context("Failed to write snapshot artifact")?;

        let artifact = SnapshotArtifact {
            size_bytes: output.stdout.len() as u64,
            path,
        };
        info!(
            "Dumped SQL -> {} ({} bytes)",
            artifact.path.display(),
            artifact.size_bytes
        );

        Ok(artifact)
    }
}

/// Hands the finished artifact to the external packaging step. Pure
/// interface boundary: implementations stage or transfer the artifact, the
/// packaging itself happens elsewhere.
pub trait SnapshotPublisher {
    fn publish(&self, artifact: &SnapshotArtifact) -> Result<()>;
}

/// Stages the artifact into an init-scripts directory, the layout the
/// database image build consumes (docker-entrypoint-initdb.d).
#[derive(Debug, Clone)]
pub struct InitDirPublisher {
    init_dir: PathBuf,
}

impl InitDirPublisher {
    #[inline]
    pub fn new(init_dir: &Path) -> Self {
        Self {
            init_dir: init_dir.to_path_buf(),
        }
    }
}

impl SnapshotPublisher for InitDirPublisher {
    #[inline]
    fn publish(&self, artifact: &SnapshotArtifact) -> Result<()> {
        std::fs::create_dir_all(&self.init_dir).context("Failed to create init directory")?;

        let file_name = artifact
            .path
            .file_name()
            .context("Artifact path has no file name")?;
        let dest = self.init_dir.join(file_name);

        std::fs::copy(&artifact.path, &dest)
            .with_context(|| format!("Failed to stage artifact at {}", dest.display()))?;

        debug!("Staged snapshot artifact at {}", dest.display());
        Ok(())
    }
}
