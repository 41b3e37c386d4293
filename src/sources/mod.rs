#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BakeConfig;

/// Access to the documentation sources used for header-metadata
/// enrichment.
///
/// Metadata is best-effort: when no sources are available every lookup
/// returns `None` and guides are ingested without header attributes.
#[derive(Debug)]
pub struct GuideSources {
    docs_dir: Option<PathBuf>,
}

impl GuideSources {
    /// Sources that resolve nothing.
    #[inline]
    pub fn unavailable() -> Self {
        Self { docs_dir: None }
    }

    /// Use an existing checkout. `docs_path` is resolved against the
    /// checkout root; when it does not exist the root itself is used.
    #[inline]
    pub fn from_local(root: &Path, docs_path: &str) -> Self {
        let joined = root.join(docs_path);
        let docs_dir = if joined.is_dir() {
            joined
        } else {
            root.to_path_buf()
        };

        Self {
            docs_dir: Some(docs_dir),
        }
    }

    /// Shallow-clone the sources repository at the version tag.
    #[inline]
    pub async fn checkout(repo_url: &str, version_tag: &str, docs_path: &str) -> Result<Self> {
        let dest = std::env::temp_dir().join(format!("docs-bake-sources-{}", Uuid::new_v4()));

        info!(
            "Cloning {} at tag {} into {}",
            repo_url,
            version_tag,
            dest.display()
        );

        let output = Command::new("git")
            .args([
                "clone",
                "--depth",
                "1",
                "--branch",
                version_tag,
                "--quiet",
                repo_url,
            ])
            .arg(&dest)
            .output()
            .await
            .context("Failed to spawn git")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "git clone exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(Self::from_local(&dest, docs_path))
    }

    /// Resolve sources per configuration: a configured local directory
    /// wins; otherwise a shallow clone is attempted and failure degrades
    /// to no metadata.
    #[inline]
    pub async fn prepare(config: &BakeConfig) -> Self {
        if let Some(dir) = &config.sources_dir {
            return Self::from_local(dir, &config.sources_docs_path);
        }

        match Self::checkout(
            &config.sources_repo_url,
            &config.quarkus_version,
            &config.sources_docs_path,
        )
        .await
        {
            Ok(sources) => sources,
            Err(e) => {
                warn!(
                    "Sources checkout failed, continuing without header metadata: {}",
                    e
                );
                Self::unavailable()
            }
        }
    }

    /// Locate the source file for a guide title, if present.
    #[inline]
    pub fn lookup(&self, title: &str) -> Option<PathBuf> {
        let docs_dir = self.docs_dir.as_ref()?;
        let path = docs_dir.join(format!("{title}.adoc"));

        is_guide_source(&path).then_some(path)
    }
}

/// Filter for real guide sources: include files and template directories
/// are not guides.
fn is_guide_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if name.starts_with('_') {
        return false;
    }

    let path_str = path.to_string_lossy();
    if path_str.contains("/includes/")
        || path_str.contains("/_includes/")
        || path_str.contains("/_templates/")
    {
        return false;
    }

    path.is_file()
}
