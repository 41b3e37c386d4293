#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 300;
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 384;

/// Configuration for a bake run.
///
/// Loaded from a TOML file when one exists, with CLI flags layered on top by
/// the command layer. `validate` must pass before a run starts; numeric
/// constraints are rejected here, never clamped mid-run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BakeConfig {
    /// Target product version, e.g. "3.30.6".
    pub quarkus_version: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Split at Markdown headings instead of fixed-size windows.
    pub semantic_chunking: bool,
    /// Upper bound on guides processed; 0 means unlimited.
    pub max_guides: usize,
    /// Guides index page scraped for discovery.
    pub guides_index_url: String,
    /// Base URL guide paths are resolved against.
    pub site_base_url: String,
    /// Local checkout of the documentation sources. When unset, a shallow
    /// clone at the version tag is attempted for metadata enrichment.
    pub sources_dir: Option<PathBuf>,
    /// Repository holding the documentation sources.
    pub sources_repo_url: String,
    /// Subdirectory of the sources repository containing the guides.
    pub sources_docs_path: String,
    /// Directory the snapshot artifact is staged into.
    pub output_dir: PathBuf,
    pub docling: DoclingConfig,
    pub embedding: EmbeddingConfig,
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DoclingConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub dimension: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table: String,
}

impl Default for BakeConfig {
    #[inline]
    fn default() -> Self {
        Self {
            quarkus_version: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            semantic_chunking: false,
            max_guides: 0,
            guides_index_url: "https://quarkus.io/guides/".to_string(),
            site_base_url: "https://quarkus.io".to_string(),
            sources_dir: None,
            sources_repo_url: "https://github.com/quarkusio/quarkus.git".to_string(),
            sources_docs_path: "docs/src/main/asciidoc".to_string(),
            output_dir: PathBuf::from("."),
            docling: DoclingConfig::default(),
            embedding: EmbeddingConfig::default(),
            postgres: PostgresConfig::default(),
        }
    }
}

impl Default for DoclingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5001".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "bge-small-en-v1.5".to_string(),
            dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

impl Default for PostgresConfig {
    #[inline]
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "postgres".to_string(),
            table: "rag_documents".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing quarkus version (use --quarkus-version)")]
    MissingVersion,
    #[error("Invalid quarkus version: {0} (expected major.minor or major.minor.patch)")]
    InvalidVersion(String),
    #[error("Invalid chunk size: {0} (must be greater than 0)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be strictly less than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid URL for {0}: {1}")]
    InvalidUrl(&'static str, String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid postgres port: 0")]
    InvalidPostgresPort,
    #[error("Postgres {0} cannot be empty")]
    EmptyPostgresField(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl BakeConfig {
    /// Load configuration from a TOML file, or defaults when the file does
    /// not exist. Validation is deferred until CLI overrides are applied.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: BakeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(config)
    }

    /// Default location of the config file.
    #[inline]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docs-bake").join("config.toml"))
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quarkus_version.is_empty() {
            return Err(ConfigError::MissingVersion);
        }

        let version_pattern = Regex::new(r"^\d+\.\d+(\.\d+)?$").expect("version pattern is valid");
        if !version_pattern
            .is_match(&self.quarkus_version)
            .unwrap_or(false)
        {
            return Err(ConfigError::InvalidVersion(self.quarkus_version.clone()));
        }

        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunk_overlap,
                self.chunk_size,
            ));
        }

        for (name, value) in [
            ("guides_index_url", &self.guides_index_url),
            ("site_base_url", &self.site_base_url),
            ("docling.endpoint", &self.docling.endpoint),
            ("embedding.endpoint", &self.embedding.endpoint),
        ] {
            Url::parse(value).map_err(|_| ConfigError::InvalidUrl(name, value.clone()))?;
        }

        if !(64..=4096).contains(&self.embedding.dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding.dimension,
            ));
        }

        self.postgres.validate()?;

        Ok(())
    }
}

impl PostgresConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPostgresPort);
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyPostgresField("host"));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::EmptyPostgresField("user"));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::EmptyPostgresField("database"));
        }
        if self.table.trim().is_empty() {
            return Err(ConfigError::EmptyPostgresField("table"));
        }
        Ok(())
    }

    /// Connection URL in the form sqlx expects.
    #[inline]
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}
