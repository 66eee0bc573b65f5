use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::semantic::DEFAULT_DIMENSION;

const CONFIG_FILE: &str = "config.yaml";

/// Default name of the vector index
const DEFAULT_VECTOR_INDEX: &str = "vector_index";
/// Default snapshot file, relative to the base path
const DEFAULT_SNAPSHOT_FILE: &str = "vectors.bin";
/// Default number of results for text searches
const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Length of every embedding; must match the vector index
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Name of the vector index ensured at startup
    #[serde(default = "default_vector_index")]
    pub vector_index: String,

    /// Snapshot file for the local store, relative to the base path
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,

    /// Result count when a text search does not give one
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_dimension: DEFAULT_DIMENSION,
            vector_index: DEFAULT_VECTOR_INDEX.to_string(),
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            default_search_limit: DEFAULT_SEARCH_LIMIT,
            base_path: PathBuf::new(),
        }
    }
}

fn default_embedding_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_vector_index() -> String {
    DEFAULT_VECTOR_INDEX.to_string()
}

fn default_snapshot_file() -> String {
    DEFAULT_SNAPSHOT_FILE.to_string()
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding_dimension must be positive, got 0".to_string(),
            ));
        }

        if self.vector_index.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "vector_index must not be empty".to_string(),
            ));
        }

        if self.snapshot_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "snapshot_file must not be empty".to_string(),
            ));
        }

        if self.default_search_limit == 0 {
            return Err(ConfigError::Invalid(
                "default_search_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, creating it with defaults when
    /// missing.
    pub fn load_with(base_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base_path = base_path.as_ref();
        std::fs::create_dir_all(base_path)?;

        let config_path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !config_path.exists() {
            log::info!("Creating default config at {}", config_path.display());
            write_atomic(&config_path, serde_yml::to_string(&Self::default())?.as_bytes())?;
        }

        let config_str = std::fs::read_to_string(&config_path)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(&self)?;
        write_atomic(&self.base_path.join(CONFIG_FILE), config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Absolute location of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.base_path.join(&self.snapshot_file)
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)?;
    std::fs::rename(&temp_path, path)
}
