use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use homedir::my_home;

use crate::config::Config;
use crate::semantic::SearchService;
use crate::store::{MemoryStore, SnapshotStorage, StoreError};

/// Search service over the snapshot-backed local store
pub type LocalService = SearchService<Arc<MemoryStore>>;

/// A ready-to-use local setup: config, service and the snapshot it persists to.
pub struct LocalApp {
    pub config: Config,
    pub service: LocalService,
    store: Arc<MemoryStore>,
    snapshot: SnapshotStorage,
}

impl LocalApp {
    /// Write the store contents back to the snapshot file.
    pub fn persist(&self) -> Result<(), StoreError> {
        self.store
            .save_snapshot(&self.config.vector_index, &self.snapshot)
    }
}

/// Builds application components from the environment and config.
pub struct AppFactory;

impl AppFactory {
    /// Base directory for config and data files.
    ///
    /// `SIGSEARCH_BASE_PATH` wins; otherwise `~/.local/share/sigsearch`.
    pub fn get_base_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SIGSEARCH_BASE_PATH") {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;
        Ok(home.join(".local/share/sigsearch"))
    }

    /// Load and validate configuration from `base_path`.
    pub fn create_config(base_path: &PathBuf) -> Result<Config> {
        Config::load_with(base_path)
            .with_context(|| format!("Failed to load config from {}", base_path.display()))
    }

    /// Open the local store from its snapshot and wire up the service.
    ///
    /// Ensures the configured vector index exists before returning.
    pub async fn create_local_app(config: Config) -> Result<LocalApp> {
        let snapshot = SnapshotStorage::new(config.snapshot_path());
        let store = Arc::new(
            MemoryStore::load_snapshot(
                config.embedding_dimension,
                &config.vector_index,
                &snapshot,
            )
            .context("Failed to open local store")?,
        );

        let service = SearchService::with_hash_encoder(store.clone(), config.embedding_dimension)
            .context("Failed to create search service")?;

        service
            .ensure_index(&config.vector_index)
            .await
            .context("Failed to ensure vector index")?;

        Ok(LocalApp {
            config,
            service,
            store,
            snapshot,
        })
    }
}
