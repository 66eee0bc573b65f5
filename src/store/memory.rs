//! In-process vector store with exact cosine similarity search.
//!
//! Keeps every document in memory and scores them all on each query, so
//! results are exact. Suitable for tests, demos and small collections.
//! Can be persisted with [`SnapshotStorage`].

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::{Document, DocumentInput, Embedding, Metadata};
use crate::semantic::SimilarityRequest;
use crate::store::{SnapshotStorage, StoreError, VectorStore};

struct MemoryState {
    /// Names of the vector indexes created so far
    indexes: BTreeSet<String>,
    documents: Vec<Document>,
}

/// Vector store that lives entirely in memory.
pub struct MemoryStore {
    /// Expected embedding dimensions
    dimension: usize,
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(MemoryState {
                indexes: BTreeSet::new(),
                documents: Vec::new(),
            }),
        }
    }

    /// Rebuild a store from previously stored documents.
    ///
    /// The named index is registered, so the store is searchable right away.
    pub fn from_documents(
        dimension: usize,
        index_name: &str,
        documents: Vec<Document>,
    ) -> Result<Self, StoreError> {
        if let Some(doc) = documents.iter().find(|d| d.embedding.len() != dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                got: doc.embedding.len(),
            });
        }

        let mut indexes = BTreeSet::new();
        indexes.insert(index_name.to_string());

        Ok(Self {
            dimension,
            state: RwLock::new(MemoryState { indexes, documents }),
        })
    }

    /// Open a store backed by a snapshot file, or an empty one if the file
    /// does not exist yet.
    pub fn load_snapshot(
        dimension: usize,
        index_name: &str,
        storage: &SnapshotStorage,
    ) -> Result<Self, StoreError> {
        if !storage.exists() {
            log::info!("No snapshot at {}, starting fresh", storage.path().display());
            return Ok(Self::new(dimension));
        }

        let documents = storage.load(index_name, dimension)?;
        log::info!(
            "Loaded {} documents from {}",
            documents.len(),
            storage.path().display()
        );
        Self::from_documents(dimension, index_name, documents)
    }

    /// Write every stored document to a snapshot file.
    pub fn save_snapshot(
        &self,
        index_name: &str,
        storage: &SnapshotStorage,
    ) -> Result<(), StoreError> {
        let state = self.read()?;
        storage.save(index_name, self.dimension, &state.documents)?;
        log::debug!(
            "Saved {} documents to {}",
            state.documents.len(),
            storage.path().display()
        );
        Ok(())
    }

    /// Get the expected embedding dimensions.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.documents.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Check whether the named index exists.
    pub fn has_index(&self, index_name: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.indexes.contains(index_name))
    }

    /// Copy of all stored documents, in insertion order.
    pub fn documents(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.read()?.documents.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.state
            .read()
            .map_err(|e| StoreError::Internal(format!("Lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state
            .write()
            .map_err(|e| StoreError::Internal(format!("Lock poisoned: {}", e)))
    }

    fn check_dimension(&self, got: usize) -> Result<(), StoreError> {
        if got != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                got,
            });
        }
        Ok(())
    }

    fn search(&self, request: &SimilarityRequest) -> Result<Vec<Document>, StoreError> {
        self.check_dimension(request.query_vector.len())?;

        let state = self.read()?;
        if state.indexes.is_empty() {
            return Err(StoreError::IndexNotFound(
                "no vector index has been created".to_string(),
            ));
        }

        let query_norm = l2_norm(&request.query_vector);

        let mut results: Vec<(f32, &Document)> = state
            .documents
            .iter()
            .filter(|doc| {
                request
                    .filter
                    .as_ref()
                    .map(|filter| matches_filter(&doc.metadata, filter))
                    .unwrap_or(true)
            })
            .map(|doc| {
                let score = cosine_similarity(&request.query_vector, &doc.embedding, query_norm);
                (score, doc)
            })
            .collect();

        // Sort by score descending
        results.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        results.truncate(request.num_candidates);
        results.truncate(request.limit);

        Ok(results
            .into_iter()
            .map(|(score, doc)| Document {
                score,
                ..doc.clone()
            })
            .collect())
    }
}

impl VectorStore for MemoryStore {
    async fn ensure_index(&self, dimension: usize, index_name: &str) -> Result<(), StoreError> {
        self.check_dimension(dimension)?;

        let mut state = self.write()?;
        if state.indexes.insert(index_name.to_string()) {
            log::info!(
                "Created vector index '{}' ({} dimensions)",
                index_name,
                dimension
            );
        } else {
            log::debug!("Vector index '{}' already exists", index_name);
        }
        Ok(())
    }

    async fn insert_document(
        &self,
        input: &DocumentInput,
        embedding: Embedding,
    ) -> Result<Document, StoreError> {
        self.check_dimension(embedding.len())?;

        let doc = Document {
            id: rusty_ulid::generate_ulid_string(),
            content: input.content.clone(),
            embedding,
            metadata: input.metadata.clone(),
            score: 0.0,
        };

        self.write()?.documents.push(doc.clone());
        Ok(doc)
    }

    async fn similarity_search(
        &self,
        request: &SimilarityRequest,
    ) -> Result<Vec<Document>, StoreError> {
        self.search(request)
    }
}

/// Every filter key must be present in `metadata` with an equal value.
fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity with a precomputed query norm. Zero-norm vectors score 0.
fn cosine_similarity(query: &[f32], target: &[f32], query_norm: f32) -> f32 {
    let target_norm = l2_norm(target);
    if query_norm < f32::EPSILON || target_norm < f32::EPSILON {
        return 0.0;
    }

    let dot_product: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    dot_product / (query_norm * target_norm)
}
