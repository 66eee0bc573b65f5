//! Vector store abstraction consumed by the search service.
//!
//! - `VectorStore`: persistence and nearest-neighbor retrieval capability
//! - `memory`: in-process reference store with exact cosine scoring
//! - `snapshot`: binary file persistence for the in-process store
//!
//! Store calls are futures; dropping one (e.g. on a caller's timeout)
//! abandons the call. No retries happen at this layer.

use std::future::Future;
use std::sync::Arc;

use crate::model::{Document, DocumentInput, Embedding};
use crate::semantic::SimilarityRequest;

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{SnapshotError, SnapshotStorage};

/// Errors raised by a vector store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence plus nearest-neighbor retrieval.
pub trait VectorStore: Send + Sync {
    /// Create the named vector index if it does not exist yet.
    ///
    /// Idempotent: calling it for an existing index is a no-op.
    fn ensure_index(
        &self,
        dimension: usize,
        index_name: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Store a document with its embedding and return the stored form,
    /// including the generated id.
    fn insert_document(
        &self,
        input: &DocumentInput,
        embedding: Embedding,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    /// Documents most similar to the request vector, highest score first.
    fn similarity_search(
        &self,
        request: &SimilarityRequest,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;
}

impl<T: VectorStore> VectorStore for Arc<T> {
    fn ensure_index(
        &self,
        dimension: usize,
        index_name: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).ensure_index(dimension, index_name)
    }

    fn insert_document(
        &self,
        input: &DocumentInput,
        embedding: Embedding,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send {
        (**self).insert_document(input, embedding)
    }

    fn similarity_search(
        &self,
        request: &SimilarityRequest,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send {
        (**self).similarity_search(request)
    }
}
