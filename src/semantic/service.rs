//! Search service tying encoding to retrieval.
//!
//! Provides a high-level interface for index and search operations:
//! - Validates every request before any encoding or storage call
//! - Encodes text (and image feature tokens) with the configured encoder
//! - Builds validated similarity requests for the store
//!
//! Holds no mutable state, so one instance can serve concurrent requests
//! behind an `Arc`.

use crate::errors::SearchError;
use crate::model::{
    Document, DocumentInput, ImageDocument, ImageInput, ImageQuery, Metadata, VectorQuery,
};
use crate::semantic::encoder::{Encoder, HashEncoder};
use crate::semantic::image_features::{compose_embedding_text, detect_format};
use crate::semantic::image_record::ImageRecord;
use crate::semantic::query::SimilarityRequest;
use crate::store::{StoreError, VectorStore};

/// Result count for image searches that do not set a limit
pub const DEFAULT_IMAGE_LIMIT: usize = 5;

/// Service for indexing and searching text and images.
pub struct SearchService<S, E = HashEncoder> {
    store: S,
    encoder: E,
    dimension: usize,
}

impl<S: VectorStore> SearchService<S, HashEncoder> {
    /// Create a service backed by a [`HashEncoder`] of `dimension`.
    pub fn with_hash_encoder(store: S, dimension: usize) -> Result<Self, SearchError> {
        let encoder = HashEncoder::new(dimension)?;
        Self::new(store, encoder, dimension)
    }
}

impl<S: VectorStore, E: Encoder> SearchService<S, E> {
    /// Create a new search service.
    ///
    /// # Arguments
    /// * `store` - Vector store holding documents and their embeddings
    /// * `encoder` - Encoder producing `dimension`-length vectors
    /// * `dimension` - Configured embedding dimension
    pub fn new(store: S, encoder: E, dimension: usize) -> Result<Self, SearchError> {
        if dimension == 0 {
            return Err(SearchError::Configuration(
                "dimension must be positive".to_string(),
            ));
        }
        if encoder.dimension() != dimension {
            return Err(SearchError::Configuration(format!(
                "encoder produces {} dimensions, service configured for {}",
                encoder.dimension(),
                dimension
            )));
        }

        Ok(Self {
            store,
            encoder,
            dimension,
        })
    }

    /// Get the configured embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make sure the store has a vector index for this dimension.
    pub async fn ensure_index(&self, index_name: &str) -> Result<(), SearchError> {
        self.store.ensure_index(self.dimension, index_name).await?;
        Ok(())
    }

    /// Encode and store a text document.
    pub async fn index_text(&self, input: DocumentInput) -> Result<Document, SearchError> {
        input.validate()?;
        self.embed_and_store(input).await
    }

    /// Search stored documents by text similarity.
    ///
    /// # Returns
    /// At most `limit` documents, highest score first.
    pub async fn search_by_text(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<Document>, SearchError> {
        self.search_by_text_filtered(text, limit, None).await
    }

    /// Same as `search_by_text()`, restricted to documents whose metadata
    /// matches every key of `filter`.
    pub async fn search_by_text_filtered(
        &self,
        text: &str,
        limit: usize,
        filter: Option<Metadata>,
    ) -> Result<Vec<Document>, SearchError> {
        if limit == 0 {
            return Err(SearchError::validation("limit", "limit must be positive"));
        }

        let query_vector = self.encoder.encode(text)?;
        let request = SimilarityRequest::build(query_vector, limit, None, filter, self.dimension)?;

        self.search(&request).await
    }

    /// Search with a vector the caller already has. Skips encoding.
    pub async fn search_by_vector(&self, query: VectorQuery) -> Result<Vec<Document>, SearchError> {
        let request = SimilarityRequest::from_query(query, self.dimension)?;
        self.search(&request).await
    }

    /// Index an image under its description.
    ///
    /// The embedding covers the trimmed description followed by the image's
    /// feature tokens.
    pub async fn index_image(&self, input: ImageInput) -> Result<ImageDocument, SearchError> {
        input.validate()?;
        let record = ImageRecord::new(input)?;

        let doc = self.index_text(record.into_document_input()).await?;
        Ok(ImageRecord::unpack(doc))
    }

    /// Find stored images similar to the query image.
    ///
    /// A zero limit falls back to [`DEFAULT_IMAGE_LIMIT`].
    pub async fn search_images(
        &self,
        query: ImageQuery,
    ) -> Result<Vec<ImageDocument>, SearchError> {
        query.validate()?;
        detect_format(&query.image_data)?;

        let limit = if query.limit == 0 {
            DEFAULT_IMAGE_LIMIT
        } else {
            query.limit
        };

        let text = compose_embedding_text(
            query.description.as_deref().unwrap_or_default(),
            &query.image_data,
        );
        let docs = self.search_by_text(&text, limit).await?;

        Ok(docs.into_iter().map(ImageRecord::unpack).collect())
    }

    /// The single encode-then-store path behind both text and image indexing.
    async fn embed_and_store(&self, input: DocumentInput) -> Result<Document, SearchError> {
        let embedding = self.encoder.encode(&input.content)?;
        if embedding.len() != self.dimension {
            return Err(SearchError::validation(
                "embedding",
                format!(
                    "dimension mismatch: expected {}, got {}",
                    self.dimension,
                    embedding.len()
                ),
            ));
        }

        let doc = self
            .store
            .insert_document(&input, embedding)
            .await
            .map_err(|e| match e {
                StoreError::DimensionMismatch { expected, got } => SearchError::validation(
                    "embedding",
                    format!("store expects {} dimensions, got {}", expected, got),
                ),
                other => SearchError::Storage(other),
            })?;

        log::debug!("Indexed document {} ({} bytes)", doc.id, doc.content.len());
        Ok(doc)
    }

    async fn search(&self, request: &SimilarityRequest) -> Result<Vec<Document>, SearchError> {
        let results = self.store.similarity_search(request).await?;
        log::debug!(
            "Similarity search returned {} of {} (candidates {})",
            results.len(),
            request.limit,
            request.num_candidates
        );
        Ok(results)
    }
}
