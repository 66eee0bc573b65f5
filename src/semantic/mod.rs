//! Signature derivation and query construction.
//!
//! This module turns text and images into fixed-length embeddings and
//! coordinates them with a vector store.
//!
//! # Architecture
//!
//! - `encoder`: Deterministic hash-based text encoder
//! - `image_features`: Image format gate and pseudo-text feature tokens
//! - `query`: Similarity request construction and validation
//! - `image_record`: Internal carrier for image payloads through the store
//! - `service`: High-level index and search service

pub mod encoder;
pub mod image_features;
mod image_record;
mod query;
mod service;

pub use encoder::{Encoder, HashEncoder};
pub use image_features::{compose_embedding_text, detect_format, tokenize, ImageFormat};
pub use query::{candidate_count, SimilarityRequest, DEFAULT_NUM_CANDIDATES};
pub use service::{SearchService, DEFAULT_IMAGE_LIMIT};

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 256;
