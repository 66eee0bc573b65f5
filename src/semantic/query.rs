//! Similarity request construction and validation.

use crate::errors::SearchError;
use crate::model::{Embedding, Metadata, VectorQuery};

/// Candidate over-fetch factor applied to the result limit
pub const CANDIDATE_MULTIPLIER: usize = 5;

/// Candidate count when neither a limit nor an explicit count is known
pub const DEFAULT_NUM_CANDIDATES: usize = 50;

/// A validated similarity search, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRequest {
    pub query_vector: Embedding,
    pub limit: usize,
    pub num_candidates: usize,
    pub filter: Option<Metadata>,
}

/// Number of candidates to ask the index for.
///
/// An explicit count wins; otherwise the limit is over-fetched to make up for
/// approximate-search recall loss.
pub fn candidate_count(limit: usize, num_candidates: Option<usize>) -> usize {
    match num_candidates {
        Some(n) if n > 0 => n,
        _ if limit > 0 => limit.saturating_mul(CANDIDATE_MULTIPLIER),
        _ => DEFAULT_NUM_CANDIDATES,
    }
}

impl SimilarityRequest {
    /// Validate the parts of a search against `dimension` and assemble them.
    ///
    /// All-zero and non-finite query vectors are rejected rather than
    /// forwarded, since cosine scoring is undefined for them.
    pub fn build(
        query_vector: Embedding,
        limit: usize,
        num_candidates: Option<usize>,
        filter: Option<Metadata>,
        dimension: usize,
    ) -> Result<Self, SearchError> {
        if query_vector.len() != dimension {
            return Err(SearchError::validation(
                "query_vector",
                format!(
                    "dimension mismatch: expected {}, got {}",
                    dimension,
                    query_vector.len()
                ),
            ));
        }

        if limit == 0 {
            return Err(SearchError::validation("limit", "limit must be positive"));
        }

        if let Some(n) = num_candidates {
            if n < limit {
                return Err(SearchError::validation(
                    "num_candidates",
                    format!("num_candidates ({n}) must be >= limit ({limit})"),
                ));
            }
        }

        if query_vector.iter().any(|v| !v.is_finite()) {
            return Err(SearchError::validation(
                "query_vector",
                "query vector contains non-finite values",
            ));
        }

        if query_vector.iter().all(|v| *v == 0.0) {
            return Err(SearchError::validation(
                "query_vector",
                "query vector is all zeros",
            ));
        }

        Ok(Self {
            num_candidates: candidate_count(limit, num_candidates),
            query_vector,
            limit,
            filter: filter.filter(|f| !f.is_empty()),
        })
    }

    /// Validate a caller-supplied query.
    pub fn from_query(query: VectorQuery, dimension: usize) -> Result<Self, SearchError> {
        Self::build(
            query.query_vector,
            query.limit,
            query.num_candidates,
            query.filter,
            dimension,
        )
    }
}
