//! Hash-signature indexing and nearest-neighbor search for text and images.
//!
//! Text is turned into a fixed-length vector by deterministic token-bucket
//! hashing; images are turned into pseudo-text feature tokens first. The
//! vectors are stored through a [`store::VectorStore`] and queried by cosine
//! similarity.

pub mod cli;
pub mod config;
pub mod errors;
pub mod factory;
pub mod model;
pub mod semantic;
pub mod store;
#[cfg(test)]
mod tests;

pub use errors::SearchError;
pub use semantic::{Encoder, HashEncoder, SearchService, SimilarityRequest};
pub use store::{MemoryStore, StoreError, VectorStore};

/// Parse a comma-separated list of floats.
pub fn parse_vector(vector: &str) -> Result<Vec<f32>, std::num::ParseFloatError> {
    vector
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<f32>)
        .collect()
}

#[cfg(test)]
mod parse_tests {
    use super::parse_vector;

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("1, 0.5,-2").unwrap(), vec![1.0, 0.5, -2.0]);
        assert_eq!(parse_vector("1,,2,").unwrap(), vec![1.0, 2.0]);
        assert!(parse_vector("1,x").is_err());
    }
}
