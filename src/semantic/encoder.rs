//! Deterministic hash-based text encoder.
//!
//! Produces fixed-length signatures without any model download:
//! - Lowercase and split on whitespace
//! - Hash every token into a bucket with FNV-1a
//! - Count occurrences per bucket (collisions accumulate)
//! - L2-normalize so cosine similarity behaves downstream
//!
//! This is token-bucket hashing, not a trained model. Similar scores only
//! mean shared tokens.

use crate::errors::SearchError;
use crate::model::Embedding;

/// FNV-1a 64-bit offset basis
const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
/// FNV-1a 64-bit prime
const FNV_PRIME: u64 = 0x100000001b3;

/// Turns text into an embedding of a fixed dimension.
///
/// Implementations must be deterministic: the same text always maps to the
/// same vector.
pub trait Encoder: Send + Sync {
    /// Length of every vector this encoder produces.
    fn dimension(&self) -> usize;

    /// Encode a single text.
    fn encode(&self, text: &str) -> Result<Embedding, SearchError>;
}

/// Bag-of-tokens encoder using the hashing trick.
#[derive(Debug, Clone)]
pub struct HashEncoder {
    dimension: usize,
}

impl HashEncoder {
    /// Create an encoder producing vectors of `dimension` components.
    ///
    /// Fails with a configuration error when `dimension` is zero.
    pub fn new(dimension: usize) -> Result<Self, SearchError> {
        if dimension == 0 {
            return Err(SearchError::Configuration(
                "encoder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a64(token.as_bytes()) % self.dimension as u64) as usize
    }
}

impl Encoder for HashEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Embedding, SearchError> {
        let mut vector = vec![0.0f32; self.dimension];
        if text.is_empty() {
            return Ok(vector);
        }

        for token in text.to_lowercase().split_whitespace() {
            vector[self.bucket(token)] += 1.0;
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

/// Scale `vector` to unit length in place. A zero vector is left untouched.
pub fn normalize(vector: &mut [f32]) {
    let sum: f64 = vector.iter().map(|v| (*v as f64) * (*v as f64)).sum();
    if sum == 0.0 {
        return;
    }

    let magnitude = sum.sqrt() as f32;
    for v in vector.iter_mut() {
        *v /= magnitude;
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l2_norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_zero_dimension_is_configuration_error() {
        let result = HashEncoder::new(0);
        assert!(matches!(result, Err(SearchError::Configuration(_))));
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        // Reference values for 64-bit FNV-1a
        assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let encoder = HashEncoder::new(32).unwrap();
        let embedding = encoder.encode("").unwrap();
        assert_eq!(embedding.len(), 32);
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_deterministic() {
        let encoder = HashEncoder::new(64).unwrap();
        let a = encoder.encode("vectors power search").unwrap();
        let b = encoder.encode("vectors power search").unwrap();
        let bits_a: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn test_dimension_invariant() {
        for dim in [1, 2, 7, 16, 384] {
            let encoder = HashEncoder::new(dim).unwrap();
            for text in ["", "one", "many different tokens here", "日本語 テキスト"] {
                assert_eq!(encoder.encode(text).unwrap().len(), dim);
            }
        }
    }

    #[test]
    fn test_unit_norm_for_non_empty_text() {
        let encoder = HashEncoder::new(16).unwrap();
        for text in ["a", "hello world", "the the the cat", "x y z w v u t s r q p"] {
            let embedding = encoder.encode(text).unwrap();
            assert!((l2_norm(&embedding) - 1.0).abs() < 1e-5, "text: {text}");
        }
    }

    #[test]
    fn test_whitespace_only_text_stays_zero() {
        let encoder = HashEncoder::new(8).unwrap();
        let embedding = encoder.encode("   \t\n").unwrap();
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let encoder = HashEncoder::new(128).unwrap();
        let a = encoder.encode("Hello World").unwrap();
        let b = encoder.encode("hello   world").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_repeated_tokens_accumulate() {
        let encoder = HashEncoder::new(1).unwrap();
        // Single bucket: everything collides, normalized to 1.0
        let embedding = encoder.encode("a b c a").unwrap();
        assert_eq!(embedding, vec![1.0]);

        let encoder = HashEncoder::new(1024).unwrap();
        let bucket = encoder.bucket("echo");
        let embedding = encoder.encode("echo echo echo").unwrap();
        assert!((embedding[bucket] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_leaves_zero_vector() {
        let mut v = vec![0.0; 4];
        normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);

        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }
}
