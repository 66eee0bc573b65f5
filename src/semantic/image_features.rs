//! Image-to-pseudo-text feature tokens.
//!
//! Images are never decoded. A prefix of the raw bytes is averaged in
//! fixed-size chunks for coarse, position-sensitive structure, and a SHA-256
//! of the whole payload keeps unrelated images apart. The resulting tokens go
//! through the same text encoder as plain documents.

use sha2::{Digest, Sha256};

use crate::errors::SearchError;

/// Only this many leading bytes are sampled for chunk averages
pub const MAX_SAMPLE_BYTES: usize = 4096;

/// Bytes per averaged chunk
pub const CHUNK_SIZE: usize = 64;

/// Bytes of digest per signature token
const SIGNATURE_GROUP: usize = 4;

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Image formats accepted for indexing and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Identify the image format from its magic bytes.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, SearchError> {
    if bytes.is_empty() {
        return Err(SearchError::validation("image_data", "image is required"));
    }

    if bytes.starts_with(&JPEG_MAGIC) {
        return Ok(ImageFormat::Jpeg);
    }

    if bytes.starts_with(&PNG_MAGIC) {
        return Ok(ImageFormat::Png);
    }

    Err(SearchError::UnsupportedFormat(
        "image must be a JPEG or PNG file".to_string(),
    ))
}

/// Check the format gate, then produce feature tokens.
pub fn tokenize(bytes: &[u8]) -> Result<Vec<String>, SearchError> {
    detect_format(bytes)?;
    Ok(image_tokens(bytes))
}

/// Feature tokens for raw image bytes: `pix:` chunk averages followed by
/// eight `sig:` digest groups.
///
/// Does not check the format; use [`tokenize`] for untrusted input.
pub fn image_tokens(bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return vec![];
    }

    let sample = &bytes[..bytes.len().min(MAX_SAMPLE_BYTES)];

    let mut tokens: Vec<String> = sample
        .chunks(CHUNK_SIZE)
        .map(|chunk| {
            let sum: usize = chunk.iter().map(|b| *b as usize).sum();
            format!("pix:{:02x}", sum / chunk.len())
        })
        .collect();

    // Digest covers the full payload, not just the sample
    let digest = Sha256::digest(bytes);
    tokens.extend(digest.chunks(SIGNATURE_GROUP).map(|group| {
        let hex: String = group.iter().map(|b| format!("{:02x}", b)).collect();
        format!("sig:{}", hex)
    }));

    tokens
}

/// Build the text that gets embedded for an image: trimmed description
/// (when present) followed by the feature tokens, space separated.
///
/// Used for both indexing and querying so the two embeddings are comparable.
pub fn compose_embedding_text(description: &str, bytes: &[u8]) -> String {
    let description = description.trim();
    let tokens = image_tokens(bytes);

    let mut parts: Vec<&str> = Vec::with_capacity(tokens.len() + 1);
    if !description.is_empty() {
        parts.push(description);
    }
    parts.extend(tokens.iter().map(String::as_str));

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_prefixed(len: usize) -> Vec<u8> {
        let mut data = JPEG_MAGIC.to_vec();
        data.resize(len, 0x10);
        data
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(&jpeg_prefixed(10)).unwrap(), ImageFormat::Jpeg);
        assert_eq!(detect_format(&PNG_MAGIC).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_rejects_unknown_formats() {
        let gif = b"GIF89a\x01\x00\x01\x00";
        assert!(matches!(
            detect_format(gif),
            Err(SearchError::UnsupportedFormat(_))
        ));

        // PNG needs the full 8-byte signature
        let truncated_png = [0x89, 0x50, 0x4E, 0x47, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            detect_format(&truncated_png),
            Err(SearchError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            tokenize(b"plain text, not an image"),
            Err(SearchError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_empty_bytes_are_validation_error() {
        let err = detect_format(&[]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("image_data"));
    }

    #[test]
    fn test_small_jpeg_tokens() {
        let tokens = tokenize(&jpeg_prefixed(10)).unwrap();

        let pix = tokens.iter().filter(|t| t.starts_with("pix:")).count();
        let sig = tokens.iter().filter(|t| t.starts_with("sig:")).count();
        assert_eq!(pix, 1);
        assert_eq!(sig, 8);

        // pixel tokens come first
        assert!(tokens[0].starts_with("pix:"));
        assert!(tokens[1..].iter().all(|t| t.starts_with("sig:")));
        assert!(tokens[1..].iter().all(|t| t.len() == "sig:".len() + 8));
    }

    #[test]
    fn test_chunk_average_is_floor_mean() {
        let data = [0xFF, 0xD8, 0xFF, 0x00];
        let tokens = image_tokens(&data);
        // (255 + 216 + 255 + 0) / 4 = 181 = 0xb5
        assert_eq!(tokens[0], "pix:b5");
    }

    #[test]
    fn test_sampling_is_capped() {
        let data = jpeg_prefixed(MAX_SAMPLE_BYTES * 3);
        let tokens = image_tokens(&data);
        let pix = tokens.iter().filter(|t| t.starts_with("pix:")).count();
        assert_eq!(pix, MAX_SAMPLE_BYTES / CHUNK_SIZE);

        let short = image_tokens(&jpeg_prefixed(CHUNK_SIZE + 1));
        assert_eq!(short.iter().filter(|t| t.starts_with("pix:")).count(), 2);
    }

    #[test]
    fn test_digest_covers_bytes_beyond_sample() {
        let a = jpeg_prefixed(MAX_SAMPLE_BYTES + 100);
        let mut b = a.clone();
        *b.last_mut().unwrap() = 0x99;

        let ta = image_tokens(&a);
        let tb = image_tokens(&b);
        let pix_a: Vec<_> = ta.iter().filter(|t| t.starts_with("pix:")).collect();
        let pix_b: Vec<_> = tb.iter().filter(|t| t.starts_with("pix:")).collect();
        assert_eq!(pix_a, pix_b);
        assert_ne!(ta, tb);
    }

    #[test]
    fn test_signature_matches_sha256() {
        let data = jpeg_prefixed(10);
        let digest = Sha256::digest(&data);
        let tokens = image_tokens(&data);
        let expected = format!(
            "sig:{:02x}{:02x}{:02x}{:02x}",
            digest[0], digest[1], digest[2], digest[3]
        );
        assert_eq!(tokens[1], expected);
    }

    #[test]
    fn test_compose_embedding_text() {
        let data = jpeg_prefixed(10);
        let tokens = image_tokens(&data).join(" ");

        assert_eq!(
            compose_embedding_text("  cat photo ", &data),
            format!("cat photo {}", tokens)
        );
        assert_eq!(compose_embedding_text("", &data), tokens);
        assert_eq!(compose_embedding_text("   ", &data), tokens);
    }
}
