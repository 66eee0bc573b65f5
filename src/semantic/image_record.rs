//! Internal carrier for an image on its way into and out of the store.
//!
//! The store only knows plain documents, so the original description and a
//! copy of the image travel in two reserved metadata keys. This module is the
//! only place that writes or reads them, and it strips them before anything
//! is handed back to a caller.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::errors::SearchError;
use crate::model::{Document, DocumentInput, ImageDocument, ImageInput, Metadata};
use crate::semantic::image_features::{compose_embedding_text, detect_format};

pub(crate) const IMAGE_DESCRIPTION_KEY: &str = "_image_description";
pub(crate) const IMAGE_PAYLOAD_KEY: &str = "_image_payload";

#[derive(Debug, Clone)]
pub(crate) struct ImageRecord {
    /// Text that gets embedded: description plus feature tokens
    composed_text: String,
    description: String,
    image_copy: Vec<u8>,
    metadata: Metadata,
}

impl ImageRecord {
    /// Check the image format and derive the embedding text.
    pub fn new(input: ImageInput) -> Result<Self, SearchError> {
        detect_format(&input.image_data)?;

        Ok(Self {
            composed_text: compose_embedding_text(&input.description, &input.image_data),
            description: input.description,
            image_copy: input.image_data,
            metadata: input.metadata,
        })
    }

    /// Flatten into a plain document, adding the reserved keys.
    pub fn into_document_input(self) -> DocumentInput {
        let mut metadata = self.metadata;
        metadata.insert(
            IMAGE_DESCRIPTION_KEY.to_string(),
            Value::String(self.description),
        );
        metadata.insert(
            IMAGE_PAYLOAD_KEY.to_string(),
            Value::String(STANDARD.encode(&self.image_copy)),
        );

        DocumentInput {
            content: self.composed_text,
            metadata,
        }
    }

    /// Convert a stored document back to the caller-facing image shape.
    ///
    /// The description falls back to the stored content when the reserved
    /// key is missing or empty.
    pub fn unpack(doc: Document) -> ImageDocument {
        let description = match doc.metadata.get(IMAGE_DESCRIPTION_KEY) {
            Some(Value::String(desc)) if !desc.is_empty() => desc.clone(),
            _ => doc.content,
        };

        ImageDocument {
            id: doc.id,
            description,
            metadata: sanitize_metadata(doc.metadata),
            score: doc.score,
        }
    }
}

/// Drop the reserved keys. Returns `None` when nothing is left.
fn sanitize_metadata(mut metadata: Metadata) -> Option<Metadata> {
    metadata.remove(IMAGE_DESCRIPTION_KEY);
    metadata.remove(IMAGE_PAYLOAD_KEY);

    if metadata.is_empty() {
        None
    } else {
        Some(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46]
    }

    fn input(metadata: Metadata) -> ImageInput {
        ImageInput {
            description: "cat photo".to_string(),
            image_data: jpeg(),
            metadata,
        }
    }

    #[test]
    fn test_rejects_unsupported_format() {
        let result = ImageRecord::new(ImageInput {
            description: "gif".to_string(),
            image_data: b"GIF89a".to_vec(),
            metadata: Metadata::new(),
        });
        assert!(matches!(result, Err(SearchError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_document_input_carries_reserved_keys() {
        let mut metadata = Metadata::new();
        metadata.insert("album".to_string(), json!("pets"));

        let doc_input = ImageRecord::new(input(metadata)).unwrap().into_document_input();

        assert!(doc_input.content.starts_with("cat photo pix:"));
        assert_eq!(doc_input.metadata["album"], json!("pets"));
        assert_eq!(doc_input.metadata[IMAGE_DESCRIPTION_KEY], json!("cat photo"));

        let payload = doc_input.metadata[IMAGE_PAYLOAD_KEY].as_str().unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), jpeg());
    }

    #[test]
    fn test_unpack_strips_reserved_keys() {
        let mut metadata = Metadata::new();
        metadata.insert("album".to_string(), json!("pets"));
        let doc_input = ImageRecord::new(input(metadata)).unwrap().into_document_input();

        let doc = Document {
            id: "01ABC".to_string(),
            content: doc_input.content,
            embedding: vec![1.0],
            metadata: doc_input.metadata,
            score: 0.75,
        };

        let image = ImageRecord::unpack(doc);
        assert_eq!(image.id, "01ABC");
        assert_eq!(image.description, "cat photo");
        assert_eq!(image.score, 0.75);

        let metadata = image.metadata.unwrap();
        assert_eq!(metadata.len(), 1);
        assert!(!metadata.contains_key(IMAGE_DESCRIPTION_KEY));
        assert!(!metadata.contains_key(IMAGE_PAYLOAD_KEY));
    }

    #[test]
    fn test_unpack_falls_back_to_content() {
        let mut metadata = Metadata::new();
        metadata.insert(IMAGE_DESCRIPTION_KEY.to_string(), json!(""));
        metadata.insert(IMAGE_PAYLOAD_KEY.to_string(), json!("AAAA"));

        let doc = Document {
            id: "1".to_string(),
            content: "stored content".to_string(),
            embedding: vec![1.0],
            metadata,
            score: 0.0,
        };

        let image = ImageRecord::unpack(doc);
        assert_eq!(image.description, "stored content");
        assert_eq!(image.metadata, None);
    }
}
