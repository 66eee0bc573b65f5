//! Value types passed across the search service boundary.
//!
//! Everything here is built per request and dropped once the request
//! completes. Metadata is kept as JSON values so arbitrary caller-supplied
//! structure survives storage untouched.

use serde::{Deserialize, Serialize};

use crate::errors::SearchError;

/// Arbitrary caller metadata attached to a document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Fixed-length signature vector.
pub type Embedding = Vec<f32>;

/// A document as handed to the service before it has an embedding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DocumentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.content.trim().is_empty() {
            return Err(SearchError::validation("content", "content is required"));
        }
        Ok(())
    }
}

/// A stored document, as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing)]
    pub embedding: Embedding,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(default)]
    pub score: f32,
}

/// An image to index, with the caller's description of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageInput {
    pub description: String,
    pub image_data: Vec<u8>,
    pub metadata: Metadata,
}

impl ImageInput {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.description.trim().is_empty() {
            return Err(SearchError::validation(
                "description",
                "description is required",
            ));
        }
        if self.image_data.is_empty() {
            return Err(SearchError::validation("image_data", "image is required"));
        }
        Ok(())
    }
}

/// An image similarity search with an optional textual hint.
///
/// A `limit` of zero asks for the default result count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageQuery {
    pub image_data: Vec<u8>,
    pub description: Option<String>,
    pub limit: usize,
}

impl ImageQuery {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.image_data.is_empty() {
            return Err(SearchError::validation("image_data", "image is required"));
        }
        Ok(())
    }
}

/// The shape image results are returned in. Never carries internal keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDocument {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub score: f32,
}

/// A similarity search as supplied by a caller that already holds a vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    pub query_vector: Embedding,
    pub limit: usize,
    #[serde(default)]
    pub num_candidates: Option<usize>,
    #[serde(default)]
    pub filter: Option<Metadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_input_requires_content() {
        let err = DocumentInput::new("").validate().unwrap_err();
        assert_eq!(err.field(), Some("content"));

        let err = DocumentInput::new("  \n\t ").validate().unwrap_err();
        assert!(err.is_validation());

        assert!(DocumentInput::new("hello").validate().is_ok());
    }

    #[test]
    fn test_image_input_validation() {
        let input = ImageInput {
            description: "   ".to_string(),
            image_data: vec![0xFF, 0xD8, 0xFF],
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap_err().field(), Some("description"));

        let input = ImageInput {
            description: "cat".to_string(),
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap_err().field(), Some("image_data"));
    }

    #[test]
    fn test_image_query_requires_data() {
        let query = ImageQuery::default();
        assert_eq!(query.validate().unwrap_err().field(), Some("image_data"));
    }

    #[test]
    fn test_document_json_omits_embedding_and_empty_metadata() {
        let doc = Document {
            id: "01".to_string(),
            content: "x".to_string(),
            embedding: vec![1.0],
            metadata: Metadata::new(),
            score: 0.5,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("metadata").is_none());
        assert!(json.get("embedding").is_none());
        assert_eq!(json["id"], "01");
        assert_eq!(json["score"], 0.5);
    }
}
