use crate::store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SearchError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SearchError::Validation {
            field,
            message: message.into(),
        }
    }

    /// True for failures caused by the caller's input, as opposed to
    /// failures of the store behind the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SearchError::Validation { .. } | SearchError::UnsupportedFormat(_)
        )
    }

    /// The offending input field, when the error is a validation failure.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SearchError::Validation { field, .. } => Some(field),
            SearchError::UnsupportedFormat(_) => Some("image_data"),
            _ => None,
        }
    }
}
