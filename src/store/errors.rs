use super::document::DocumentKey;
use crate::utils::IsTransient;

// ============================================================================
// Store Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Write conflict on {key}: read version {expected}, found {actual}")]
    Conflict {
        key: DocumentKey,
        expected: u64,
        actual: u64,
    },

    #[error("Transaction gave up after {attempts} conflicting attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Document not found: {0}")]
    DocumentMissing(DocumentKey),

    #[error("Cannot read {0} after writing it in the same transaction")]
    ReadAfterWrite(DocumentKey),

    #[error("Documents must serialize to a JSON object")]
    NotAnObject,

    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
