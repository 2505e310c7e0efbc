//! Error types for store operations

use crate::types::{CollectionPath, RecordId};

/// Store operation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No active connection or backend failure
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Attributes violate store-side constraints
    #[error("validation rejected: {0}")]
    ValidationRejected(String),

    /// Identifier not present in the collection
    #[error("record {id} not found in {collection}")]
    NotFound {
        /// Collection that was searched
        collection: CollectionPath,
        /// Missing identifier
        id: RecordId,
    },

    /// Optional capability not offered by this store
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl StoreError {
    /// Check if the error is a stale-identifier miss
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if a retry could succeed once the connection comes back
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Create not-found error
    #[inline]
    pub fn not_found(collection: &CollectionPath, id: &RecordId) -> Self {
        Self::NotFound {
            collection: collection.clone(),
            id: id.clone(),
        }
    }
}
