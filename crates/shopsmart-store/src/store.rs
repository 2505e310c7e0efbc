//! RecordStore - abstract persistence with real-time change notification

use crate::error::StoreError;
use crate::subscription::Subscription;
use crate::types::{Attributes, CollectionPath, RecordId};
use async_trait::async_trait;
use std::sync::Arc;

/// Remote collection store.
///
/// All records in a collection are owned by the store; callers only ever see
/// derived snapshots. Conflicts resolve as last write wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a live subscription.
    ///
    /// The first item is the current state; a new snapshot follows every
    /// change. Listener errors arrive as `Err` items and do not end the stream.
    async fn subscribe(&self, collection: &CollectionPath) -> Result<Subscription, StoreError>;

    /// Insert one record and return its store-assigned identifier.
    ///
    /// # Errors
    /// - `StoreError::StoreUnavailable` without an active connection
    /// - `StoreError::ValidationRejected` on store-side constraint violations
    async fn create(
        &self,
        collection: &CollectionPath,
        attributes: Attributes,
    ) -> Result<RecordId, StoreError>;

    /// Merge attributes into an existing record.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the identifier is absent
    async fn update(
        &self,
        collection: &CollectionPath,
        id: &RecordId,
        attributes: Attributes,
    ) -> Result<(), StoreError>;

    /// Remove a record.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the identifier is absent
    async fn delete(&self, collection: &CollectionPath, id: &RecordId) -> Result<(), StoreError>;

    /// One-shot read of the current record count
    async fn count_existing(&self, collection: &CollectionPath) -> Result<usize, StoreError>;

    /// Transactional insert-if-empty.
    ///
    /// Returns `None` without writing when the collection already holds
    /// records. Stores without transactions keep the default, which reports
    /// `StoreError::Unsupported`.
    async fn create_all_if_empty(
        &self,
        _collection: &CollectionPath,
        _entries: Vec<Attributes>,
    ) -> Result<Option<Vec<RecordId>>, StoreError> {
        Err(StoreError::Unsupported("create_all_if_empty"))
    }
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn subscribe(&self, collection: &CollectionPath) -> Result<Subscription, StoreError> {
        (**self).subscribe(collection).await
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        attributes: Attributes,
    ) -> Result<RecordId, StoreError> {
        (**self).create(collection, attributes).await
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &RecordId,
        attributes: Attributes,
    ) -> Result<(), StoreError> {
        (**self).update(collection, id, attributes).await
    }

    async fn delete(&self, collection: &CollectionPath, id: &RecordId) -> Result<(), StoreError> {
        (**self).delete(collection, id).await
    }

    async fn count_existing(&self, collection: &CollectionPath) -> Result<usize, StoreError> {
        (**self).count_existing(collection).await
    }

    async fn create_all_if_empty(
        &self,
        collection: &CollectionPath,
        entries: Vec<Attributes>,
    ) -> Result<Option<Vec<RecordId>>, StoreError> {
        (**self).create_all_if_empty(collection, entries).await
    }
}
