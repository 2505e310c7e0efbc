//! InMemoryRecordStore - real-time document store held in process memory.
//!
//! Behaves like the remote store the dashboard talks to: full-state
//! snapshots on every change, store-assigned identifiers, simulated
//! connection loss, store-side validation and optional per-call latency.

use crate::error::StoreError;
use crate::store::RecordStore;
use crate::subscription::{SnapshotEvent, Subscription};
use crate::types::{Attributes, CollectionPath, Record, RecordId, Snapshot};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

/// Custom store-side constraint
pub type Validator = Arc<dyn Fn(&Attributes) -> Result<(), String> + Send + Sync>;

type ListenerId = u64;

#[derive(Default)]
struct CollectionState {
    /// Records in insertion order
    records: IndexMap<RecordId, Attributes>,
    listeners: HashMap<ListenerId, mpsc::UnboundedSender<SnapshotEvent>>,
}

impl CollectionState {
    fn snapshot(&self, path: &CollectionPath) -> Snapshot {
        let records = self
            .records
            .iter()
            .map(|(id, attrs)| Record::new(id.clone(), attrs.clone()))
            .collect();
        Snapshot::new(path.clone(), records)
    }

    /// Push the current state to every live listener, dropping closed ones
    fn emit(&mut self, path: &CollectionPath) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot(path);
        self.listeners
            .retain(|_, tx| tx.send(Ok(snapshot.clone())).is_ok());
    }
}

#[derive(Default)]
struct Inner {
    collections: HashMap<CollectionPath, CollectionState>,
    next_listener: ListenerId,
}

/// In-memory record store.
///
/// Clone-friendly via Arc; clones share the same data and listeners.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    inner: Arc<Mutex<Inner>>,
    online: Arc<AtomicBool>,
    latency: Option<Duration>,
    validator: Option<Validator>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    /// Create a new empty, connected store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            online: Arc::new(AtomicBool::new(true)),
            latency: None,
            validator: None,
        }
    }

    /// Delay every operation by `latency`, making each call a real suspension point.
    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add a store-side constraint checked on create and update.
    #[must_use]
    pub fn with_validator(
        mut self,
        validator: impl Fn(&Attributes) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Simulate connection loss or recovery.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        tracing::info!(online, "in-memory store connectivity changed");
    }

    /// Check simulated connectivity
    #[inline]
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Deliver a listener error to every subscription on `collection`.
    pub fn inject_error(&self, collection: &CollectionPath, message: impl Into<String>) {
        let message = message.into();
        let mut inner = self.inner.lock();
        if let Some(state) = inner.collections.get_mut(collection) {
            state.listeners.retain(|_, tx| {
                tx.send(Err(StoreError::StoreUnavailable(message.clone())))
                    .is_ok()
            });
        }
    }

    /// Current records of a collection, in insertion order
    #[must_use]
    pub fn records(&self, collection: &CollectionPath) -> Vec<Record> {
        let inner = self.inner.lock();
        inner
            .collections
            .get(collection)
            .map(|state| state.snapshot(collection).records)
            .unwrap_or_default()
    }

    /// Number of live listeners on a collection
    #[must_use]
    pub fn active_listeners(&self, collection: &CollectionPath) -> usize {
        let inner = self.inner.lock();
        inner
            .collections
            .get(collection)
            .map_or(0, |state| state.listeners.len())
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(StoreError::StoreUnavailable("no active connection".into()))
        }
    }

    fn check_attributes(&self, attributes: &Attributes) -> Result<(), StoreError> {
        if attributes.is_empty() {
            return Err(StoreError::ValidationRejected(
                "document must contain at least one field".into(),
            ));
        }
        for key in attributes.keys() {
            if key.is_empty() {
                return Err(StoreError::ValidationRejected(
                    "field names must be non-empty".into(),
                ));
            }
            if key.starts_with("__") {
                return Err(StoreError::ValidationRejected(format!(
                    "field name '{key}' is reserved"
                )));
            }
        }
        if let Some(validator) = &self.validator {
            validator(attributes).map_err(StoreError::ValidationRejected)?;
        }
        Ok(())
    }

    fn release_listener(inner: &Weak<Mutex<Inner>>, collection: &CollectionPath, id: ListenerId) {
        // Store already gone: nothing left to release
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock();
        if let Some(state) = inner.collections.get_mut(collection) {
            state.listeners.remove(&id);
        }
        tracing::debug!(%collection, listener = id, "listener released");
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn subscribe(&self, collection: &CollectionPath) -> Result<Subscription, StoreError> {
        self.delay().await;
        self.ensure_online()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let listener = {
            let mut inner = self.inner.lock();
            let listener = inner.next_listener;
            inner.next_listener += 1;

            let state = inner.collections.entry(collection.clone()).or_default();
            // Initial state is delivered before any later change
            let _ = tx.send(Ok(state.snapshot(collection)));
            state.listeners.insert(listener, tx);
            listener
        };
        tracing::debug!(%collection, listener, "listener registered");

        let weak = Arc::downgrade(&self.inner);
        let path = collection.clone();
        Ok(Subscription::new(collection.clone(), rx, move || {
            Self::release_listener(&weak, &path, listener);
        }))
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        attributes: Attributes,
    ) -> Result<RecordId, StoreError> {
        self.delay().await;
        self.ensure_online()?;
        self.check_attributes(&attributes)?;

        let id = RecordId::generate();
        let mut inner = self.inner.lock();
        let state = inner.collections.entry(collection.clone()).or_default();
        state.records.insert(id.clone(), attributes);
        state.emit(collection);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &RecordId,
        attributes: Attributes,
    ) -> Result<(), StoreError> {
        self.delay().await;
        self.ensure_online()?;
        self.check_attributes(&attributes)?;

        let mut inner = self.inner.lock();
        let state = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let existing = state
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        existing.extend(attributes);
        state.emit(collection);
        Ok(())
    }

    async fn delete(&self, collection: &CollectionPath, id: &RecordId) -> Result<(), StoreError> {
        self.delay().await;
        self.ensure_online()?;

        let mut inner = self.inner.lock();
        let state = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        // shift_remove keeps the insertion order of the remaining records
        if state.records.shift_remove(id).is_none() {
            return Err(StoreError::not_found(collection, id));
        }
        state.emit(collection);
        Ok(())
    }

    async fn count_existing(&self, collection: &CollectionPath) -> Result<usize, StoreError> {
        self.delay().await;
        self.ensure_online()?;

        let inner = self.inner.lock();
        Ok(inner
            .collections
            .get(collection)
            .map_or(0, |state| state.records.len()))
    }

    async fn create_all_if_empty(
        &self,
        collection: &CollectionPath,
        entries: Vec<Attributes>,
    ) -> Result<Option<Vec<RecordId>>, StoreError> {
        self.delay().await;
        self.ensure_online()?;
        for entry in &entries {
            self.check_attributes(entry)?;
        }

        let mut inner = self.inner.lock();
        let state = inner.collections.entry(collection.clone()).or_default();
        if !state.records.is_empty() {
            return Ok(None);
        }

        let ids: Vec<RecordId> = entries
            .into_iter()
            .map(|attributes| {
                let id = RecordId::generate();
                state.records.insert(id.clone(), attributes);
                id
            })
            .collect();
        // One snapshot for the whole batch
        state.emit(collection);
        Ok(Some(ids))
    }
}

impl fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("online", &self.is_online())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path() -> CollectionPath {
        CollectionPath::shared("test-app", "equipment")
    }

    fn attrs(name: &str) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), json!(name));
        attrs
    }

    #[tokio::test]
    async fn create_and_count() {
        let store = InMemoryRecordStore::new();
        assert_eq!(store.count_existing(&path()).await.unwrap(), 0);

        store.create(&path(), attrs("Bench Vice")).await.unwrap();
        store.create(&path(), attrs("Hex Keys")).await.unwrap();

        assert_eq!(store.count_existing(&path()).await.unwrap(), 2);
        let names: Vec<_> = store
            .records(&path())
            .iter()
            .map(|r| r.text("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Bench Vice", "Hex Keys"]);
    }

    #[tokio::test]
    async fn update_merges_attributes() {
        let store = InMemoryRecordStore::new();
        let mut initial = attrs("Multimeter");
        initial.insert("status".into(), json!("Operational"));
        let id = store.create(&path(), initial).await.unwrap();

        let mut patch = Attributes::new();
        patch.insert("status".into(), json!("Repair"));
        store.update(&path(), &id, patch).await.unwrap();

        let record = &store.records(&path())[0];
        assert_eq!(record.id, id);
        assert_eq!(record.text("name"), Some("Multimeter"));
        assert_eq!(record.text("status"), Some("Repair"));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemoryRecordStore::new();
        let err = store
            .update(&path(), &RecordId::new("ghost"), attrs("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = InMemoryRecordStore::new();
        let id = store.create(&path(), attrs("Tape")).await.unwrap();
        store.delete(&path(), &id).await.unwrap();

        let err = store.delete(&path(), &id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = InMemoryRecordStore::new();
        store.set_online(false);

        let err = store.create(&path(), attrs("Rags")).await.unwrap_err();
        assert!(matches!(err, StoreError::StoreUnavailable(_)));
        assert!(store.subscribe(&path()).await.is_err());

        store.set_online(true);
        assert!(store.create(&path(), attrs("Rags")).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_reserved_and_empty_documents() {
        let store = InMemoryRecordStore::new();

        let err = store.create(&path(), Attributes::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::ValidationRejected(_)));

        let mut reserved = attrs("x");
        reserved.insert("__name__".into(), json!("y"));
        let err = store.create(&path(), reserved).await.unwrap_err();
        assert!(matches!(err, StoreError::ValidationRejected(_)));
    }

    #[tokio::test]
    async fn custom_validator_applies() {
        let store = InMemoryRecordStore::new().with_validator(|attrs| {
            if attrs.contains_key("name") {
                Ok(())
            } else {
                Err("name is required".into())
            }
        });

        let mut nameless = Attributes::new();
        nameless.insert("status".into(), json!("Needed"));
        let err = store.create(&path(), nameless).await.unwrap_err();
        assert_eq!(err, StoreError::ValidationRejected("name is required".into()));
    }

    #[tokio::test]
    async fn subscription_receives_initial_and_changes() {
        let store = InMemoryRecordStore::new();
        let mut sub = store.subscribe(&path()).await.unwrap();

        let initial = sub.next_event().await.unwrap().unwrap();
        assert!(initial.is_empty());

        let id = store.create(&path(), attrs("Safety Glasses")).await.unwrap();
        let after = sub.next_event().await.unwrap().unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after.records[0].id, id);
    }

    #[tokio::test]
    async fn injected_errors_keep_stream_open() {
        let store = InMemoryRecordStore::new();
        let mut sub = store.subscribe(&path()).await.unwrap();
        let _ = sub.next_event().await;

        store.inject_error(&path(), "permission denied");
        let err = sub.next_event().await.unwrap().unwrap_err();
        assert_eq!(err, StoreError::StoreUnavailable("permission denied".into()));

        store.create(&path(), attrs("Duct Tape")).await.unwrap();
        let snapshot = sub.next_event().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_releases_listener() {
        let store = InMemoryRecordStore::new();
        let mut sub = store.subscribe(&path()).await.unwrap();
        let other = store.subscribe(&path()).await.unwrap();
        assert_eq!(store.active_listeners(&path()), 2);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(store.active_listeners(&path()), 1);

        drop(other);
        assert_eq!(store.active_listeners(&path()), 0);
    }

    #[tokio::test]
    async fn create_all_if_empty_is_conditional() {
        let store = InMemoryRecordStore::new();
        let batch = vec![attrs("a"), attrs("b")];

        let first = store
            .create_all_if_empty(&path(), batch.clone())
            .await
            .unwrap();
        assert_eq!(first.map(|ids| ids.len()), Some(2));

        let second = store.create_all_if_empty(&path(), batch).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.count_existing(&path()).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_operations() {
        let store = InMemoryRecordStore::new().with_latency(Duration::from_millis(50));
        let start = tokio::time::Instant::now();

        store.create(&path(), attrs("Compressor")).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
