//! Testing utilities for the ShopSmart workspace
//!
//! Shared store wrappers, notifiers and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use shopsmart_store::{Attributes, CollectionPath, RecordId, RecordStore, StoreError, Subscription};
use shopsmart_sync::{Notification, Notifier, Session, SessionReader, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-operation call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub subscribe: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub count_existing: usize,
    pub create_all_if_empty: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.subscribe
            + self.create
            + self.update
            + self.delete
            + self.count_existing
            + self.create_all_if_empty
    }

    pub fn mutations(&self) -> usize {
        self.create + self.update + self.delete + self.create_all_if_empty
    }
}

#[derive(Debug, Default)]
struct Counters {
    subscribe: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
    count_existing: AtomicUsize,
    create_all_if_empty: AtomicUsize,
}

/// Store wrapper that counts calls and can inject failures
pub struct CountingStore {
    inner: Arc<dyn RecordStore>,
    counters: Counters,
    failure: Mutex<Option<StoreError>>,
    conditional: bool,
}

impl CountingStore {
    pub fn new(inner: impl RecordStore + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            counters: Counters::default(),
            failure: Mutex::new(None),
            conditional: true,
        }
    }

    /// Hide the inner store's transactional insert-if-empty
    pub fn without_conditional(mut self) -> Self {
        self.conditional = false;
        self
    }

    /// Fail every following call with `error` until cleared
    pub fn fail_with(&self, error: StoreError) {
        *self.failure.lock() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            subscribe: c.subscribe.load(Ordering::SeqCst),
            create: c.create.load(Ordering::SeqCst),
            update: c.update.load(Ordering::SeqCst),
            delete: c.delete.load(Ordering::SeqCst),
            count_existing: c.count_existing.load(Ordering::SeqCst),
            create_all_if_empty: c.create_all_if_empty.load(Ordering::SeqCst),
        }
    }

    fn enter(&self, counter: &AtomicUsize) -> Result<(), StoreError> {
        counter.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn subscribe(&self, collection: &CollectionPath) -> Result<Subscription, StoreError> {
        self.enter(&self.counters.subscribe)?;
        self.inner.subscribe(collection).await
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        attributes: Attributes,
    ) -> Result<RecordId, StoreError> {
        self.enter(&self.counters.create)?;
        self.inner.create(collection, attributes).await
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &RecordId,
        attributes: Attributes,
    ) -> Result<(), StoreError> {
        self.enter(&self.counters.update)?;
        self.inner.update(collection, id, attributes).await
    }

    async fn delete(&self, collection: &CollectionPath, id: &RecordId) -> Result<(), StoreError> {
        self.enter(&self.counters.delete)?;
        self.inner.delete(collection, id).await
    }

    async fn count_existing(&self, collection: &CollectionPath) -> Result<usize, StoreError> {
        self.enter(&self.counters.count_existing)?;
        self.inner.count_existing(collection).await
    }

    async fn create_all_if_empty(
        &self,
        collection: &CollectionPath,
        entries: Vec<Attributes>,
    ) -> Result<Option<Vec<RecordId>>, StoreError> {
        self.enter(&self.counters.create_all_if_empty)?;
        if !self.conditional {
            return Err(StoreError::Unsupported("create_all_if_empty"));
        }
        self.inner.create_all_if_empty(collection, entries).await
    }
}

/// Notifier that keeps every notification
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.seen.lock().iter().map(|n| n.message.clone()).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}

pub fn signed_in(user: &str) -> SessionReader {
    SessionReader::fixed(Session::authenticated(UserId::new(user)))
}

pub fn not_ready() -> SessionReader {
    SessionReader::fixed(Session::pending())
}

pub fn ready_without_identity() -> SessionReader {
    SessionReader::fixed(Session::unauthenticated())
}

pub fn equipment_attrs(name: &str, acquisition_date: &str) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("name".into(), json!(name));
    attrs.insert("category".into(), json!("General Hand Tool"));
    attrs.insert("status".into(), json!("Operational"));
    attrs.insert("acquisitionDate".into(), json!(acquisition_date));
    attrs.insert("notes".into(), json!(""));
    attrs
}
