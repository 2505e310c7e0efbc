//! Live snapshot subscriptions
//!
//! A [`Subscription`] is a cancellable stream of full-state snapshots. The
//! server-side listener it holds is released exactly once: on an explicit
//! [`Subscription::unsubscribe`], through any [`UnsubscribeHandle`] clone, or
//! when the subscription is dropped.

use crate::error::StoreError;
use crate::types::{CollectionPath, Snapshot};
use futures::Stream;
use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Item delivered by a subscription: a snapshot or a listener error
pub type SnapshotEvent = Result<Snapshot, StoreError>;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Cloneable, idempotent unsubscribe capability
#[derive(Clone)]
pub struct UnsubscribeHandle {
    release: Arc<Mutex<Option<ReleaseFn>>>,
}

impl UnsubscribeHandle {
    fn new(release: ReleaseFn) -> Self {
        Self {
            release: Arc::new(Mutex::new(Some(release))),
        }
    }

    /// Release the listener. Returns `false` if it was already released.
    pub fn unsubscribe(&self) -> bool {
        // Take under the lock, run outside it
        let release = self.release.lock().take();
        match release {
            Some(release) => {
                release();
                true
            }
            None => false,
        }
    }

    /// Check whether the listener is still held
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.lock().is_some()
    }
}

impl fmt::Debug for UnsubscribeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsubscribeHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Stream of snapshots for one collection
pub struct Subscription {
    collection: CollectionPath,
    receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
    handle: UnsubscribeHandle,
}

impl Subscription {
    /// Wrap a receiver and the function that releases its listener
    pub fn new(
        collection: CollectionPath,
        receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            collection,
            receiver,
            handle: UnsubscribeHandle::new(Box::new(release)),
        }
    }

    /// Collection this subscription listens to
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Handle that can release the listener from elsewhere
    #[inline]
    #[must_use]
    pub fn handle(&self) -> UnsubscribeHandle {
        self.handle.clone()
    }

    /// Check whether the listener is still held
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Wait for the next snapshot or listener error.
    ///
    /// Returns `None` once unsubscribed or when the store goes away.
    pub async fn next_event(&mut self) -> Option<SnapshotEvent> {
        if !self.handle.is_active() {
            return None;
        }
        self.receiver.recv().await
    }

    /// Stop further emissions and release the listener. Idempotent.
    pub fn unsubscribe(&mut self) -> bool {
        let released = self.handle.unsubscribe();
        self.receiver.close();
        released
    }
}

impl Stream for Subscription {
    type Item = SnapshotEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.handle.is_active() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.handle.unsubscribe() {
            tracing::debug!(collection = %self.collection, "subscription released on drop");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Fixture = (Subscription, mpsc::UnboundedSender<SnapshotEvent>, Arc<AtomicUsize>);

    fn counting_subscription() -> Fixture {
        let (tx, rx) = mpsc::unbounded_channel();
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let sub = Subscription::new(CollectionPath::shared("app", "equipment"), rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (sub, tx, released)
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let (mut sub, _tx, released) = counting_subscription();

        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert!(!sub.handle().unsubscribe());
        drop(sub);

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_listener() {
        let (sub, _tx, released) = counting_subscription();
        let handle = sub.handle();
        drop(sub);

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn stream_yields_until_unsubscribed() {
        let (mut sub, tx, _released) = counting_subscription();
        let path = sub.collection().clone();

        tx.send(Ok(Snapshot::new(path.clone(), Vec::new()))).unwrap();
        let first = sub.next().await.unwrap().unwrap();
        assert!(first.is_empty());

        let handle = sub.handle();
        handle.unsubscribe();
        tx.send(Ok(Snapshot::new(path, Vec::new()))).unwrap();

        assert!(sub.next().await.is_none());
    }
}
