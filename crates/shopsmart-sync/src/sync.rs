//! Collection synchronization
//!
//! One [`CollectionSync`] task per collection:
//! - waits for the session to become ready
//! - opens a store subscription
//! - on every snapshot: seeds if empty, then publishes a freshly projected
//!   [`CachedView`]
//! - keeps going through listener errors
//!
//! Snapshots are applied in arrival order, one at a time. The last applied
//! snapshot is the published view.

use crate::collection::CollectionSpec;
use crate::notify::{Notification, Notifier};
use crate::projector::CachedView;
use crate::seed::{SeedCoordinator, SeedGuard, SeedOutcome, SeedStrategy};
use crate::session::SessionReader;
use parking_lot::Mutex;
use shopsmart_store::{CollectionPath, RecordStore, Subscription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle of a sync task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Waiting for the session
    WaitingForSession,
    /// Subscribed and applying snapshots
    Live,
    /// Session became ready without an identity; never subscribed
    NoIdentity,
    /// Subscription could not be opened
    SubscribeFailed(String),
    /// Stopped; listener released
    Stopped,
}

/// Builder for a collection sync task
#[derive(Clone)]
pub struct CollectionSync {
    store: Arc<dyn RecordStore>,
    session: SessionReader,
    notifier: Arc<dyn Notifier>,
    spec: CollectionSpec,
    path: CollectionPath,
    strategy: SeedStrategy,
    coordinator: SeedCoordinator,
}

impl CollectionSync {
    /// Create sync with the default seeding strategy.
    ///
    /// Every sync on the same path in one process must share `coordinator`,
    /// otherwise each seeds independently.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        session: SessionReader,
        notifier: Arc<dyn Notifier>,
        spec: CollectionSpec,
        path: CollectionPath,
        coordinator: SeedCoordinator,
    ) -> Self {
        Self {
            store,
            session,
            notifier,
            spec,
            path,
            strategy: SeedStrategy::default(),
            coordinator,
        }
    }

    /// Seeding strategy
    #[inline]
    #[must_use]
    pub fn with_seed_strategy(mut self, strategy: SeedStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Start the task on the current runtime
    #[must_use]
    pub fn spawn(self) -> SyncHandle {
        let (view_tx, view_rx) = watch::channel(CachedView::default());
        let (status_tx, status_rx) = watch::channel(SyncStatus::WaitingForSession);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let path = self.path.clone();

        let task = tokio::spawn(self.run(view_tx, status_tx, shutdown_rx));

        SyncHandle {
            path,
            view: view_rx,
            status: status_rx,
            shutdown: shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    async fn run(
        self,
        view_tx: watch::Sender<CachedView>,
        status_tx: watch::Sender<SyncStatus>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let Some(mut subscription) = self.open(&status_tx, &mut shutdown).await else {
            return;
        };
        status_tx.send_replace(SyncStatus::Live);

        let guard = SeedGuard::new(
            Arc::clone(&self.store),
            self.path.clone(),
            self.spec.defaults(),
            self.strategy,
            self.coordinator.clone(),
        );
        let mut revision = 0u64;

        loop {
            let event = tokio::select! {
                biased;
                () = stop_requested(&mut shutdown) => break,
                event = subscription.next_event() => event,
            };

            match event {
                Some(Ok(snapshot)) => {
                    tracing::debug!(collection = %self.path, records = snapshot.len(), "snapshot");
                    let outcome = guard.on_snapshot(&snapshot).await;
                    if outcome != SeedOutcome::NotNeeded {
                        tracing::debug!(collection = %self.path, ?outcome, "seed check");
                    }
                    revision += 1;
                    view_tx.send_replace(self.spec.projector().project(&snapshot, revision));
                }
                Some(Err(e)) => {
                    tracing::error!(collection = %self.path, "listener error: {e}");
                    self.notifier
                        .notify(Notification::error(self.spec.load_failure_message(&e)));
                }
                None => {
                    tracing::warn!(collection = %self.path, "subscription closed by store");
                    break;
                }
            }
        }

        subscription.unsubscribe();
        tracing::info!(collection = %self.path, revision, "sync stopped");
        status_tx.send_replace(SyncStatus::Stopped);
    }

    /// Wait for the session, then subscribe. `None` if the loop must not start.
    async fn open(
        &self,
        status_tx: &watch::Sender<SyncStatus>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<Subscription> {
        let mut session = self.session.clone();
        let ready = tokio::select! {
            biased;
            () = stop_requested(shutdown) => {
                status_tx.send_replace(SyncStatus::Stopped);
                return None;
            }
            ready = session.wait_ready() => ready,
        };

        let session = match ready {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(collection = %self.path, "session never became ready: {e}");
                status_tx.send_replace(SyncStatus::Stopped);
                return None;
            }
        };

        let Some(identity) = session.identity() else {
            let message = self.spec.missing_identity_message();
            tracing::error!(collection = %self.path, "{message}");
            self.notifier.notify(Notification::error(message));
            status_tx.send_replace(SyncStatus::NoIdentity);
            return None;
        };

        match self.store.subscribe(&self.path).await {
            Ok(subscription) => {
                tracing::info!(collection = %self.path, user = %identity, "subscribed");
                Some(subscription)
            }
            Err(e) => {
                tracing::error!(collection = %self.path, "subscribe failed: {e}");
                self.notifier
                    .notify(Notification::error(self.spec.load_failure_message(&e)));
                status_tx.send_replace(SyncStatus::SubscribeFailed(e.to_string()));
                None
            }
        }
    }
}

impl fmt::Debug for CollectionSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSync")
            .field("path", &self.path)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Resolves once stop was requested or the handle is gone
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Handle to a running sync task
#[derive(Debug)]
pub struct SyncHandle {
    path: CollectionPath,
    view: watch::Receiver<CachedView>,
    status: watch::Receiver<SyncStatus>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncHandle {
    /// Collection being synced
    #[inline]
    #[must_use]
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Latest published view
    #[must_use]
    pub fn view(&self) -> CachedView {
        self.view.borrow().clone()
    }

    /// Watch published views
    #[must_use]
    pub fn subscribe_view(&self) -> watch::Receiver<CachedView> {
        self.view.clone()
    }

    /// Current task status
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Wait until a published view satisfies `predicate`.
    ///
    /// Returns `None` if the task ended first.
    pub async fn wait_for_view(
        &self,
        predicate: impl FnMut(&CachedView) -> bool,
    ) -> Option<CachedView> {
        let mut rx = self.view.clone();
        let view = rx.wait_for(predicate).await.ok()?;
        Some(view.clone())
    }

    /// Wait until the task reaches a status
    pub async fn wait_for_status(
        &self,
        predicate: impl FnMut(&SyncStatus) -> bool,
    ) -> Option<SyncStatus> {
        let mut rx = self.status.clone();
        let status = rx.wait_for(predicate).await.ok()?;
        Some(status.clone())
    }

    /// Stop the task and release the store listener. Safe to call repeatedly.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(collection = %self.path, "sync task ended abnormally: {e}");
            }
        }
    }

    /// Check if stop was requested
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        // The task notices the closed channel and releases its listener
        self.shutdown.send_replace(true);
    }
}
