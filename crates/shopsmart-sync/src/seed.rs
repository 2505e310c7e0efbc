//! First-run seeding
//!
//! A [`SeedGuard`] inserts a collection's default dataset when the collection
//! is observed empty. An empty snapshot is never trusted on its own: the
//! guard re-checks emptiness under a per-path lock held by the shared
//! [`SeedCoordinator`], so concurrent or re-entrant emptiness signals in one
//! process cannot double-seed.
//!
//! The coordinator also remembers paths that have held records, so a
//! collection emptied later by its users is not seeded a second time.
//!
//! Two independent processes using [`SeedStrategy::Recheck`] can still both
//! recount zero before either inserts. [`SeedStrategy::Conditional`] closes
//! that gap on stores with transactional insert-if-empty.

use crate::error::SeedError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shopsmart_store::{Attributes, CollectionPath, RecordStore, Snapshot, StoreError};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// How the guard performs the insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedStrategy {
    /// Recount, then insert entries one at a time
    #[default]
    Recheck,
    /// Transactional insert-if-empty, falling back to `Recheck`
    Conditional,
}

impl fmt::Display for SeedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recheck => f.write_str("recheck"),
            Self::Conditional => f.write_str("conditional"),
        }
    }
}

impl FromStr for SeedStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recheck" => Ok(Self::Recheck),
            "conditional" => Ok(Self::Conditional),
            other => Err(format!("unknown seed strategy '{other}'")),
        }
    }
}

/// What a seeding attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Snapshot was non-empty, or there is nothing to seed
    NotNeeded,
    /// Collection held records by the time the guard re-checked
    AlreadySeeded,
    /// Default entries were inserted
    Seeded {
        /// Entries written
        inserted: usize,
        /// Entries that failed
        failed: usize,
    },
    /// The re-check itself failed; nothing was inserted
    RecountFailed,
}

#[derive(Debug, Default)]
struct PathState {
    lock: Mutex<()>,
    settled: AtomicBool,
}

/// Serializes seeding per collection path within a process
#[derive(Debug, Clone, Default)]
pub struct SeedCoordinator {
    paths: Arc<DashMap<CollectionPath, Arc<PathState>>>,
}

impl SeedCoordinator {
    /// Create coordinator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the path is known to have held records
    #[must_use]
    pub fn is_settled(&self, path: &CollectionPath) -> bool {
        self.paths
            .get(path)
            .is_some_and(|state| state.settled.load(Ordering::SeqCst))
    }

    fn state_for(&self, path: &CollectionPath) -> Arc<PathState> {
        self.paths.entry(path.clone()).or_default().clone()
    }

    fn settle(&self, path: &CollectionPath) {
        self.state_for(path).settled.store(true, Ordering::SeqCst);
    }
}

/// Seeds one collection's default dataset at most once
#[derive(Clone)]
pub struct SeedGuard {
    store: Arc<dyn RecordStore>,
    path: CollectionPath,
    defaults: Arc<[Attributes]>,
    strategy: SeedStrategy,
    coordinator: SeedCoordinator,
}

impl SeedGuard {
    /// Create guard
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        path: CollectionPath,
        defaults: Arc<[Attributes]>,
        strategy: SeedStrategy,
        coordinator: SeedCoordinator,
    ) -> Self {
        Self {
            store,
            path,
            defaults,
            strategy,
            coordinator,
        }
    }

    /// Seed if the snapshot shows an empty collection
    pub async fn on_snapshot(&self, snapshot: &Snapshot) -> SeedOutcome {
        if !snapshot.is_empty() {
            self.coordinator.settle(&self.path);
            return SeedOutcome::NotNeeded;
        }
        self.ensure_seeded().await
    }

    /// Re-check emptiness and seed if still empty
    pub async fn ensure_seeded(&self) -> SeedOutcome {
        if self.defaults.is_empty() {
            return SeedOutcome::NotNeeded;
        }

        let state = self.coordinator.state_for(&self.path);
        let _held = state.lock.lock().await;
        if state.settled.load(Ordering::SeqCst) {
            return SeedOutcome::AlreadySeeded;
        }

        let outcome = match self.strategy {
            SeedStrategy::Recheck => self.recheck_and_insert().await,
            SeedStrategy::Conditional => self.insert_if_empty().await,
        };
        match outcome {
            SeedOutcome::AlreadySeeded | SeedOutcome::Seeded { inserted: 1.., .. } => {
                state.settled.store(true, Ordering::SeqCst);
            }
            _ => {}
        }
        outcome
    }

    async fn insert_if_empty(&self) -> SeedOutcome {
        let total = self.defaults.len();
        match self
            .store
            .create_all_if_empty(&self.path, self.defaults.to_vec())
            .await
        {
            Ok(Some(ids)) => {
                tracing::info!(
                    collection = %self.path,
                    inserted = ids.len(),
                    "seeded default dataset"
                );
                SeedOutcome::Seeded {
                    inserted: ids.len(),
                    failed: total.saturating_sub(ids.len()),
                }
            }
            Ok(None) => {
                tracing::debug!(collection = %self.path, "collection already seeded");
                SeedOutcome::AlreadySeeded
            }
            Err(StoreError::Unsupported(_)) => {
                tracing::debug!(
                    collection = %self.path,
                    "conditional insert unsupported, rechecking"
                );
                self.recheck_and_insert().await
            }
            Err(e) => {
                tracing::error!(
                    collection = %self.path,
                    "{}: {e}",
                    SeedError::PartialFailure { failed: total, total }
                );
                SeedOutcome::Seeded {
                    inserted: 0,
                    failed: total,
                }
            }
        }
    }

    async fn recheck_and_insert(&self) -> SeedOutcome {
        match self.store.count_existing(&self.path).await {
            Ok(0) => {}
            Ok(existing) => {
                tracing::debug!(collection = %self.path, existing, "collection already seeded");
                return SeedOutcome::AlreadySeeded;
            }
            Err(e) => {
                tracing::error!(collection = %self.path, "seed recount failed: {e}");
                return SeedOutcome::RecountFailed;
            }
        }

        let total = self.defaults.len();
        let mut inserted = 0;
        for (index, entry) in self.defaults.iter().enumerate() {
            match self.store.create(&self.path, entry.clone()).await {
                Ok(_) => inserted += 1,
                Err(e) => {
                    tracing::warn!(
                        collection = %self.path,
                        index,
                        "default entry not inserted: {e}"
                    );
                }
            }
        }

        let failed = total - inserted;
        if failed > 0 {
            let gap = SeedError::PartialFailure { failed, total };
            tracing::error!(collection = %self.path, "{gap}");
        } else {
            tracing::info!(collection = %self.path, inserted, "seeded default dataset");
        }
        SeedOutcome::Seeded { inserted, failed }
    }
}

impl fmt::Debug for SeedGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedGuard")
            .field("path", &self.path)
            .field("defaults", &self.defaults.len())
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
