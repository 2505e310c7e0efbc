//! ShopSmart Store - remote collection abstraction
//!
//! Persistence and real-time change notification for one collection at a time:
//! - [`RecordStore`]: subscribe, create, update, delete, one-shot count
//! - [`Subscription`]: cancellable stream of full-state [`Snapshot`]s
//! - [`InMemoryRecordStore`]: process-local implementation with simulated
//!   connectivity, validation and latency
//!
//! # Example
//!
//! ```rust,ignore
//! use shopsmart_store::{CollectionPath, InMemoryRecordStore, RecordStore};
//!
//! let store = InMemoryRecordStore::new();
//! let path = CollectionPath::shared("default-app-id", "equipment");
//!
//! let mut sub = store.subscribe(&path).await?;
//! let initial = sub.next_event().await.unwrap()?;
//! assert!(initial.is_empty());
//! ```

#![warn(unreachable_pub)]

mod error;
mod in_memory;
mod store;
mod subscription;
mod types;

pub use error::StoreError;
pub use in_memory::{InMemoryRecordStore, Validator};
pub use store::RecordStore;
pub use subscription::{SnapshotEvent, Subscription, UnsubscribeHandle};
pub use types::{Attributes, CollectionPath, Record, RecordId, Snapshot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
