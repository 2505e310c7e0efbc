//! ShopSmart Sync - collection synchronization and reconciliation
//!
//! Keeps the workshop dashboard's three collections (equipment, maintenance,
//! projects) in step with the remote store:
//! - Waits for the session, then subscribes per collection
//! - Seeds each collection's default dataset exactly once
//! - Publishes a deterministically ordered view per snapshot
//! - Gates create/update/delete on the session and reports every outcome
//!
//! # Example
//!
//! ```rust,ignore
//! use shopsmart_sync::prelude::*;
//! use shopsmart_store::InMemoryRecordStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryRecordStore::new());
//! let auth = LocalAuthProvider::new();
//! let dashboard = Dashboard::start(DashboardConfig::default(), store, &auth).await?;
//!
//! let view = dashboard.equipment().sync().wait_for_view(|v| v.len() == 14).await;
//! let mut form = FormState::default();
//! form.open_create();
//! dashboard
//!     .equipment()
//!     .gateway()
//!     .save_document(&mut form, &Equipment::new("Drill Press", "Power Tool"))
//!     .await?;
//! dashboard.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod auth;
pub mod collection;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod documents;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod overview;
pub mod projector;
pub mod seed;
pub mod session;
pub mod sync;
pub mod view;

// Re-exports for convenience
pub use auth::{bootstrap, AuthProvider, BootstrapOutcome, LocalAuthProvider};
pub use collection::{CollectionSpec, FormValidator};
pub use config::{DashboardConfig, DEFAULT_APP_ID};
pub use dashboard::{CollectionHandle, Dashboard};
pub use documents::{
    default_attributes, Document, Equipment, MaintenanceEntry, Project, SortDirection,
    EQUIPMENT_CATEGORIES, EQUIPMENT_STATUSES, PROJECT_STATUSES,
};
pub use error::{AuthError, ConfigError, GatewayError, SeedError, SessionError, SyncError};
pub use gateway::{DeleteOutcome, FormMode, FormState, MutationGateway, SaveOutcome};
pub use notify::{
    ActiveNotification, Notification, NotificationCenter, NotificationKind, Notifier,
    DEFAULT_DISMISS_AFTER,
};
pub use overview::ShopOverview;
pub use projector::{CachedView, ViewProjector};
pub use seed::{SeedCoordinator, SeedGuard, SeedOutcome, SeedStrategy};
pub use session::{session_channel, Session, SessionReader, SessionWriter, UserId};
pub use sync::{CollectionSync, SyncHandle, SyncStatus};
pub use view::{Entry, TypedView};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the dashboard
    pub use crate::{
        CachedView, CollectionSpec, Dashboard, DashboardConfig, DeleteOutcome, Document,
        Equipment, FormState, LocalAuthProvider, MaintenanceEntry, MutationGateway, Notification,
        Project, SaveOutcome, SessionReader, SyncStatus, TypedView,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
