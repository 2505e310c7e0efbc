//! Dashboard assembly
//!
//! Wires one session, one notification center and the three collections
//! (sync task + mutation gateway each) from a [`DashboardConfig`].

use crate::auth::{bootstrap, AuthProvider, BootstrapOutcome};
use crate::collection::CollectionSpec;
use crate::config::DashboardConfig;
use crate::documents::{Document, Equipment, MaintenanceEntry, Project};
use crate::error::{SessionError, SyncError};
use crate::gateway::MutationGateway;
use crate::notify::{NotificationCenter, Notifier};
use crate::overview::ShopOverview;
use crate::seed::SeedCoordinator;
use crate::session::{session_channel, SessionReader, SessionWriter, UserId};
use crate::sync::{CollectionSync, SyncHandle};
use crate::view::TypedView;
use chrono::NaiveDate;
use parking_lot::Mutex;
use shopsmart_store::RecordStore;
use std::marker::PhantomData;
use std::sync::Arc;

/// Sync task and gateway for one typed collection
#[derive(Debug)]
pub struct CollectionHandle<D> {
    sync: SyncHandle,
    gateway: MutationGateway,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document> CollectionHandle<D> {
    fn start(
        store: &Arc<dyn RecordStore>,
        session: &SessionReader,
        notifier: &Arc<dyn Notifier>,
        config: &DashboardConfig,
        coordinator: &SeedCoordinator,
    ) -> Self {
        let spec = CollectionSpec::of::<D>();
        let path = spec.path(&config.app_id);
        let gateway = MutationGateway::new(
            Arc::clone(store),
            session.clone(),
            Arc::clone(notifier),
            spec.clone(),
            path.clone(),
        );
        let sync = CollectionSync::new(
            Arc::clone(store),
            session.clone(),
            Arc::clone(notifier),
            spec,
            path,
            coordinator.clone(),
        )
        .with_seed_strategy(config.seed_strategy)
        .spawn();

        Self {
            sync,
            gateway,
            _document: PhantomData,
        }
    }

    /// Running sync task
    #[inline]
    #[must_use]
    pub fn sync(&self) -> &SyncHandle {
        &self.sync
    }

    /// Mutation entry point
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    /// Current view, decoded
    #[must_use]
    pub fn typed_view(&self) -> TypedView<D> {
        TypedView::decode(&self.sync.view())
    }
}

/// The running dashboard
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    writer: Mutex<SessionWriter>,
    session: SessionReader,
    notifications: Arc<NotificationCenter>,
    auth: BootstrapOutcome,
    equipment: CollectionHandle<Equipment>,
    maintenance: CollectionHandle<MaintenanceEntry>,
    projects: CollectionHandle<Project>,
}

impl Dashboard {
    /// Start the sync tasks, then authenticate.
    ///
    /// The tasks wait for the session, so authentication failures still
    /// leave a dashboard whose syncs report the missing identity.
    ///
    /// # Errors
    /// Only session lifecycle violations; authentication failures are
    /// reported through notifications and [`Self::auth_outcome`].
    pub async fn start(
        config: DashboardConfig,
        store: Arc<dyn RecordStore>,
        auth: &dyn AuthProvider,
    ) -> Result<Self, SyncError> {
        let (mut writer, session) = session_channel();
        let notifications = Arc::new(NotificationCenter::new(config.notification_ttl()));
        let notifier: Arc<dyn Notifier> = notifications.clone();
        let coordinator = SeedCoordinator::new();

        let equipment = CollectionHandle::start(&store, &session, &notifier, &config, &coordinator);
        let maintenance =
            CollectionHandle::start(&store, &session, &notifier, &config, &coordinator);
        let projects = CollectionHandle::start(&store, &session, &notifier, &config, &coordinator);

        let outcome = bootstrap(
            auth,
            config.initial_auth_token.as_deref(),
            &mut writer,
            notifications.as_ref(),
        )
        .await?;
        tracing::info!(app_id = %config.app_id, ?outcome, "dashboard started");

        Ok(Self {
            config,
            writer: Mutex::new(writer),
            session,
            notifications,
            auth: outcome,
            equipment,
            maintenance,
            projects,
        })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Session reader
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionReader {
        &self.session
    }

    /// How authentication went
    #[inline]
    #[must_use]
    pub fn auth_outcome(&self) -> &BootstrapOutcome {
        &self.auth
    }

    /// Notification center
    #[inline]
    #[must_use]
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Equipment inventory
    #[inline]
    #[must_use]
    pub fn equipment(&self) -> &CollectionHandle<Equipment> {
        &self.equipment
    }

    /// Maintenance log
    #[inline]
    #[must_use]
    pub fn maintenance(&self) -> &CollectionHandle<MaintenanceEntry> {
        &self.maintenance
    }

    /// Projects
    #[inline]
    #[must_use]
    pub fn projects(&self) -> &CollectionHandle<Project> {
        &self.projects
    }

    /// Replace the identity after upstream re-authentication
    ///
    /// # Errors
    /// See [`SessionWriter::reassign_identity`]
    pub fn reassign_identity(&self, identity: UserId) -> Result<(), SessionError> {
        self.writer.lock().reassign_identity(identity)
    }

    /// Overview metrics from the current views
    #[must_use]
    pub fn overview(&self, today: NaiveDate) -> ShopOverview {
        ShopOverview::compute(
            &self.equipment.typed_view(),
            &self.maintenance.typed_view(),
            &self.projects.typed_view(),
            today,
        )
    }

    /// Stop every sync task. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        self.equipment.sync.stop().await;
        self.maintenance.sync.stop().await;
        self.projects.sync.stop().await;
        tracing::info!(app_id = %self.config.app_id, "dashboard stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalAuthProvider;
    use crate::sync::SyncStatus;
    use shopsmart_store::InMemoryRecordStore;

    #[tokio::test]
    async fn start_seeds_all_collections() {
        let store = InMemoryRecordStore::new();
        let dashboard = Dashboard::start(
            DashboardConfig::default(),
            Arc::new(store.clone()),
            &LocalAuthProvider::new(),
        )
        .await
        .unwrap();

        assert!(matches!(dashboard.auth_outcome(), BootstrapOutcome::Anonymous(_)));
        dashboard.equipment().sync().wait_for_view(|v| v.len() == 14).await.unwrap();
        dashboard.maintenance().sync().wait_for_view(|v| v.len() == 5).await.unwrap();
        dashboard.projects().sync().wait_for_view(|v| v.len() == 3).await.unwrap();

        let projects = dashboard.projects().typed_view();
        let names: Vec<_> = projects.documents().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Welding Cart Fabrication",
                "DIY Laptop Oscilloscope Build",
                "Smart Power Strip Integration",
            ]
        );

        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(dashboard.overview(today).active_projects, 1);

        dashboard.shutdown().await;
        dashboard.shutdown().await;
        let path = dashboard.equipment().gateway().path().clone();
        assert_eq!(store.active_listeners(&path), 0);
    }

    #[tokio::test]
    async fn failed_auth_leaves_syncs_without_identity() {
        let dashboard = Dashboard::start(
            DashboardConfig::default(),
            Arc::new(InMemoryRecordStore::new()),
            &LocalAuthProvider::new().without_anonymous(),
        )
        .await
        .unwrap();

        let status = dashboard
            .equipment()
            .sync()
            .wait_for_status(|s| *s == SyncStatus::NoIdentity)
            .await;
        assert_eq!(status, Some(SyncStatus::NoIdentity));
        assert!(dashboard.notifications().current().unwrap().is_error());
    }

    #[tokio::test]
    async fn app_id_scopes_paths() {
        let dashboard = Dashboard::start(
            DashboardConfig::default().with_app_id("garage"),
            Arc::new(InMemoryRecordStore::new()),
            &LocalAuthProvider::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            dashboard.maintenance().gateway().path().to_string(),
            "artifacts/garage/public/data/maintenance"
        );
        dashboard.shutdown().await;
    }
}
