//! Subcommand implementations

use crate::render::{self, Format};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;
use shopsmart_store::{InMemoryRecordStore, RecordStore};
use shopsmart_sync::{
    CollectionHandle, CollectionSpec, CollectionSync, Dashboard, DashboardConfig, Document,
    Equipment, LocalAuthProvider, NotificationCenter, SeedCoordinator, SeedStrategy, Session,
    SessionReader, TypedView, UserId,
};
use std::sync::Arc;
use std::time::Duration;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Collections addressable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CollectionArg {
    Equipment,
    Maintenance,
    Projects,
}

fn auth_for(config: &DashboardConfig) -> LocalAuthProvider {
    match &config.initial_auth_token {
        Some(token) => LocalAuthProvider::new().accepting_token(token.clone()),
        None => LocalAuthProvider::new(),
    }
}

async fn start(config: DashboardConfig) -> Result<Dashboard> {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let auth = auth_for(&config);
    Dashboard::start(config, store, &auth)
        .await
        .context("failed to start dashboard")
}

/// Wait until the seeded view is published
async fn settled<D: Document>(handle: &CollectionHandle<D>) -> Result<TypedView<D>> {
    let expected = D::defaults().len();
    tokio::time::timeout(
        SETTLE_TIMEOUT,
        handle.sync().wait_for_view(|v| v.len() >= expected),
    )
    .await
    .with_context(|| format!("timed out loading {}", D::LOAD_LABEL))?
    .with_context(|| format!("{} sync stopped: {:?}", D::COLLECTION, handle.sync().status()))?;
    Ok(handle.typed_view())
}

pub(crate) async fn view(
    config: DashboardConfig,
    collection: CollectionArg,
    format: Format,
) -> Result<()> {
    let dashboard = start(config).await?;
    let output = match collection {
        CollectionArg::Equipment => {
            render::view(&settled(dashboard.equipment()).await?, format)
        }
        CollectionArg::Maintenance => {
            render::view(&settled(dashboard.maintenance()).await?, format)
        }
        CollectionArg::Projects => render::view(&settled(dashboard.projects()).await?, format),
    };
    dashboard.shutdown().await;
    println!("{}", output?);
    Ok(())
}

pub(crate) async fn overview(
    config: DashboardConfig,
    today: NaiveDate,
    format: Format,
) -> Result<()> {
    let dashboard = start(config).await?;
    settled(dashboard.equipment()).await?;
    settled(dashboard.maintenance()).await?;
    settled(dashboard.projects()).await?;

    let overview = dashboard.overview(today);
    dashboard.shutdown().await;
    println!("{}", render::overview(&overview, today, format)?);
    Ok(())
}

/// Result of a seeding simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SimulationReport {
    pub(crate) listeners: usize,
    pub(crate) latency_ms: u64,
    pub(crate) strategy: SeedStrategy,
    pub(crate) isolated: bool,
    pub(crate) expected: usize,
    pub(crate) stored: usize,
    pub(crate) listener_views: Vec<usize>,
}

impl SimulationReport {
    pub(crate) fn passed(&self) -> bool {
        self.stored == self.expected && self.listener_views.iter().all(|&n| n == self.expected)
    }
}

pub(crate) async fn simulate(
    config: DashboardConfig,
    listeners: usize,
    latency_ms: u64,
    strategy: SeedStrategy,
    isolated: bool,
) -> Result<SimulationReport> {
    if listeners == 0 {
        bail!("at least one listener is required");
    }

    let latency = Duration::from_millis(latency_ms);
    let store = InMemoryRecordStore::new().with_latency(latency);
    let spec = CollectionSpec::of::<Equipment>();
    let path = spec.path(&config.app_id);
    let expected = spec.defaults().len();
    let notifier = Arc::new(NotificationCenter::new(config.notification_ttl()));
    let session = SessionReader::fixed(Session::authenticated(UserId::new("simulator")));
    let shared = SeedCoordinator::new();

    tracing::info!(listeners, latency_ms, %strategy, isolated, "starting simulation");
    let handles: Vec<_> = (0..listeners)
        .map(|_| {
            let coordinator = if isolated { SeedCoordinator::new() } else { shared.clone() };
            CollectionSync::new(
                Arc::new(store.clone()),
                session.clone(),
                notifier.clone(),
                spec.clone(),
                path.clone(),
                coordinator,
            )
            .with_seed_strategy(strategy)
            .spawn()
        })
        .collect();

    for handle in &handles {
        tokio::time::timeout(SETTLE_TIMEOUT, handle.wait_for_view(|v| v.len() >= expected))
            .await
            .context("timed out waiting for listeners")?
            .context("listener stopped before the view settled")?;
    }

    // Allow late duplicate inserts to land before counting
    let stragglers = u32::try_from(expected + 2).unwrap_or(u32::MAX);
    tokio::time::sleep(latency.saturating_mul(stragglers)).await;

    let listener_views = handles.iter().map(|h| h.view().len()).collect();
    let stored = store.records(&path).len();
    for handle in &handles {
        handle.stop().await;
    }

    Ok(SimulationReport {
        listeners,
        latency_ms,
        strategy,
        isolated,
        expected,
        stored,
        listener_views,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shared_coordinator_simulation_passes() {
        let report = simulate(DashboardConfig::default(), 3, 1, SeedStrategy::Recheck, false)
            .await
            .unwrap();
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.stored, 14);
    }

    #[tokio::test]
    async fn conditional_isolated_simulation_passes() {
        let report = simulate(DashboardConfig::default(), 3, 1, SeedStrategy::Conditional, true)
            .await
            .unwrap();
        assert!(report.passed(), "{report:?}");
    }

    #[tokio::test]
    async fn zero_listeners_is_rejected() {
        assert!(simulate(DashboardConfig::default(), 0, 1, SeedStrategy::Recheck, false)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn configured_token_is_accepted() {
        use shopsmart_sync::AuthProvider;

        let provider = auth_for(&DashboardConfig::default().with_auth_token("secret"));
        assert!(provider.sign_in_with_token("secret").await.is_ok());
        assert!(provider.sign_in_with_token("other").await.is_err());
    }
}
