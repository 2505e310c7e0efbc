//! End-to-end collection sync scenarios

use pretty_assertions::assert_eq;
use shopsmart_store::{InMemoryRecordStore, RecordStore};
use shopsmart_sync::{
    CollectionSpec, CollectionSync, Equipment, MaintenanceEntry, NotificationKind, SeedCoordinator,
    SyncHandle, SyncStatus, TypedView,
};
use shopsmart_test_utils::{equipment_attrs, signed_in, RecordingNotifier};
use std::sync::Arc;

fn start<D: shopsmart_sync::Document>(
    store: &InMemoryRecordStore,
    notifier: &Arc<RecordingNotifier>,
) -> SyncHandle {
    start_with::<D>(store, notifier, &SeedCoordinator::new())
}

fn start_with<D: shopsmart_sync::Document>(
    store: &InMemoryRecordStore,
    notifier: &Arc<RecordingNotifier>,
    coordinator: &SeedCoordinator,
) -> SyncHandle {
    let spec = CollectionSpec::of::<D>();
    let path = spec.path("default-app-id");
    CollectionSync::new(
        Arc::new(store.clone()),
        signed_in("tester"),
        notifier.clone(),
        spec,
        path,
        coordinator.clone(),
    )
    .spawn()
}

#[tokio::test]
async fn fresh_equipment_collection_is_seeded_and_sorted() {
    let store = InMemoryRecordStore::new();
    let notifier = RecordingNotifier::new();
    let handle = start::<Equipment>(&store, &notifier);

    let view = handle.wait_for_view(|v| v.len() == 14).await.unwrap();
    let typed = TypedView::<Equipment>::decode(&view);
    let names: Vec<_> = typed.documents().map(|e| e.name.as_str()).collect();

    let scope = names
        .iter()
        .position(|n| *n == "DIY Laptop Oscilloscope (ESP32)")
        .unwrap();
    let fluke = names
        .iter()
        .position(|n| *n == "Fluke 117 Digital Multimeter")
        .unwrap();
    assert_eq!(scope, 0);
    assert_eq!(fluke, 13);

    // Most recent first throughout
    let dates: Vec<_> = typed
        .documents()
        .map(|e| e.acquisition_date.clone())
        .collect();
    assert!(dates.windows(2).all(|w| w[0] >= w[1]));

    // Equal dates fall back to name order
    let glasses = names.iter().position(|n| *n == "Safety Glasses (Clear)").unwrap();
    let mat = names.iter().position(|n| *n == "ESD Mat & Wrist Strap").unwrap();
    assert!(mat < glasses);

    handle.stop().await;
}

#[tokio::test]
async fn listener_errors_keep_the_loop_alive() {
    let store = InMemoryRecordStore::new();
    let notifier = RecordingNotifier::new();
    let handle = start::<MaintenanceEntry>(&store, &notifier);
    let view = handle.wait_for_view(|v| v.len() == 5).await.unwrap();
    let path = handle.path().clone();

    store.inject_error(&path, "permission denied");
    store.inject_error(&path, "quota exceeded");

    let mut extra = shopsmart_store::Attributes::new();
    extra.insert("item".into(), "Drill Press".into());
    store.create(&path, extra).await.unwrap();

    let after = handle.wait_for_view(|v| v.len() == 6).await.unwrap();
    assert!(after.revision() > view.revision());
    assert_eq!(handle.status(), SyncStatus::Live);

    let errors: Vec<_> = notifier
        .notifications()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::Error)
        .map(|n| n.message)
        .collect();
    assert_eq!(
        errors,
        vec![
            "Error loading maintenance log: store unavailable: permission denied",
            "Error loading maintenance log: store unavailable: quota exceeded",
        ]
    );
    handle.stop().await;
}

#[tokio::test]
async fn existing_records_are_not_reseeded() {
    let store = InMemoryRecordStore::new();
    let path = CollectionSpec::of::<Equipment>().path("default-app-id");
    store
        .create(&path, equipment_attrs("Only Item", "2023-03-03"))
        .await
        .unwrap();

    let notifier = RecordingNotifier::new();
    let handle = start::<Equipment>(&store, &notifier);
    let view = handle.wait_for_view(|v| v.revision() >= 1).await.unwrap();

    assert_eq!(view.len(), 1);
    assert_eq!(store.records(&path).len(), 1);
    handle.stop().await;
}

#[tokio::test]
async fn every_snapshot_is_published_in_order() {
    let store = InMemoryRecordStore::new();
    let notifier = RecordingNotifier::new();
    let handle = start::<Equipment>(&store, &notifier);
    handle.wait_for_view(|v| v.len() == 14).await.unwrap();
    let path = handle.path().clone();

    let mut views = handle.subscribe_view();
    views.borrow_and_update();
    let id = store
        .create(&path, equipment_attrs("Newest Thing", "2099-01-01"))
        .await
        .unwrap();

    views.changed().await.unwrap();
    let view = views.borrow_and_update().clone();
    assert_eq!(view.records()[0].id, id);

    store.delete(&path, &id).await.unwrap();
    views.changed().await.unwrap();
    assert!(views.borrow().get(&id).is_none());
    handle.stop().await;
}

#[tokio::test]
async fn dropping_the_handle_releases_the_listener() {
    let store = InMemoryRecordStore::new();
    let notifier = RecordingNotifier::new();
    let handle = start::<Equipment>(&store, &notifier);
    handle.wait_for_view(|v| v.len() == 14).await.unwrap();
    let path = handle.path().clone();
    assert_eq!(store.active_listeners(&path), 1);

    drop(handle);
    for _ in 0..10 {
        if store.active_listeners(&path) == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(store.active_listeners(&path), 0);
}

#[tokio::test(start_paused = true)]
async fn two_syncs_on_one_path_seed_once() {
    let store = InMemoryRecordStore::new().with_latency(std::time::Duration::from_millis(10));
    let notifier = RecordingNotifier::new();
    let coordinator = SeedCoordinator::new();
    let first = start_with::<Equipment>(&store, &notifier, &coordinator);
    let second = start_with::<Equipment>(&store, &notifier, &coordinator);

    first.wait_for_view(|v| v.len() == 14).await.unwrap();
    second.wait_for_view(|v| v.len() == 14).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(5)).await;

    assert_eq!(store.records(first.path()).len(), 14);
    assert_eq!(second.view().len(), 14);
    first.stop().await;
    second.stop().await;
}
