//! Integration tests for folder resolution.

mod helpers;

use std::sync::atomic::Ordering;

use clouddisk_core::error::ErrorKind;
use clouddisk_core::types::{NodeId, OwnerId, PageRequest};
use clouddisk_service::ListTarget;

use helpers::TestApp;

const OWNER: OwnerId = OwnerId(1);

async fn dir_count(app: &TestApp, parent: NodeId) -> usize {
    app.service
        .list(OWNER, ListTarget::Parent(parent), PageRequest::new(1, 100))
        .await
        .unwrap()
        .items
        .iter()
        .filter(|n| n.is_dir)
        .count()
}

async fn check_resolve_is_idempotent(app: TestApp) {
    let tree = app.service.tree();
    let first = tree.resolve_or_create(OWNER, "a/b/c").await.unwrap();
    let second = tree.resolve_or_create(OWNER, "/a//b/c/").await.unwrap();
    assert_eq!(first, second);

    let a = tree.resolve_existing(OWNER, "a").await.unwrap();
    let b = tree.resolve_existing(OWNER, "a/b").await.unwrap();
    assert_eq!(dir_count(&app, NodeId::ROOT).await, 1);
    assert_eq!(dir_count(&app, a.id).await, 1);
    assert_eq!(dir_count(&app, b.id).await, 1);
}

#[tokio::test]
async fn test_resolve_or_create_is_idempotent_memory() {
    check_resolve_is_idempotent(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_resolve_or_create_is_idempotent_sqlite() {
    check_resolve_is_idempotent(TestApp::sqlite().await).await;
}

async fn check_missing_then_created(app: TestApp) {
    let tree = app.service.tree();
    tree.resolve_or_create(OWNER, "docs").await.unwrap();

    let err = tree.resolve_existing(OWNER, "docs/missing").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let created = tree.resolve_or_create(OWNER, "docs/missing").await.unwrap();
    let found = tree.resolve_existing(OWNER, "docs/missing").await.unwrap();
    assert_eq!(found.id, created);
    assert_eq!(found.path, "/docs/missing");
}

#[tokio::test]
async fn test_missing_segment_then_created_memory() {
    check_missing_then_created(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_missing_segment_then_created_sqlite() {
    check_missing_then_created(TestApp::sqlite().await).await;
}

async fn check_concurrent_resolve(app: TestApp) {
    let mut handles = Vec::new();
    for _ in 0..8 {
        let tree = app.service.tree().clone();
        handles.push(tokio::spawn(async move {
            tree.resolve_or_create(OWNER, "shared/deep/leaf").await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let tree = app.service.tree();
    let shared = tree.resolve_existing(OWNER, "shared").await.unwrap();
    let deep = tree.resolve_existing(OWNER, "shared/deep").await.unwrap();
    assert_eq!(dir_count(&app, NodeId::ROOT).await, 1);
    assert_eq!(dir_count(&app, shared.id).await, 1);
    assert_eq!(dir_count(&app, deep.id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolve_creates_one_directory_per_segment_memory() {
    check_concurrent_resolve(TestApp::memory().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolve_creates_one_directory_per_segment_sqlite() {
    check_concurrent_resolve(TestApp::sqlite().await).await;
}

async fn check_lost_race_rereads_winner(app: TestApp) {
    let tree = app.service.tree();
    let winner = tree.resolve_or_create(OWNER, "reports").await.unwrap();

    app.repo.miss_dir_lookups(1);
    let loser = tree.resolve_or_create(OWNER, "reports").await.unwrap();
    assert_eq!(loser, winner);
    assert_eq!(app.repo.dir_lookup_misses.load(Ordering::SeqCst), 0);
    assert_eq!(dir_count(&app, NodeId::ROOT).await, 1);
}

#[tokio::test]
async fn test_lost_race_rereads_winner_memory() {
    check_lost_race_rereads_winner(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_lost_race_rereads_winner_sqlite() {
    check_lost_race_rereads_winner(TestApp::sqlite().await).await;
}

async fn check_second_miss_is_conflict(app: TestApp) {
    let tree = app.service.tree();
    let winner = tree.resolve_or_create(OWNER, "reports/2024").await.unwrap();

    app.repo.miss_dir_lookups(2);
    let err = tree.resolve_or_create(OWNER, "reports").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(dir_count(&app, NodeId::ROOT).await, 1);

    let again = tree.resolve_or_create(OWNER, "reports/2024").await.unwrap();
    assert_eq!(again, winner);
}

#[tokio::test]
async fn test_second_miss_is_conflict_memory() {
    check_second_miss_is_conflict(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_second_miss_is_conflict_sqlite() {
    check_second_miss_is_conflict(TestApp::sqlite().await).await;
}

#[tokio::test]
async fn test_directory_and_file_may_share_a_name() {
    let app = TestApp::memory().await;
    app.upload(OWNER, NodeId::ROOT, "docs", b"not a folder")
        .await
        .unwrap();

    let tree = app.service.tree();
    let id = tree.resolve_or_create(OWNER, "docs").await.unwrap();
    let dir = app.service.get_node(OWNER, id).await.unwrap();
    assert!(dir.is_dir);
}
