//! Integration tests for upload, download, and delete orchestration.

mod helpers;

use std::sync::atomic::Ordering;

use bytes::Bytes;

use clouddisk_core::error::ErrorKind;
use clouddisk_core::traits::blob::collect_stream;
use clouddisk_core::types::{NodeId, OwnerId, PageRequest};
use clouddisk_service::file::digest::content_digest;
use clouddisk_service::{BatchItem, ListTarget};

use helpers::TestApp;

const OWNER: OwnerId = OwnerId(7);

fn item(path: &str, data: &'static [u8]) -> BatchItem {
    BatchItem {
        data: Bytes::from_static(data),
        relative_path: path.to_string(),
        fallback_name: "upload.bin".to_string(),
        mime_type: None,
    }
}

async fn check_same_bytes_share_key(app: TestApp) {
    let a = app.upload(OWNER, NodeId::ROOT, "a.txt", b"same").await.unwrap();
    let b = app.upload(OWNER, NodeId::ROOT, "b.txt", b"same").await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(a.content_hash, b.content_hash);
    assert_eq!(a.storage_key, b.storage_key);
    let expected = format!("files/7/{}.txt", content_digest(b"same"));
    assert_eq!(a.storage_key.as_deref(), Some(expected.as_str()));
    assert!(app.blob_exists(&expected).await);
}

#[tokio::test]
async fn test_same_bytes_share_storage_key_memory() {
    check_same_bytes_share_key(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_same_bytes_share_storage_key_sqlite() {
    check_same_bytes_share_key(TestApp::sqlite().await).await;
}

async fn check_put_failure_writes_no_row(app: TestApp) {
    app.blobs.fail_put.store(true, Ordering::SeqCst);

    let err = app
        .upload(OWNER, NodeId::ROOT, "a.txt", b"content")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StorageUnavailable);

    let listing = app
        .service
        .list(OWNER, ListTarget::Parent(NodeId::ROOT), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listing.total_items, 0);
}

#[tokio::test]
async fn test_put_failure_writes_no_row_memory() {
    check_put_failure_writes_no_row(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_put_failure_writes_no_row_sqlite() {
    check_put_failure_writes_no_row(TestApp::sqlite().await).await;
}

async fn check_delete_survives_blob_failure(app: TestApp) {
    let node = app.upload(OWNER, NodeId::ROOT, "a.txt", b"content").await.unwrap();
    app.blobs.fail_delete.store(true, Ordering::SeqCst);

    app.service.delete(OWNER, node.id).await.unwrap();
    assert_eq!(app.blobs.deletes(), 1);

    let err = app.service.get_node(OWNER, node.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_survives_blob_failure_memory() {
    check_delete_survives_blob_failure(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_delete_survives_blob_failure_sqlite() {
    check_delete_survives_blob_failure(TestApp::sqlite().await).await;
}

#[tokio::test]
async fn test_metadata_failure_removes_blob() {
    let app = TestApp::memory().await;
    app.repo.fail_file_create.store(true, Ordering::SeqCst);

    let err = app
        .upload(OWNER, NodeId::ROOT, "a.txt", b"orphan")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);
    assert_eq!(app.blobs.deletes(), 1);

    let key = format!("files/7/{}.txt", content_digest(b"orphan"));
    assert!(!app.blob_exists(&key).await);
}

#[tokio::test]
async fn test_metadata_failure_keeps_original_error_when_cleanup_fails() {
    let app = TestApp::memory().await;
    app.repo.fail_file_create.store(true, Ordering::SeqCst);
    app.blobs.fail_delete.store(true, Ordering::SeqCst);

    let err = app
        .upload(OWNER, NodeId::ROOT, "a.txt", b"orphan")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);
    assert_eq!(err.message, "injected create failure");
    assert_eq!(app.blobs.deletes(), 1);
}

#[tokio::test]
async fn test_metadata_failure_keeps_shared_blob() {
    let app = TestApp::memory().await;
    let first = app.upload(OWNER, NodeId::ROOT, "a.txt", b"shared").await.unwrap();

    app.repo.fail_file_create.store(true, Ordering::SeqCst);
    app.upload(OWNER, NodeId::ROOT, "b.txt", b"shared")
        .await
        .unwrap_err();

    assert_eq!(app.blobs.deletes(), 0);
    assert!(app.blob_exists(first.storage_key.as_deref().unwrap()).await);
}

#[tokio::test]
async fn test_delete_keeps_blob_while_referenced() {
    let app = TestApp::memory().await;
    let a = app.upload(OWNER, NodeId::ROOT, "a.txt", b"twice").await.unwrap();
    let b = app.upload(OWNER, NodeId::ROOT, "b.txt", b"twice").await.unwrap();
    let key = a.storage_key.clone().unwrap();

    app.service.delete(OWNER, a.id).await.unwrap();
    assert!(app.blob_exists(&key).await);

    let download = app.service.download(OWNER, b.id).await.unwrap();
    assert_eq!(&collect_stream(download.stream).await.unwrap()[..], b"twice");

    app.service.delete(OWNER, b.id).await.unwrap();
    assert!(!app.blob_exists(&key).await);
}

#[tokio::test]
async fn test_delete_foreign_node_is_not_found() {
    let app = TestApp::memory().await;
    let node = app.upload(OWNER, NodeId::ROOT, "a.txt", b"mine").await.unwrap();

    let err = app.service.delete(OwnerId(8), node.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(app.service.get_node(OWNER, node.id).await.is_ok());
}

async fn check_delete_non_empty_directory_is_conflict(app: TestApp) {
    let docs = app
        .service
        .create_folder(OWNER, "docs", NodeId::ROOT, None)
        .await
        .unwrap();
    let file = app.upload(OWNER, docs.id, "a.txt", b"inside").await.unwrap();

    let err = app.service.delete(OWNER, docs.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(app.blobs.deletes(), 0);

    let parent = app.service.get_node(OWNER, file.parent_id).await.unwrap();
    assert_eq!(parent.id, docs.id);
    assert!(parent.is_dir);

    app.service.delete(OWNER, file.id).await.unwrap();
    app.service.delete(OWNER, docs.id).await.unwrap();
    let err = app.service.get_node(OWNER, docs.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_non_empty_directory_is_conflict_memory() {
    check_delete_non_empty_directory_is_conflict(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_delete_non_empty_directory_is_conflict_sqlite() {
    check_delete_non_empty_directory_is_conflict(TestApp::sqlite().await).await;
}

#[tokio::test]
async fn test_delete_directory_with_only_subfolders_is_conflict() {
    let app = TestApp::memory().await;
    let leaf = app.service.tree().resolve_or_create(OWNER, "a/b").await.unwrap();
    let a = app.service.tree().resolve_existing(OWNER, "a").await.unwrap();

    let err = app.service.delete(OWNER, a.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    app.service.delete(OWNER, leaf).await.unwrap();
    app.service.delete(OWNER, a.id).await.unwrap();
    let listing = app
        .service
        .list(OWNER, ListTarget::Parent(NodeId::ROOT), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listing.total_items, 0);
}

#[tokio::test]
async fn test_download_round_trip() {
    let app = TestApp::sqlite().await;
    let node = app
        .upload(OWNER, NodeId::ROOT, "hello.txt", b"hello world")
        .await
        .unwrap();

    let download = app.service.download(OWNER, node.id).await.unwrap();
    assert_eq!(download.node, node);
    let body = collect_stream(download.stream).await.unwrap();
    assert_eq!(&body[..], b"hello world");
}

async fn check_nested_upload_scenario(app: TestApp) {
    let first = app
        .service
        .batch_upload(OWNER, vec![item("docs/2024/report.pdf", b"%PDF-1.7")], NodeId::ROOT)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    let report = &first[0];
    assert_eq!(report.name, "report.pdf");
    assert_eq!(report.path, "/docs/2024/report.pdf");

    let tree = app.service.tree();
    let docs = tree.resolve_existing(OWNER, "docs").await.unwrap();
    let year = tree.resolve_existing(OWNER, "docs/2024").await.unwrap();
    assert_eq!(docs.parent_id, NodeId::ROOT);
    assert_eq!(year.parent_id, docs.id);
    assert_eq!(report.parent_id, year.id);

    let second = app
        .service
        .batch_upload(
            OWNER,
            vec![item("docs/2024/report-copy.pdf", b"%PDF-1.7")],
            NodeId::ROOT,
        )
        .await
        .unwrap();
    let copy = &second[0];
    assert_ne!(copy.id, report.id);
    assert_eq!(copy.name, "report-copy.pdf");
    assert_eq!(copy.parent_id, year.id);
    assert_eq!(copy.storage_key, report.storage_key);

    let listing = app
        .service
        .list(OWNER, ListTarget::Parent(NodeId::ROOT), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listing.total_items, 1);
}

#[tokio::test]
async fn test_nested_upload_scenario_memory() {
    check_nested_upload_scenario(TestApp::memory().await).await;
}

#[tokio::test]
async fn test_nested_upload_scenario_sqlite() {
    check_nested_upload_scenario(TestApp::sqlite().await).await;
}

#[tokio::test]
async fn test_batch_upload_falls_back_to_file_name() {
    let app = TestApp::memory().await;
    let nodes = app
        .service
        .batch_upload(OWNER, vec![item("photos/", b"jpeg"), item("", b"raw")], NodeId::ROOT)
        .await
        .unwrap();

    assert_eq!(nodes[0].name, "upload.bin");
    assert_eq!(nodes[0].path, "/photos/upload.bin");
    assert_eq!(nodes[1].name, "upload.bin");
    assert_eq!(nodes[1].parent_id, NodeId::ROOT);
}

#[tokio::test]
async fn test_batch_upload_stops_at_first_error() {
    let app = TestApp::memory().await;
    let parent = app
        .service
        .create_folder(OWNER, "inbox", NodeId::ROOT, None)
        .await
        .unwrap();

    let mut bad = item("b.txt", b"b");
    bad.fallback_name = String::new();
    bad.relative_path = "sub/..".to_string();

    let err = app
        .service
        .batch_upload(
            OWNER,
            vec![item("a.txt", b"a"), bad, item("c.txt", b"c")],
            parent.id,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);

    let listing = app
        .service
        .list(OWNER, ListTarget::Path("inbox".into()), PageRequest::default())
        .await
        .unwrap();
    let names: Vec<_> = listing.items.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["sub", "a.txt"]);
}
