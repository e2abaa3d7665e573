//! Wipe endpoint: authentication, ordering, batching, partial failure.

mod common;

use axum::http::StatusCode;
use bastion_core::config::AppConfig;
use common::{StubDatabase, StubStore, TestServer, flat_paths, send};

const BUCKET: &str = "pendaftar-files";
const TOKEN: (&str, &str) = ("x-admin-token", "test-admin-token");

async fn server_with(paths: &[String], store: StubStore, database: StubDatabase) -> TestServer {
    let store = store.with_objects(BUCKET, paths).await;
    TestServer::new(AppConfig::for_testing(), store, database)
}

#[tokio::test]
async fn missing_token_is_rejected_before_any_call() {
    let server = server_with(&flat_paths("1", 3), StubStore::new(), StubDatabase::new()).await;

    let (status, body) = server.request("POST", "/api/admin/wipe", &[]).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(server.storage.list_calls(), 0);
    assert!(server.database.procedure_calls().is_empty());
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let server = server_with(&[], StubStore::new(), StubDatabase::new()).await;
    let (status, _) = server
        .request("POST", "/api/admin/wipe", &[("x-admin-token", "guess")])
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unconfigured_wipe_token_rejects_everyone() {
    let mut config = AppConfig::for_testing();
    config.admin.wipe_token = None;
    let server = TestServer::new(config, StubStore::new(), StubDatabase::new());

    let (status, _) = server
        .request("POST", "/api/admin/wipe", &[("x-admin-token", "")])
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_backend_is_a_configuration_error() {
    let router = TestServer::unconfigured(AppConfig::for_testing());
    let (status, body) = send(&router, "POST", "/api/admin/wipe", &[TOKEN]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "configuration_error");
}

#[tokio::test]
async fn wipe_of_250_objects_uses_three_batches() {
    let mut paths = flat_paths("1001", 120);
    paths.extend(flat_paths("1002/docs", 130));
    let server = server_with(&paths, StubStore::new(), StubDatabase::new()).await;

    let (status, body) = server.request("POST", "/api/admin/wipe", &[TOKEN]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["storage"]["bucket"], BUCKET);
    assert_eq!(body["storage"]["listedFiles"], 250);
    assert_eq!(body["storage"]["deletedFiles"], 250);
    assert_eq!(body["db"]["truncated"], true);
    assert_eq!(server.storage.remove_batches(), vec![100, 100, 50]);
    assert_eq!(server.database.procedure_calls(), vec!["admin_wipe_db"]);
    assert!(server.storage.inner.paths(BUCKET).await.is_empty());
}

#[tokio::test]
async fn empty_bucket_still_truncates_database() {
    let server = server_with(&[], StubStore::new(), StubDatabase::new()).await;

    let (status, body) = server.request("POST", "/api/admin/wipe", &[TOKEN]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"]["deletedFiles"], 0);
    assert!(server.storage.remove_batches().is_empty());
    assert_eq!(server.database.procedure_calls().len(), 1);
}

#[tokio::test]
async fn listing_failure_never_reaches_database() {
    let server = server_with(
        &flat_paths("7", 5),
        StubStore::new().failing_bucket(BUCKET),
        StubDatabase::new(),
    )
    .await;

    let (status, body) = server.request("POST", "/api/admin/wipe", &[TOKEN]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "storage list failed at \"/\": The resource was not found"
    );
    assert!(server.storage.remove_batches().is_empty());
    assert!(server.database.procedure_calls().is_empty());
}

#[tokio::test]
async fn remove_failure_never_reaches_database() {
    let server = server_with(
        &flat_paths("7", 5),
        StubStore::new().failing_remove(),
        StubDatabase::new(),
    )
    .await;

    let (status, body) = server.request("POST", "/api/admin/wipe", &[TOKEN]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "storage remove failed: remove rejected");
    assert_eq!(server.storage.remove_batches(), vec![5]);
    assert!(server.database.procedure_calls().is_empty());
}

#[tokio::test]
async fn procedure_failure_reports_partial_wipe() {
    let server = server_with(
        &flat_paths("9", 12),
        StubStore::new(),
        StubDatabase::new().failing_procedure("permission denied"),
    )
    .await;

    let (status, body) = server.request("POST", "/api/admin/wipe", &[TOKEN]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Database wipe failed: permission denied");
    assert_eq!(body["storage"]["deletedFiles"], 12);
    assert_eq!(body["db"]["truncated"], false);
    assert!(server.storage.inner.paths(BUCKET).await.is_empty());
}

#[tokio::test]
async fn wipe_is_post_only() {
    let server = server_with(&[], StubStore::new(), StubDatabase::new()).await;
    let (status, _) = server.request("GET", "/api/admin/wipe", &[TOKEN]).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(server.database.procedure_calls().is_empty());
}
