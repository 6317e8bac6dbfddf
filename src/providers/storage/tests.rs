use super::*;
use crate::config::Config;
use crate::providers::traits::StorageProvider;
use crate::testing::MockExecutor;
use std::path::Path;
use std::sync::Arc;

fn local_config() -> Config {
    let mut config = Config::default();
    config.storage.driver = "local".to_string();
    config.storage.root = "storage".to_string();
    config
}

fn bucket_config() -> Config {
    let mut config = Config::default();
    config.storage.driver = "bucket".to_string();
    config.storage.alias = "minio".to_string();
    config.storage.bucket = "shop-media".to_string();
    config
}

#[test]
fn local_list_prefixes_root() {
    let executor = Arc::new(MockExecutor::new().respond("ls", MockExecutor::ok("a.png\nb.png\n")));
    let provider = LocalStorageProvider::new(&local_config(), executor.clone());

    let listed = provider.list(Some("uploads")).unwrap();
    assert_eq!(listed, vec!["a.png", "b.png"]);

    let calls = executor.calls();
    assert_eq!(calls[0].args, vec!["-1A".to_string(), "storage/uploads".to_string()]);
}

#[test]
fn local_exists_maps_exit_code_to_bool() {
    let executor = Arc::new(MockExecutor::new().respond("test", MockExecutor::failing(1, "")));
    let provider = LocalStorageProvider::new(&local_config(), executor);
    assert!(!provider.exists("missing.txt").unwrap());

    let executor = Arc::new(MockExecutor::new().respond("test", MockExecutor::ok("")));
    let provider = LocalStorageProvider::new(&local_config(), executor);
    assert!(provider.exists("present.txt").unwrap());
}

#[test]
fn local_stat_parses_stat_output() {
    let executor = Arc::new(
        MockExecutor::new().respond(
            "stat",
            MockExecutor::ok("regular file|2048|2026-08-01 10:00:00.000000000 +0000\n"),
        ),
    );
    let provider = LocalStorageProvider::new(&local_config(), executor);

    let info = provider.stat("uploads/a.png").unwrap();
    assert_eq!(info.kind, "regular file");
    assert_eq!(info.size_bytes, 2048);
    assert!(info.modified.unwrap().starts_with("2026-08-01"));
}

#[test]
fn local_stat_missing_object_is_resource_missing() {
    let executor =
        Arc::new(MockExecutor::new().respond("stat", MockExecutor::failing(1, "no such file")));
    let provider = LocalStorageProvider::new(&local_config(), executor);

    let err = provider.stat("nope.txt").expect_err("missing object");
    assert!(err.to_string().contains("No such object"));
}

#[test]
fn local_upload_routes_through_copy_into_service() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("photo.jpg");
    std::fs::write(&file, "jpeg").unwrap();

    let mut config = local_config();
    config.storage.service = Some("app".to_string());

    let executor = Arc::new(MockExecutor::new());
    let provider = LocalStorageProvider::new(&config, executor.clone());
    provider.upload(&file, "uploads/photo.jpg").unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].op, "copy_into");
    assert_eq!(calls[0].service.as_deref(), Some("app"));
    assert_eq!(calls[0].args[1], "storage/uploads/photo.jpg");
}

#[test]
fn local_usage_parses_du() {
    let executor =
        Arc::new(MockExecutor::new().respond("du", MockExecutor::ok("1048576\tstorage\n")));
    let provider = LocalStorageProvider::new(&local_config(), executor);

    let usage = provider.usage().unwrap();
    assert_eq!(usage.total_bytes, 1048576);
    assert_eq!(usage.formatted, "1.0 MiB");
}

#[test]
fn bucket_requires_a_bucket_name() {
    let mut config = bucket_config();
    config.storage.bucket = String::new();

    let err = BucketStorageProvider::new(&config, Arc::new(MockExecutor::new()))
        .expect_err("bucket required");
    assert!(err.to_string().contains("bucket"));
}

#[test]
fn bucket_list_parses_mc_json_lines() {
    let executor = Arc::new(MockExecutor::new().respond(
        "mc",
        MockExecutor::ok(
            "{\"status\":\"success\",\"type\":\"file\",\"key\":\"a.png\",\"size\":10}\n\
             not-json\n\
             {\"status\":\"success\",\"type\":\"file\",\"key\":\"b.png\",\"size\":20}\n",
        ),
    ));
    let provider = BucketStorageProvider::new(&bucket_config(), executor.clone()).unwrap();

    let listed = provider.list(None).unwrap();
    assert_eq!(listed, vec!["a.png", "b.png"]);

    let calls = executor.calls();
    assert_eq!(calls[0].args[2], "minio/shop-media");
}

#[test]
fn bucket_stat_parses_mc_json() {
    let executor = Arc::new(MockExecutor::new().respond(
        "mc",
        MockExecutor::ok(
            "{\"status\":\"success\",\"name\":\"a.png\",\"size\":4096,\"type\":\"file\",\"lastModified\":\"2026-08-01T10:00:00Z\"}",
        ),
    ));
    let provider = BucketStorageProvider::new(&bucket_config(), executor).unwrap();

    let info = provider.stat("a.png").unwrap();
    assert_eq!(info.size_bytes, 4096);
    assert_eq!(info.modified.as_deref(), Some("2026-08-01T10:00:00Z"));
    assert_eq!(info.path, "minio/shop-media/a.png");
}

#[test]
fn bucket_mkdir_pipes_a_keep_marker() {
    let executor = Arc::new(MockExecutor::new());
    let provider = BucketStorageProvider::new(&bucket_config(), executor.clone()).unwrap();

    provider.mkdir("uploads/2026").unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].command, "mc");
    assert_eq!(calls[0].args[0], "pipe");
    assert_eq!(calls[0].args[1], "minio/shop-media/uploads/2026/.keep");
    assert_eq!(calls[0].stdin.as_deref(), Some(b"".as_slice()));
}
