//! Integration tests for the pstore CLI
//!
//! These tests require a running S3-compatible server.
//!
//! Run with:
//! ```bash
//! docker run -d --name minio -p 9000:9000 \
//!     -e MINIO_ROOT_USER=accesskey -e MINIO_ROOT_PASSWORD=secretkey \
//!     minio/minio server /data
//!
//! TEST_S3_ENDPOINT=http://localhost:9000 \
//! TEST_S3_ACCESS_KEY=accesskey TEST_S3_SECRET_KEY=secretkey \
//!     cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;

use tempfile::TempDir;

/// Get the path to the pstore binary
fn pstore_binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_pstore"))
}

/// Run pstore with an isolated config directory and the test profile
fn run(args: &[&str], config_dir: &Path) -> Output {
    Command::new(pstore_binary())
        .args(args)
        .env("PSTORE_CONFIG_DIR", config_dir)
        .env("PSTORE_PROFILE", "test")
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY")
        .output()
        .expect("Failed to execute pstore command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Get S3 test configuration from environment
fn get_test_config() -> Option<(String, String, String)> {
    let endpoint = std::env::var("TEST_S3_ENDPOINT").ok()?;
    let access_key = std::env::var("TEST_S3_ACCESS_KEY").ok()?;
    let secret_key = std::env::var("TEST_S3_SECRET_KEY").ok()?;
    Some((endpoint, access_key, secret_key))
}

/// Generate unique suffix for test resources
fn uuid_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}", duration.as_nanos() % 0xFFFFFFFF)
}

/// Configure the test profile and wait until the service answers
fn setup_profile() -> Option<TempDir> {
    let (endpoint, access_key, secret_key) = get_test_config()?;
    let config_dir = tempfile::tempdir().ok()?;

    let output = run(
        &[
            "profile",
            "set",
            "test",
            "--access-key",
            &access_key,
            "--secret-key",
            &secret_key,
            "--endpoint",
            &endpoint,
            "--path-style",
        ],
        config_dir.path(),
    );
    if !output.status.success() {
        eprintln!(
            "Failed to set profile: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        return None;
    }

    for _ in 0..30 {
        if run(&["ls", "--json"], config_dir.path()).status.success() {
            return Some(config_dir);
        }
        std::thread::sleep(Duration::from_secs(1));
    }
    eprintln!("S3 service did not become ready in time");
    None
}

/// Configure the profile and create a fresh bucket
fn setup_bucket(name: &str) -> Option<(TempDir, String)> {
    let config_dir = setup_profile()?;
    let bucket = format!("test-{name}-{}", uuid_suffix());
    let output = run(&["mb", &bucket], config_dir.path());
    if !output.status.success() {
        eprintln!(
            "Failed to create bucket: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        return None;
    }
    Some((config_dir, bucket))
}

fn cleanup_bucket(config_dir: &Path, bucket: &str) {
    let _ = run(&["rm", "-r", &format!("{bucket}/")], config_dir);
    let _ = run(&["rb", bucket], config_dir);
}

mod bucket_operations {
    use super::*;

    #[test]
    fn test_create_list_and_delete_bucket() {
        let Some((config_dir, bucket)) = setup_bucket("mb") else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };

        let output = run(&["ls", "--json"], config_dir.path());
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        let buckets = json["buckets"].as_array().unwrap();
        assert!(buckets.iter().any(|b| b == bucket.as_str()));

        let output = run(&["mb", &bucket], config_dir.path());
        assert_eq!(output.status.code(), Some(6), "duplicate bucket is a conflict");

        let output = run(&["rb", &bucket], config_dir.path());
        assert!(output.status.success());
    }

    #[test]
    fn test_rb_refuses_non_empty_bucket() {
        let Some((config_dir, bucket)) = setup_bucket("rb") else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let local = tempfile::tempdir().unwrap();
        let file = local.path().join("f.txt");
        std::fs::write(&file, b"x").unwrap();

        let target = format!("{bucket}/f.txt");
        assert!(run(&["put", file.to_str().unwrap(), &target], config_dir.path()).status.success());

        let output = run(&["rb", &bucket], config_dir.path());
        assert_eq!(output.status.code(), Some(6));

        cleanup_bucket(config_dir.path(), &bucket);
    }

    #[test]
    fn test_missing_bucket_is_not_found() {
        let Some(config_dir) = setup_profile() else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let output = run(
            &["ls", &format!("missing-{}", uuid_suffix())],
            config_dir.path(),
        );
        assert_eq!(output.status.code(), Some(5));
    }
}

mod file_operations {
    use super::*;

    #[test]
    fn test_put_cat_get_round_trip() {
        let Some((config_dir, bucket)) = setup_bucket("files") else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let local = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..=255u8).collect();
        let src = local.path().join("bin.dat");
        std::fs::write(&src, &data).unwrap();

        let remote = format!("{bucket}/docs/bin.dat");
        assert!(run(&["put", src.to_str().unwrap(), &remote], config_dir.path()).status.success());

        let output = run(&["cat", &remote], config_dir.path());
        assert!(output.status.success());
        assert_eq!(output.stdout, data);

        let out = local.path().join("copy.dat");
        assert!(run(&["get", &remote, out.to_str().unwrap()], config_dir.path()).status.success());
        assert_eq!(std::fs::read(&out).unwrap(), data);

        let output = run(&["cat", &remote, "--encoding", "utf-8"], config_dir.path());
        assert!(!output.status.success(), "binary body must not decode as UTF-8");

        cleanup_bucket(config_dir.path(), &bucket);
    }

    #[test]
    fn test_mv_conflict_keeps_source() {
        let Some((config_dir, bucket)) = setup_bucket("mv") else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let local = tempfile::tempdir().unwrap();
        let file = local.path().join("f.txt");
        std::fs::write(&file, b"hello").unwrap();
        let old = format!("{bucket}/old.txt");
        let new = format!("{bucket}/new.txt");
        run(&["put", file.to_str().unwrap(), &old], config_dir.path());
        run(&["put", file.to_str().unwrap(), &new], config_dir.path());

        let output = run(&["mv", &old, &new], config_dir.path());
        assert_eq!(output.status.code(), Some(6));
        assert!(run(&["stat", &old], config_dir.path()).status.success());

        run(&["rm", &new], config_dir.path());
        assert!(run(&["mv", &old, &new], config_dir.path()).status.success());
        assert_eq!(run(&["stat", &old], config_dir.path()).status.code(), Some(5));

        cleanup_bucket(config_dir.path(), &bucket);
    }

    #[test]
    fn test_share_returns_url() {
        let Some((config_dir, bucket)) = setup_bucket("share") else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let local = tempfile::tempdir().unwrap();
        let file = local.path().join("f.txt");
        std::fs::write(&file, b"hello").unwrap();
        let remote = format!("{bucket}/f.txt");
        run(&["put", file.to_str().unwrap(), &remote], config_dir.path());

        let output = run(&["share", &remote, "--expires", "60", "--json"], config_dir.path());
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert!(json["url"].as_str().unwrap().starts_with("http"));
        assert_eq!(json["expires_in_secs"], 60);

        cleanup_bucket(config_dir.path(), &bucket);
    }
}

mod folder_operations {
    use super::*;

    #[test]
    fn test_folder_lifecycle() {
        let Some((config_dir, bucket)) = setup_bucket("folders") else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let local = tempfile::tempdir().unwrap();
        std::fs::write(local.path().join("f1.txt"), b"one").unwrap();
        std::fs::create_dir(local.path().join("sub")).unwrap();
        std::fs::write(local.path().join("sub").join("f2.txt"), b"two").unwrap();

        let data = format!("{bucket}/data/");
        let output = run(&["put", "-r", local.path().to_str().unwrap(), &data], config_dir.path());
        assert!(output.status.success());

        let output = run(&["ls", &data, "--json"], config_dir.path());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["files"], serde_json::json!(["f1.txt"]));
        assert_eq!(json["folders"], serde_json::json!(["sub"]));

        let out = tempfile::tempdir().unwrap();
        let output = run(&["get", "-r", &data, out.path().to_str().unwrap()], config_dir.path());
        assert!(output.status.success());
        assert_eq!(std::fs::read(out.path().join("sub").join("f2.txt")).unwrap(), b"two");

        let archive = format!("{bucket}/archive/");
        assert!(run(&["mv", "-r", &data, &archive], config_dir.path()).status.success());
        assert_eq!(run(&["ls", &data], config_dir.path()).status.code(), Some(5));

        assert!(run(&["rm", "-r", &archive], config_dir.path()).status.success());
        let output = run(&["ls", &bucket, "--json"], config_dir.path());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["folders"], serde_json::json!([]));

        assert!(run(&["rb", &bucket], config_dir.path()).status.success());
    }

    #[test]
    fn test_rename_bucket() {
        let Some((config_dir, bucket)) = setup_bucket("rename") else {
            eprintln!("Skipping: S3 test config not available");
            return;
        };
        let local = tempfile::tempdir().unwrap();
        std::fs::create_dir(local.path().join("nested")).unwrap();
        std::fs::write(local.path().join("nested").join("deep.txt"), b"deep").unwrap();
        run(&["put", "-r", local.path().to_str().unwrap(), &format!("{bucket}/top")], config_dir.path());

        let renamed = format!("{bucket}-new");
        let output = run(&["renamebucket", &bucket, &renamed], config_dir.path());
        assert!(output.status.success());

        let output = run(&["cat", &format!("{renamed}/top/nested/deep.txt")], config_dir.path());
        assert_eq!(output.stdout, b"deep");
        assert_eq!(run(&["ls", &bucket], config_dir.path()).status.code(), Some(5));

        cleanup_bucket(config_dir.path(), &renamed);
    }
}
