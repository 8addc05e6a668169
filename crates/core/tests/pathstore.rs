//! End-to-end behavior of PathStore against the in-memory store

use std::path::Path;
use std::sync::Arc;

use ps_core::{Error, FileContent, MemoryStore, PathStore};
use tempfile::TempDir;

fn new_store() -> (Arc<MemoryStore>, PathStore) {
    let memory = Arc::new(MemoryStore::new().with_page_size(3));
    let store = PathStore::new(memory.clone(), "us-east-1");
    (memory, store)
}

fn write(root: &Path, rel: &str, data: &[u8]) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

#[tokio::test]
async fn create_bucket_then_list_then_duplicate() {
    let (_, store) = new_store();
    store.create_bucket("alpha-bucket").await.unwrap();
    assert!(store.list_buckets().await.unwrap().contains(&"alpha-bucket".to_string()));

    let err = store.create_bucket("alpha-bucket").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    assert_eq!(err.exit_code(), 6);
}

#[tokio::test]
async fn upload_download_round_trip_is_lossless() {
    let (_, store) = new_store();
    store.create_bucket("b1").await.unwrap();
    let dir = TempDir::new().unwrap();

    let binary: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    let cases: [(&str, &[u8]); 3] = [("empty.bin", b""), ("bin.dat", &binary), ("text.txt", "ünïcode".as_bytes())];

    for (name, data) in cases {
        let src = dir.path().join(name);
        std::fs::write(&src, data).unwrap();
        store.upload_file("b1", &src, &format!("files/{name}")).await.unwrap();

        let out = dir.path().join(format!("out-{name}"));
        store.download_file("b1", &format!("/files/{name}"), &out).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), data, "{name}");

        let raw = store.read_file("b1", &format!("files/{name}"), None).await.unwrap();
        assert_eq!(raw, FileContent::Bytes(data.to_vec()));
    }
}

#[tokio::test]
async fn list_returns_one_level_only() {
    let (_, store) = new_store();
    store.create_bucket("b1").await.unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", b"a");
    write(dir.path(), "b.txt", b"b");

    store.upload_file("b1", &dir.path().join("a.txt"), "prefix/a.txt").await.unwrap();
    store.upload_file("b1", &dir.path().join("b.txt"), "prefix/sub/b.txt").await.unwrap();

    let listing = store.list("b1", "prefix").await.unwrap();
    assert_eq!(listing.files, vec!["a.txt"]);
    assert_eq!(listing.folders, vec!["sub"]);
}

#[tokio::test]
async fn rename_file_conflicts_leave_source_untouched() {
    let (memory, store) = new_store();
    store.create_bucket("b1").await.unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "f", b"old");
    store.upload_file("b1", &dir.path().join("f"), "old.txt").await.unwrap();
    store.upload_file("b1", &dir.path().join("f"), "new.txt").await.unwrap();

    assert!(matches!(
        store.rename_file("b1", "old.txt", "new.txt").await,
        Err(Error::AlreadyExists(_))
    ));
    assert_eq!(memory.keys("b1"), vec!["new.txt", "old.txt"]);

    assert!(matches!(
        store.rename_file("b1", "missing.txt", "other.txt").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_bucket_requires_empty() {
    let (_, store) = new_store();
    store.create_bucket("b1").await.unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "f", b"x");
    store.upload_file("b1", &dir.path().join("f"), "f").await.unwrap();

    assert!(matches!(store.delete_bucket("b1").await, Err(Error::NotEmpty(_))));

    store.delete_file("b1", "f").await.unwrap();
    store.delete_bucket("b1").await.unwrap();
    assert!(!store.list_buckets().await.unwrap().contains(&"b1".to_string()));
}

#[tokio::test]
async fn folder_lifecycle_end_to_end() {
    let (_, store) = new_store();
    store.create_bucket("b1").await.unwrap();

    let src = TempDir::new().unwrap();
    write(src.path(), "f1.txt", b"first file");
    write(src.path(), "sub/f2.txt", &[0x00, 0xff, 0x10]);
    store.upload_folder("b1", src.path(), "data/").await.unwrap();

    let listing = store.list("b1", "data/").await.unwrap();
    assert_eq!(listing.files, vec!["f1.txt"]);
    assert_eq!(listing.folders, vec!["sub"]);

    let out = TempDir::new().unwrap();
    store.download_folder("b1", "data/", out.path()).await.unwrap();
    assert_eq!(std::fs::read(out.path().join("f1.txt")).unwrap(), b"first file");
    assert_eq!(
        std::fs::read(out.path().join("sub").join("f2.txt")).unwrap(),
        vec![0x00, 0xff, 0x10]
    );

    store.delete_folder("b1", "data/").await.unwrap();
    assert!(!store.list("b1", "").await.unwrap().folders.contains(&"data".to_string()));

    store.delete_bucket("b1").await.unwrap();
}

#[tokio::test]
async fn rename_folder_then_bucket() {
    let (memory, store) = new_store();
    store.create_bucket("src-bucket").await.unwrap();

    let src = TempDir::new().unwrap();
    write(src.path(), "one.txt", b"1");
    write(src.path(), "nested/two.txt", b"2");
    write(src.path(), "nested/deeper/three.txt", b"3");
    store.upload_folder("src-bucket", src.path(), "docs").await.unwrap();

    store.rename_folder("src-bucket", "docs", "archive/docs").await.unwrap();
    assert!(!store.path_exists("src-bucket", "docs/").await.unwrap());
    assert_eq!(
        store.read_file("src-bucket", "archive/docs/nested/deeper/three.txt", Some("utf-8"))
            .await
            .unwrap()
            .as_text(),
        Some("3")
    );

    store.rename_bucket("src-bucket", "dst-bucket").await.unwrap();
    assert!(!store.bucket_exists("src-bucket").await.unwrap());
    assert_eq!(
        memory.keys("dst-bucket"),
        vec![
            "archive/",
            "archive/docs/",
            "archive/docs/nested/",
            "archive/docs/nested/deeper/",
            "archive/docs/nested/deeper/three.txt",
            "archive/docs/nested/two.txt",
            "archive/docs/one.txt",
        ]
    );
}

#[tokio::test]
async fn bucket_name_conflicts_from_provider() {
    let memory = Arc::new(MemoryStore::new());
    memory.claim_foreign("someone-elses");
    let store = PathStore::new(memory, "eu-central-1");

    let err = store.create_bucket("someone-elses").await.unwrap_err();
    assert!(matches!(err, Error::NameTaken(_)));
}
