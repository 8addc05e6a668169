//! In-memory ObjectStore
//!
//! Buckets and keys are held in ordered maps, so delimited listings come
//! back in lexicographic key order like a real provider. Pages are cut at a
//! configurable size to exercise pagination. Failures can be injected per
//! operation and key.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::traits::{BytesCallback, ListPage, ObjectInfo, ObjectStore};

/// Default number of entries per listing page (the S3 maximum)
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Transfer chunk reported to byte callbacks
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
    last_modified: jiff::Timestamp,
}

#[derive(Debug, Default)]
struct Bucket {
    region: String,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, Bucket>,
    foreign: BTreeSet<String>,
    failures: HashSet<(String, String)>,
    journal: Vec<String>,
}

/// ObjectStore backed by process memory
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

enum Entry {
    Prefix(String),
    Object(String),
}

impl Entry {
    fn name(&self) -> &str {
        match self {
            Entry::Prefix(p) => p,
            Entry::Object(k) => k,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cut listings into pages of `size` entries
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Reserve a bucket name for another account: invisible to
    /// `bucket_exists`, rejected by `create_bucket`
    pub fn claim_foreign(&self, bucket: impl Into<String>) {
        self.lock().foreign.insert(bucket.into());
    }

    /// Make every `op` ("get", "put", "copy", "delete") on `key` fail
    pub fn fail_on(&self, op: &str, key: impl Into<String>) {
        self.lock().failures.insert((op.to_string(), key.into()));
    }

    /// Mutating calls in the order they reached the store, as "op bucket/key"
    pub fn journal(&self) -> Vec<String> {
        self.lock().journal.clone()
    }

    /// All keys in a bucket, in order
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Region a bucket was created in
    pub fn bucket_region(&self, bucket: &str) -> Option<String> {
        self.lock().buckets.get(bucket).map(|b| b.region.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(state: &State, op: &str, key: &str) -> Result<()> {
        if state.failures.contains(&(op.to_string(), key.to_string())) {
            return Err(Error::Store(format!("injected {op} failure on '{key}'")));
        }
        Ok(())
    }

    fn bucket<'a>(state: &'a State, bucket: &str) -> Result<&'a Bucket> {
        state
            .buckets
            .get(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket '{bucket}'")))
    }

    fn bucket_mut<'a>(state: &'a mut State, bucket: &str) -> Result<&'a mut Bucket> {
        state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket '{bucket}'")))
    }

    fn info(key: &str, object: &StoredObject) -> ObjectInfo {
        let mut info = ObjectInfo::file(key, object.data.len() as u64);
        info.last_modified = Some(object.last_modified);
        info.content_type = object.content_type.clone();
        info
    }

    fn store(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, "put", key)?;
        let target = Self::bucket_mut(&mut state, bucket)?;
        target.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
                last_modified: jiff::Timestamp::now(),
            },
        );
        state.journal.push(format!("put {bucket}/{key}"));
        Ok(())
    }

    fn load(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let state = self.lock();
        Self::check(&state, "get", key)?;
        Self::bucket(&state, bucket)?
            .objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        Ok(self.lock().buckets.keys().map(ObjectInfo::bucket).collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.lock().buckets.contains_key(bucket))
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let state = self.lock();
        Self::bucket(&state, bucket)?
            .objects
            .get(key)
            .map(|o| Self::info(key, o))
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage> {
        let state = self.lock();
        let objects = &Self::bucket(&state, bucket)?.objects;

        let mut entries: Vec<Entry> = Vec::new();
        for key in objects.keys().filter(|k| k.starts_with(prefix)) {
            let rest = &key[prefix.len()..];
            let split = delimiter
                .filter(|d| !d.is_empty())
                .and_then(|d| rest.find(d).map(|i| i + d.len()));
            match split {
                Some(end) => {
                    let common = format!("{prefix}{}", &rest[..end]);
                    // keys under one prefix are contiguous in a BTreeMap
                    if !matches!(entries.last(), Some(Entry::Prefix(p)) if *p == common) {
                        entries.push(Entry::Prefix(common));
                    }
                }
                None => entries.push(Entry::Object(key.clone())),
            }
        }

        let mut remaining = entries
            .into_iter()
            .filter(|e| continuation.is_none_or(|token| e.name() > token))
            .peekable();

        let mut page = ListPage::default();
        let mut last = None;
        for entry in remaining.by_ref().take(self.page_size) {
            last = Some(entry.name().to_string());
            match entry {
                Entry::Prefix(p) => page.common_prefixes.push(p),
                Entry::Object(k) => page.objects.push(Self::info(&k, &objects[&k])),
            }
        }
        if remaining.peek().is_some() {
            page.next_token = last;
        }

        Ok(page)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.load(bucket, key)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        self.store(bucket, key, data, content_type)
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, "copy", src_key)?;
        let object = Self::bucket(&state, src_bucket)?
            .objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{src_bucket}/{src_key}")))?;
        Self::bucket_mut(&mut state, dst_bucket)?
            .objects
            .insert(dst_key.to_string(), object);
        state
            .journal
            .push(format!("copy {src_bucket}/{src_key} {dst_bucket}/{dst_key}"));
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, "delete", key)?;
        // S3 deletes are idempotent: a missing key is not an error
        Self::bucket_mut(&mut state, bucket)?.objects.remove(key);
        state.journal.push(format!("delete {bucket}/{key}"));
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut state = self.lock();
        if state.foreign.contains(bucket) {
            return Err(Error::NameTaken(bucket.to_string()));
        }
        if state.buckets.contains_key(bucket) {
            return Err(Error::OwnedByCaller(bucket.to_string()));
        }
        state.buckets.insert(
            bucket.to_string(),
            Bucket {
                region: region.to_string(),
                objects: BTreeMap::new(),
            },
        );
        state.journal.push(format!("create-bucket {bucket}"));
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.lock();
        if !Self::bucket(&state, bucket)?.objects.is_empty() {
            return Err(Error::NotEmpty(format!("bucket '{bucket}'")));
        }
        state.buckets.remove(bucket);
        state.journal.push(format!("delete-bucket {bucket}"));
        Ok(())
    }

    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
        let state = self.lock();
        Self::bucket(&state, bucket)?;
        Ok(format!(
            "memory://{bucket}/{key}?expires={}",
            expires_in.as_secs()
        ))
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        on_bytes: BytesCallback<'_>,
    ) -> Result<()> {
        let data = tokio::fs::read(local).await?;
        let sizes: Vec<u64> = data.chunks(CHUNK_SIZE).map(|c| c.len() as u64).collect();
        self.store(bucket, key, data, None)?;
        for size in sizes {
            on_bytes(size);
        }
        Ok(())
    }

    async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        on_bytes: BytesCallback<'_>,
    ) -> Result<()> {
        let data = self.load(bucket, key)?;
        let mut file = tokio::fs::File::create(local).await?;
        for chunk in data.chunks(CHUNK_SIZE) {
            file.write_all(chunk).await?;
            on_bytes(chunk.len() as u64);
        }
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(page_size: usize, keys: &[&str]) -> MemoryStore {
        let store = MemoryStore::new().with_page_size(page_size);
        store.create_bucket("b1", "us-east-1").await.unwrap();
        for key in keys {
            store.put_object("b1", key, key.as_bytes().to_vec(), None).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_delimited_listing() {
        let store = seeded(1000, &["data/a.txt", "data/sub/b.txt", "data/sub/c.txt", "top.txt"]).await;

        let page = store.list_page("b1", "data/", Some("/"), None).await.unwrap();
        assert_eq!(page.common_prefixes, vec!["data/sub/"]);
        let keys: Vec<_> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["data/a.txt"]);
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_pagination_covers_every_entry_once() {
        let store = seeded(2, &["a/1", "b.txt", "c/2", "c/3", "d.txt"]).await;

        let mut seen = Vec::new();
        let mut token = None;
        loop {
            let page = store.list_page("b1", "", Some("/"), token.as_deref()).await.unwrap();
            seen.extend(page.common_prefixes);
            seen.extend(page.objects.into_iter().map(|o| o.key));
            token = page.next_token;
            if token.is_none() {
                break;
            }
        }
        seen.sort();
        assert_eq!(seen, vec!["a/", "b.txt", "c/", "d.txt"]);
    }

    #[tokio::test]
    async fn test_bucket_lifecycle() {
        let store = MemoryStore::new();
        store.create_bucket("b1", "eu-west-1").await.unwrap();
        assert_eq!(store.bucket_region("b1").as_deref(), Some("eu-west-1"));
        assert!(matches!(
            store.create_bucket("b1", "eu-west-1").await,
            Err(Error::OwnedByCaller(_))
        ));

        store.put_object("b1", "k", vec![1], None).await.unwrap();
        assert!(matches!(store.delete_bucket("b1").await, Err(Error::NotEmpty(_))));

        store.delete_object("b1", "k").await.unwrap();
        store.delete_bucket("b1").await.unwrap();
        assert!(!store.bucket_exists("b1").await.unwrap());
    }

    #[tokio::test]
    async fn test_foreign_bucket_name() {
        let store = MemoryStore::new();
        store.claim_foreign("taken");
        assert!(!store.bucket_exists("taken").await.unwrap());
        assert!(matches!(
            store.create_bucket("taken", "us-east-1").await,
            Err(Error::NameTaken(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = seeded(1000, &["k"]).await;
        store.fail_on("delete", "k");
        assert!(matches!(store.delete_object("b1", "k").await, Err(Error::Store(_))));
        assert_eq!(store.keys("b1"), vec!["k"]);
    }
}
