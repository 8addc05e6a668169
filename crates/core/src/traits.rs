//! ObjectStore trait definition
//!
//! This trait is the contract PathStore consumes from the underlying
//! object-storage client. It keeps the facade independent of any SDK, so
//! the S3 adapter and the in-memory store are interchangeable.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Callback fed the number of bytes moved by each transfer step
pub type BytesCallback<'a> = &'a (dyn Fn(u64) + Send + Sync);

/// Metadata for an object or bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets and prefixes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a stored object
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size, humansize::BINARY)),
            last_modified: None,
            etag: None,
            content_type: None,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            content_type: None,
        }
    }
}

/// One page of a delimited listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Full keys of folder-like prefixes, each ending in the delimiter
    pub common_prefixes: Vec<String>,

    /// Objects directly under the prefix, with full keys
    pub objects: Vec<ObjectInfo>,

    /// Token for the next page, None on the last page
    pub next_token: Option<String>,
}

impl ListPage {
    /// Whether the page carries neither prefixes nor objects
    pub fn is_empty(&self) -> bool {
        self.common_prefixes.is_empty() && self.objects.is_empty()
    }
}

/// Trait for S3-compatible storage operations
///
/// Every method is a single provider call. Existence checks, path
/// normalization and folder recursion live in [`crate::PathStore`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List bucket names with their metadata
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// Check if a bucket exists (404 means false, other failures propagate)
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Get object metadata, `Error::NotFound` when the key is absent
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo>;

    /// List one page of keys under `prefix`, grouped by `delimiter`
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage>;

    /// Get object content as bytes
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store bytes at a key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()>;

    /// Server-side copy; the store has no rename primitive
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()>;

    /// Delete a single key
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Create a bucket in `region`
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Generate a time-limited unauthenticated GET URL
    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String>;

    /// Upload a local file, reporting bytes sent
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        on_bytes: BytesCallback<'_>,
    ) -> Result<()>;

    /// Download an object into a local file, reporting bytes received
    async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        on_bytes: BytesCallback<'_>,
    ) -> Result<()>;
}
