//! PathStore: folder semantics over a flat object store
//!
//! Every operation checks its preconditions (bucket present, source path
//! present, destination absent) before the first mutating call, then runs a
//! sequence of single-key store calls. Folder operations walk one listing
//! level at a time and process children strictly in order.
//!
//! Renames of files, folders and buckets are copy-then-delete. They are not
//! atomic: a failure partway through leaves both the old and the new
//! location partially populated, and nothing is rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::StoreOptions;
use crate::content::{FileContent, TextEncoding};
use crate::error::{Error, Result};
use crate::path::{
    DELIMITER, folder_key, join_key, local_child, relative_key, strip_leading_slash,
};
use crate::progress::{Progress, ProgressUnit, no_progress};
use crate::traits::{ObjectInfo, ObjectStore};

const DELIMITER_STR: &str = "/";

/// One level of a folder: direct sub-folders and files, names relative to
/// the listed prefix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

impl Listing {
    /// Number of direct children
    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// One directory of a local tree walk
struct LocalDir {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

/// Folder-oriented facade over an [`ObjectStore`]
pub struct PathStore {
    client: Arc<dyn ObjectStore>,
    region: String,
    options: StoreOptions,
    progress: Arc<dyn Progress>,
}

impl PathStore {
    /// Wrap a store client; buckets are created in `region`
    pub fn new(client: Arc<dyn ObjectStore>, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
            options: StoreOptions::default(),
            progress: no_progress(),
        }
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Report progress to `progress` instead of discarding it
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    // ------------------------- Existence checks -------------------------

    /// Check whether a bucket exists
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.client.bucket_exists(bucket).await
    }

    /// Check whether a file or folder exists
    ///
    /// A path ending in `/` is a folder and exists when at least one key
    /// starts with it. Any other path is a file, probed with a head request.
    pub async fn path_exists(&self, bucket: &str, path: &str) -> Result<bool> {
        let path = strip_leading_slash(path);
        if path.is_empty() || path.ends_with(DELIMITER) {
            let page = self
                .client
                .list_page(bucket, path, Some(DELIMITER_STR), None)
                .await?;
            Ok(!page.is_empty())
        } else {
            match self.client.head_object(bucket, path).await {
                Ok(_) => Ok(true),
                Err(Error::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            }
        }
    }

    async fn require_bucket(&self, bucket: &str) -> Result<()> {
        if self.bucket_exists(bucket).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("The bucket '{bucket}' does not exist")))
        }
    }

    async fn require_path(&self, bucket: &str, path: &str, kind: &str) -> Result<()> {
        if self.path_exists(bucket, path).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!(
                "The {kind} '{path}' does not exist in the bucket '{bucket}'"
            )))
        }
    }

    async fn require_absent(&self, bucket: &str, path: &str, kind: &str) -> Result<()> {
        if self.path_exists(bucket, path).await? {
            Err(Error::AlreadyExists(format!(
                "A {kind} already exists at '{path}' in the bucket '{bucket}'"
            )))
        } else {
            Ok(())
        }
    }

    // ------------------------- Listing -------------------------

    /// Names of every bucket visible to the credentials
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let buckets = self.client.list_buckets().await?;
        Ok(buckets.into_iter().map(|b| b.key).collect())
    }

    /// List the folders and files directly under `prefix`
    ///
    /// The prefix loses any leading slash and gains a trailing one. Order is
    /// the store's key order within a page and page order across pages.
    pub async fn list(&self, bucket: &str, prefix: &str) -> Result<Listing> {
        let prefix = folder_key(prefix);
        self.require_bucket(bucket).await?;
        if !prefix.is_empty() {
            self.require_path(bucket, &prefix, "path").await?;
        }
        self.list_level(bucket, &prefix).await
    }

    /// Paginated delimited listing of one level, without precondition checks
    async fn list_level(&self, bucket: &str, prefix: &str) -> Result<Listing> {
        let mut listing = Listing::default();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_page(bucket, prefix, Some(DELIMITER_STR), token.as_deref())
                .await?;

            for common in &page.common_prefixes {
                let name = common[prefix.len()..].trim_end_matches(DELIMITER);
                listing.folders.push(name.to_string());
            }
            for object in &page.objects {
                // the folder's own marker is not a child of itself
                if object.key == prefix {
                    continue;
                }
                listing.files.push(object.key[prefix.len()..].to_string());
            }

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::debug!(
            bucket,
            prefix,
            folders = listing.folders.len(),
            files = listing.files.len(),
            "listed one level"
        );
        Ok(listing)
    }

    // ------------------------- File operations -------------------------

    /// Metadata of a single file
    pub async fn stat(&self, bucket: &str, path: &str) -> Result<ObjectInfo> {
        let path = strip_leading_slash(path);
        self.require_bucket(bucket).await?;
        match self.client.head_object(bucket, path).await {
            Err(Error::NotFound(_)) => Err(Error::NotFound(format!(
                "The file '{path}' does not exist in the bucket '{bucket}'"
            ))),
            other => other,
        }
    }

    /// Read a file's body, decoded when `encoding` is given
    pub async fn read_file(
        &self,
        bucket: &str,
        path: &str,
        encoding: Option<&str>,
    ) -> Result<FileContent> {
        let path = strip_leading_slash(path);
        let encoding = encoding.map(str::parse::<TextEncoding>).transpose()?;
        self.require_bucket(bucket).await?;
        self.require_path(bucket, path, "file").await?;

        let body = self.client.get_object(bucket, path).await?;
        match encoding {
            Some(encoding) => Ok(FileContent::Text(encoding.decode(body)?)),
            None => Ok(FileContent::Bytes(body)),
        }
    }

    /// Rename a file by copying it to `new_path` and deleting `old_path`
    ///
    /// If the delete fails after the copy succeeded, both keys remain.
    pub async fn rename_file(&self, bucket: &str, old_path: &str, new_path: &str) -> Result<()> {
        let old_path = strip_leading_slash(old_path);
        let new_path = strip_leading_slash(new_path);
        self.require_bucket(bucket).await?;
        self.require_path(bucket, old_path, "file").await?;
        self.require_absent(bucket, new_path, "file").await?;

        self.move_key(bucket, old_path, new_path).await?;
        tracing::info!(bucket, from = old_path, to = new_path, "renamed file");
        Ok(())
    }

    async fn move_key(&self, bucket: &str, from: &str, to: &str) -> Result<()> {
        self.client.copy_object(bucket, from, bucket, to).await?;
        if let Err(e) = self.client.delete_object(bucket, from).await {
            tracing::warn!(bucket, from, to, "copied but failed to delete source; both keys remain");
            return Err(e);
        }
        Ok(())
    }

    /// Download a file, reporting bytes received
    pub async fn download_file(&self, bucket: &str, path: &str, local: &Path) -> Result<()> {
        let path = strip_leading_slash(path);
        self.require_bucket(bucket).await?;
        self.require_path(bucket, path, "file").await?;
        self.fetch(bucket, path, local).await
    }

    async fn fetch(&self, bucket: &str, key: &str, local: &Path) -> Result<()> {
        let size = self.client.head_object(bucket, key).await?.size_bytes.unwrap_or(0);
        let label = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());

        let task = self.progress.start(&label, size, ProgressUnit::Bytes);
        self.client
            .download_file(bucket, key, local, &|n: u64| task.inc(n))
            .await?;
        task.finish();

        tracing::debug!(bucket, key, local = %local.display(), size, "downloaded file");
        Ok(())
    }

    /// Generate a time-limited URL granting unauthenticated GET access
    pub async fn get_presigned_url_file(&self, bucket: &str, path: &str) -> Result<String> {
        let path = strip_leading_slash(path);
        self.require_bucket(bucket).await?;
        self.require_path(bucket, path, "file").await?;
        self.client
            .presign_get(bucket, path, self.options.presign_expiry)
            .await
    }

    /// Upload a local file to `path`, reporting bytes sent
    pub async fn upload_file(&self, bucket: &str, local: &Path, path: &str) -> Result<()> {
        let path = strip_leading_slash(path);
        if !local.is_file() {
            return Err(Error::LocalNotFound(format!(
                "The file '{}' does not exist on the local file system",
                local.display()
            )));
        }
        self.require_bucket(bucket).await?;
        self.send(bucket, local, path).await
    }

    async fn send(&self, bucket: &str, local: &Path, key: &str) -> Result<()> {
        let size = std::fs::metadata(local)?.len();
        let label = format!("Uploading {}", local.display());

        let task = self.progress.start(&label, size, ProgressUnit::Bytes);
        self.client
            .upload_file(bucket, key, local, &|n: u64| task.inc(n))
            .await?;
        task.finish();

        tracing::debug!(bucket, key, local = %local.display(), size, "uploaded file");
        Ok(())
    }

    /// Delete a single file
    pub async fn delete_file(&self, bucket: &str, path: &str) -> Result<()> {
        let path = strip_leading_slash(path);
        self.require_bucket(bucket).await?;
        self.require_path(bucket, path, "file").await?;
        self.client.delete_object(bucket, path).await?;
        tracing::info!(bucket, key = path, "deleted file");
        Ok(())
    }

    // ------------------------- Folder operations -------------------------

    /// Download a folder tree into `local`
    ///
    /// Progress ticks once per direct child at each level.
    pub async fn download_folder(&self, bucket: &str, path: &str, local: &Path) -> Result<()> {
        let path = folder_key(path);
        self.require_bucket(bucket).await?;
        self.require_path(bucket, &path, "folder").await?;
        self.download_tree(bucket, path, local.to_path_buf()).await
    }

    fn download_tree<'a>(
        &'a self,
        bucket: &'a str,
        prefix: String,
        local: PathBuf,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let listing = self.list_level(bucket, &prefix).await?;

            // resolve every child before writing anything at this level
            let target = |name: &str, key: String| match local_child(&local, name) {
                Some(path) => Ok((key, path)),
                None => Err(Error::InvalidPath(format!(
                    "The key '{key}' in the bucket '{bucket}' would be written outside '{}'",
                    local.display()
                ))),
            };
            let files = listing
                .files
                .iter()
                .map(|file| target(file.as_str(), join_key(&prefix, file)))
                .collect::<Result<Vec<_>>>()?;
            let folders = listing
                .folders
                .iter()
                .map(|folder| target(folder.as_str(), format!("{prefix}{folder}{DELIMITER}")))
                .collect::<Result<Vec<_>>>()?;

            std::fs::create_dir_all(&local)?;
            let label = format!("Downloading folder: {}", local.display());
            let task = self.progress.start(&label, listing.len() as u64, ProgressUnit::Items);

            for (key, local_file) in &files {
                self.fetch(bucket, key, local_file).await?;
                task.inc(1);
            }

            for (child, local_dir) in folders {
                self.download_tree(bucket, child, local_dir).await?;
                task.inc(1);
            }

            task.finish();
            Ok(())
        }
        .boxed()
    }

    /// Upload a local folder tree under `path`
    ///
    /// Every file becomes an object at its relative path; every directory
    /// becomes a zero-byte marker key ending in `/`. Progress counts all
    /// files and directories of the tree, computed before the first upload.
    /// The local folder is checked before the bucket, as in `upload_file`.
    pub async fn upload_folder(&self, bucket: &str, local: &Path, path: &str) -> Result<()> {
        let path = folder_key(path);
        if !local.is_dir() {
            return Err(Error::LocalNotFound(format!(
                "The folder '{}' does not exist on the local file system",
                local.display()
            )));
        }
        self.require_bucket(bucket).await?;

        let tree = walk_local(local)?;
        let total: usize = tree.iter().map(|d| d.files.len() + d.dirs.len()).sum();
        let label = format!("Uploading folder: {}", local.display());
        let task = self.progress.start(&label, total as u64, ProgressUnit::Items);

        for dir in &tree {
            for file in &dir.files {
                let key = relative_key(&path, local, file);
                self.send(bucket, file, &key).await?;
                task.inc(1);
            }
            for sub in &dir.dirs {
                let key = format!("{}{DELIMITER}", relative_key(&path, local, sub));
                self.client.put_object(bucket, &key, Vec::new(), None).await?;
                task.inc(1);
            }
        }

        task.finish();
        tracing::info!(bucket, prefix = %path, items = total, "uploaded folder");
        Ok(())
    }

    /// Delete a folder and everything under it
    ///
    /// The folder's own marker key is removed afterwards when
    /// `StoreOptions::delete_folder_markers` is set.
    pub async fn delete_folder(&self, bucket: &str, path: &str) -> Result<()> {
        let path = folder_key(path);
        self.require_bucket(bucket).await?;
        self.require_path(bucket, &path, "folder").await?;
        self.delete_tree(bucket, path.clone(), self.options.delete_folder_markers)
            .await?;
        tracing::info!(bucket, prefix = %path, "deleted folder");
        Ok(())
    }

    fn delete_tree<'a>(
        &'a self,
        bucket: &'a str,
        prefix: String,
        delete_markers: bool,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let listing = self.list_level(bucket, &prefix).await?;
            let label = format!("Removing folder: {bucket}/{prefix}");
            let task = self.progress.start(&label, listing.len() as u64, ProgressUnit::Items);

            for file in &listing.files {
                self.client.delete_object(bucket, &join_key(&prefix, file)).await?;
                task.inc(1);
            }

            for folder in &listing.folders {
                let child = format!("{prefix}{folder}{DELIMITER}");
                self.delete_tree(bucket, child, delete_markers).await?;
                task.inc(1);
            }

            if delete_markers && !prefix.is_empty() {
                self.client.delete_object(bucket, &prefix).await?;
            }

            task.finish();
            Ok(())
        }
        .boxed()
    }

    /// Move a folder tree from `old_path` to `new_path` within a bucket
    pub async fn rename_folder(&self, bucket: &str, old_path: &str, new_path: &str) -> Result<()> {
        let old_path = folder_key(old_path);
        let new_path = folder_key(new_path);
        if old_path.is_empty() || new_path.is_empty() {
            return Err(Error::InvalidPath(
                "the bucket root cannot be renamed; use rename_bucket".into(),
            ));
        }
        if new_path.starts_with(&old_path) {
            return Err(Error::InvalidPath(format!(
                "cannot move folder '{old_path}' into itself ('{new_path}')"
            )));
        }

        self.require_bucket(bucket).await?;
        self.require_path(bucket, &old_path, "folder").await?;
        self.require_absent(bucket, &new_path, "folder").await?;

        self.rename_tree(bucket, old_path.clone(), new_path.clone())
            .await?;
        tracing::info!(bucket, from = %old_path, to = %new_path, "renamed folder");
        Ok(())
    }

    fn rename_tree<'a>(
        &'a self,
        bucket: &'a str,
        old_prefix: String,
        new_prefix: String,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let has_marker = self.marker_exists(bucket, &old_prefix).await?;
            if has_marker {
                self.client.copy_object(bucket, &old_prefix, bucket, &new_prefix).await?;
            }

            let listing = self.list_level(bucket, &old_prefix).await?;
            let label = format!("Renaming folder: {old_prefix} to {new_prefix}");
            let task = self.progress.start(&label, listing.len() as u64, ProgressUnit::Items);

            for file in &listing.files {
                self.move_key(bucket, &join_key(&old_prefix, file), &join_key(&new_prefix, file))
                    .await?;
                task.inc(1);
            }

            for folder in &listing.folders {
                self.rename_tree(
                    bucket,
                    format!("{old_prefix}{folder}{DELIMITER}"),
                    format!("{new_prefix}{folder}{DELIMITER}"),
                )
                .await?;
                task.inc(1);
            }

            if has_marker {
                self.client.delete_object(bucket, &old_prefix).await?;
            }

            task.finish();
            Ok(())
        }
        .boxed()
    }

    async fn marker_exists(&self, bucket: &str, marker: &str) -> Result<bool> {
        match self.client.head_object(bucket, marker).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ------------------------- Bucket operations -------------------------

    /// Create a bucket in the configured region
    pub async fn create_bucket(&self, name: &str) -> Result<()> {
        let name = name.replace(DELIMITER, "");
        if self.bucket_exists(&name).await? {
            return Err(Error::AlreadyExists(format!("The bucket '{name}' already exists")));
        }
        self.client.create_bucket(&name, &self.region).await?;
        tracing::info!(bucket = %name, region = %self.region, "created bucket");
        Ok(())
    }

    /// Delete an empty bucket
    pub async fn delete_bucket(&self, name: &str) -> Result<()> {
        let name = name.replace(DELIMITER, "");
        self.require_bucket(&name).await?;
        if !self.list_level(&name, "").await?.is_empty() {
            return Err(Error::NotEmpty(format!("The bucket '{name}' is not empty")));
        }
        self.client.delete_bucket(&name).await?;
        tracing::info!(bucket = %name, "deleted bucket");
        Ok(())
    }

    /// Rename a bucket: create the new one, copy every object, then empty
    /// and delete the old one
    pub async fn rename_bucket(&self, old_name: &str, new_name: &str) -> Result<()> {
        let old_name = old_name.replace(DELIMITER, "");
        let new_name = new_name.replace(DELIMITER, "");
        self.require_bucket(&old_name).await?;
        if self.bucket_exists(&new_name).await? {
            return Err(Error::AlreadyExists(format!(
                "The bucket '{new_name}' already exists"
            )));
        }

        self.create_bucket(&new_name).await?;
        self.copy_tree(&old_name, &new_name, String::new()).await?;
        self.delete_tree(&old_name, String::new(), true).await?;
        self.client.delete_bucket(&old_name).await?;

        tracing::info!(from = %old_name, to = %new_name, "renamed bucket");
        Ok(())
    }

    fn copy_tree<'a>(
        &'a self,
        src: &'a str,
        dst: &'a str,
        prefix: String,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let listing = self.list_level(src, &prefix).await?;
            let label = format!("Copying bucket: {src}/{prefix} to {dst}/{prefix}");
            let task = self.progress.start(&label, listing.len() as u64, ProgressUnit::Items);

            for file in &listing.files {
                let key = join_key(&prefix, file);
                self.client.copy_object(src, &key, dst, &key).await?;
                task.inc(1);
            }

            for folder in &listing.folders {
                let child = format!("{prefix}{folder}{DELIMITER}");
                self.client.put_object(dst, &child, Vec::new(), None).await?;
                self.copy_tree(src, dst, child).await?;
                task.inc(1);
            }

            task.finish();
            Ok(())
        }
        .boxed()
    }
}

/// Walk a local tree top-down, one entry per directory with its files and
/// sub-directories sorted by name. Symlinked directories are not followed.
fn walk_local(root: &Path) -> Result<Vec<LocalDir>> {
    let mut tree = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                dirs.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        dirs.sort();

        // reversed so the stack pops sub-directories in name order
        pending.extend(dirs.iter().rev().cloned());
        tree.push(LocalDir { files, dirs });
    }

    Ok(tree)
}
