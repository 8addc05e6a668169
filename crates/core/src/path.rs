//! Path parsing and normalization
//!
//! Object keys use `/` as a logical folder delimiter. A key ending in `/`
//! names a folder. Remote paths on the command line are written
//! `bucket[/key]`; local paths are plain filesystem paths.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Folder delimiter used for keys and listings
pub const DELIMITER: char = '/';

/// A parsed remote path pointing to an object or folder in a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Bucket name
    pub bucket: String,
    /// Object key (empty for bucket root)
    pub key: String,
}

impl RemotePath {
    /// Create a new RemotePath, stripping a leading slash from the key
    pub fn new(bucket: impl Into<String>, key: impl AsRef<str>) -> Self {
        Self {
            bucket: bucket.into(),
            key: strip_leading_slash(key.as_ref()).to_string(),
        }
    }

    /// Whether the key addresses a folder (or the bucket root)
    pub fn is_dir(&self) -> bool {
        self.key.is_empty() || self.key.ends_with(DELIMITER)
    }

    /// Get the final key component, without any trailing slash
    pub fn file_name(&self) -> Option<&str> {
        self.key
            .trim_end_matches(DELIMITER)
            .rsplit(DELIMITER)
            .next()
            .filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.key)
        }
    }
}

/// Parse `bucket[/key]` into a RemotePath
pub fn parse_remote(path: &str) -> Result<RemotePath> {
    let path = strip_leading_slash(path);
    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let (bucket, key) = match path.split_once(DELIMITER) {
        Some((bucket, key)) => (bucket, key),
        None => (path, ""),
    };

    if !is_valid_bucket_name(bucket) {
        return Err(Error::InvalidPath(format!(
            "'{bucket}' is not a valid bucket name. Use format: bucket[/key]"
        )));
    }

    Ok(RemotePath::new(bucket, key))
}

/// Remove a single leading slash
pub fn strip_leading_slash(key: &str) -> &str {
    key.strip_prefix(DELIMITER).unwrap_or(key)
}

/// Normalize a folder key: no leading slash, exactly one trailing slash.
/// The empty key (bucket root) stays empty.
pub fn folder_key(key: &str) -> String {
    let key = strip_leading_slash(key);
    if key.is_empty() || key.ends_with(DELIMITER) {
        key.to_string()
    } else {
        format!("{key}{DELIMITER}")
    }
}

/// Join a child name onto a folder key
pub fn join_key(folder: &str, child: &str) -> String {
    let base = folder.trim_end_matches(DELIMITER);
    if base.is_empty() {
        child.to_string()
    } else {
        format!("{base}{DELIMITER}{child}")
    }
}

/// Build the destination key for a local file found under `root`,
/// normalizing platform separators to `/`.
pub fn relative_key(prefix: &str, root: &Path, local: &Path) -> String {
    let relative = local.strip_prefix(root).unwrap_or(local);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    join_key(prefix, &parts.join("/"))
}

/// Resolve a listed child name under a local directory
///
/// Returns None when the name is empty or has any component other than a
/// plain name (`..`, `.`, a root or a drive prefix), so the result always
/// stays inside `root`.
pub fn local_child(root: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let mut components = relative.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(relative))
    } else {
        None
    }
}

/// Bucket names are 3-63 characters of lowercase letters, digits, dots and hyphens
pub fn is_valid_bucket_name(name: &str) -> bool {
    (3..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        && !name.starts_with(['.', '-'])
        && !name.ends_with(['.', '-'])
}
