//! File transfers with byte progress
//!
//! Uploads above the multipart threshold are sent as sequential parts, one
//! progress callback per part. Smaller files go up in a single PutObject.
//! Downloads stream the body to disk, one callback per received chunk.

use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use ps_core::{BytesCallback, Error, Result};

use crate::client::map_sdk_error;

/// Files larger than this are uploaded in parts: 8 MiB
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 8 * 1024 * 1024;

/// Default part size: 8 MiB
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: usize = 10_000;

/// Multipart upload configuration
#[derive(Debug, Clone)]
pub(crate) struct MultipartConfig {
    /// Size above which uploads use multipart
    threshold: u64,

    /// Preferred part size in bytes
    part_size: u64,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MULTIPART_THRESHOLD,
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl MultipartConfig {
    /// Whether a file of `file_size` bytes goes up in parts
    pub(crate) fn use_multipart(&self, file_size: u64) -> bool {
        file_size > self.threshold
    }

    /// Part size for a file, kept within 5 MiB..5 GiB and grown when needed
    /// to stay within 10,000 parts
    pub(crate) fn calculate_part_size(&self, file_size: u64) -> u64 {
        if file_size <= MIN_PART_SIZE {
            return MIN_PART_SIZE;
        }

        let part_size = self.part_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        let parts = file_size.div_ceil(part_size);
        if parts <= MAX_PARTS as u64 {
            part_size
        } else {
            let required_size = file_size.div_ceil(MAX_PARTS as u64);
            required_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Calculate number of parts for a file
pub fn calculate_parts(file_size: u64, part_size: u64) -> usize {
    file_size.div_ceil(part_size) as usize
}

/// Get byte range for a part
pub fn part_byte_range(part_number: i32, part_size: u64, total_size: u64) -> (u64, u64) {
    let start = (part_number as u64 - 1) * part_size;
    let end = (start + part_size).min(total_size);
    (start, end)
}

fn content_type_for(local: &Path) -> Option<String> {
    mime_guess::from_path(local).first().map(|m| m.to_string())
}

/// Upload `local` to `bucket/key`
pub(crate) async fn upload(
    client: &aws_sdk_s3::Client,
    config: &MultipartConfig,
    bucket: &str,
    key: &str,
    local: &Path,
    on_bytes: BytesCallback<'_>,
) -> Result<()> {
    let size = tokio::fs::metadata(local).await?.len();
    let content_type = content_type_for(local);

    if !config.use_multipart(size) {
        let data = tokio::fs::read(local).await?;
        let mut request = client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data));
        if let Some(ct) = &content_type {
            request = request.content_type(ct);
        }
        request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;
        on_bytes(size);
        return Ok(());
    }

    let mut request = client.create_multipart_upload().bucket(bucket).key(key);
    if let Some(ct) = &content_type {
        request = request.content_type(ct);
    }
    let created = request
        .send()
        .await
        .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;
    let upload_id = created
        .upload_id()
        .ok_or_else(|| Error::Store(format!("{bucket}/{key}: no upload id returned")))?
        .to_string();

    let part_size = config.calculate_part_size(size);
    tracing::debug!(
        bucket,
        key,
        size,
        part_size,
        parts = calculate_parts(size, part_size),
        "starting multipart upload"
    );

    match upload_parts(client, bucket, key, &upload_id, local, size, part_size, on_bytes).await {
        Ok(parts) => {
            client
                .complete_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(parts))
                        .build(),
                )
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;
            Ok(())
        }
        Err(e) => {
            if let Err(abort) = client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                tracing::warn!(bucket, key, upload_id, error = %abort, "failed to abort multipart upload");
            }
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn upload_parts(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
    local: &Path,
    size: u64,
    part_size: u64,
    on_bytes: BytesCallback<'_>,
) -> Result<Vec<CompletedPart>> {
    let mut file = tokio::fs::File::open(local).await?;
    let mut parts = Vec::with_capacity(calculate_parts(size, part_size));

    for index in 0..calculate_parts(size, part_size) {
        let part_number = index as i32 + 1;
        let (start, end) = part_byte_range(part_number, part_size, size);
        let mut buf = vec![0u8; (end - start) as usize];
        file.read_exact(&mut buf).await?;

        let response = client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(buf))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key} part {part_number}")))?;

        parts.push(
            CompletedPart::builder()
                .set_e_tag(response.e_tag().map(str::to_string))
                .part_number(part_number)
                .build(),
        );
        on_bytes(end - start);
    }

    Ok(parts)
}

/// Download `bucket/key` into `local`, truncating any existing file
pub(crate) async fn download(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    local: &Path,
    on_bytes: BytesCallback<'_>,
) -> Result<()> {
    let context = format!("{bucket}/{key}");
    let response = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, &context))?;

    let mut body = response.body;
    let mut file = tokio::fs::File::create(local).await?;
    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| Error::Store(format!("{context}: {e}")))?
    {
        file.write_all(&chunk).await?;
        on_bytes(chunk.len() as u64);
    }
    file.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MultipartConfig::default();
        assert_eq!(config.part_size, DEFAULT_PART_SIZE);
        assert_eq!(config.threshold, DEFAULT_MULTIPART_THRESHOLD);
    }

    #[test]
    fn test_threshold() {
        let config = MultipartConfig::default();
        assert!(!config.use_multipart(DEFAULT_MULTIPART_THRESHOLD));
        assert!(config.use_multipart(DEFAULT_MULTIPART_THRESHOLD + 1));
        assert!(!config.use_multipart(0));

        let config = MultipartConfig {
            threshold: 0,
            ..MultipartConfig::default()
        };
        assert!(config.use_multipart(1));
    }

    #[test]
    fn test_part_size_clamping() {
        let file_size = 64 * 1024 * 1024;

        let config = MultipartConfig {
            part_size: 0,
            ..MultipartConfig::default()
        };
        assert_eq!(config.calculate_part_size(file_size), MIN_PART_SIZE);

        let config = MultipartConfig {
            part_size: 1024,
            ..MultipartConfig::default()
        };
        assert_eq!(config.calculate_part_size(file_size), MIN_PART_SIZE);

        let config = MultipartConfig {
            part_size: 10 * 1024 * 1024 * 1024,
            ..MultipartConfig::default()
        };
        assert_eq!(config.calculate_part_size(file_size * 1024), MAX_PART_SIZE);
    }

    #[test]
    fn test_calculate_part_size_large_file() {
        let config = MultipartConfig::default();
        let huge_file = DEFAULT_PART_SIZE * 20_000;
        let size = config.calculate_part_size(huge_file);
        assert!(size > DEFAULT_PART_SIZE);
        assert!(calculate_parts(huge_file, size) <= MAX_PARTS);
    }

    #[test]
    fn test_part_byte_range() {
        assert_eq!(part_byte_range(1, 100, 250), (0, 100));
        assert_eq!(part_byte_range(2, 100, 250), (100, 200));
        assert_eq!(part_byte_range(3, 100, 250), (200, 250));
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for(Path::new("a/page.html")).as_deref(), Some("text/html"));
        assert_eq!(content_type_for(Path::new("noext")), None);
    }
}
