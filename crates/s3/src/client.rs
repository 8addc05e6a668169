//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from ps-core.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use ps_core::{BytesCallback, Error, ListPage, ObjectInfo, ObjectStore, Profile, Result};

use crate::transfer::{self, MultipartConfig};

/// Region in which buckets are created without a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    region: String,
    multipart: MultipartConfig,
}

impl S3Client {
    /// Create a client from a profile
    ///
    /// The profile is validated first; no request is sent until the first
    /// operation.
    pub async fn connect(profile: &Profile) -> Result<Self> {
        profile.validate()?;
        let creds = &profile.credentials;

        let credentials = aws_credential_types::Credentials::new(
            creds.access_key.clone(),
            creds.secret_key.clone(),
            None, // session token
            None, // expiry
            "pstore-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(creds.region.clone()));
        if let Some(endpoint) = &profile.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(profile.path_style)
            .build();

        tracing::debug!(
            profile = %profile.name,
            region = %creds.region,
            endpoint = profile.endpoint.as_deref().unwrap_or("default"),
            "connected S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            region: creds.region.clone(),
            multipart: MultipartConfig::default(),
        })
    }

    /// Region the client signs requests for
    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Translate an SDK failure into the crate's error kinds
pub(crate) fn map_sdk_error<E, R>(err: SdkError<E, R>, context: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().unwrap_or_default().to_string();
    let detail = DisplayErrorContext(&err).to_string();
    classify(&code, &detail, context)
}

fn classify(code: &str, detail: &str, context: &str) -> Error {
    let has = |needle: &str| code == needle || detail.contains(needle);

    if has("BucketAlreadyOwnedByYou") {
        Error::OwnedByCaller(format!("The bucket '{context}' is already owned by you"))
    } else if has("BucketAlreadyExists") {
        Error::NameTaken(format!("The bucket name '{context}' is taken by another account"))
    } else if has("BucketNotEmpty") {
        Error::NotEmpty(format!("The bucket '{context}' is not empty"))
    } else if has("NoSuchKey") || has("NoSuchBucket") || has("NotFound") {
        Error::NotFound(context.to_string())
    } else if has("AccessDenied") || has("InvalidAccessKeyId") || has("SignatureDoesNotMatch") {
        Error::Auth(format!("{context}: {detail}"))
    } else {
        Error::Store(format!("{context}: {detail}"))
    }
}

pub(crate) fn timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

fn object_size(size: Option<i64>) -> u64 {
    size.unwrap_or(0).max(0) as u64
}

/// Build the `x-amz-copy-source` value: bucket and key, percent-encoded
/// per path segment
fn copy_source(bucket: &str, key: &str) -> Result<String> {
    let mut url = url::Url::parse("s3://copy-source/")?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::InvalidPath(format!("cannot encode key '{key}'")))?;
        segments.pop_if_empty().push(bucket).extend(key.split('/'));
    }
    Ok(url.path().trim_start_matches('/').to_string())
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "list buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(b.name().unwrap_or_default());
                info.last_modified = b.creation_date().and_then(timestamp);
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match map_sdk_error(e, bucket) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        let mut info = ObjectInfo::file(key, object_size(response.content_length()));
        info.last_modified = response.last_modified().and_then(timestamp);
        info.etag = response.e_tag().map(|t| t.trim_matches('"').to_string());
        info.content_type = response.content_type().map(str::to_string);

        Ok(info)
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage> {
        let mut request = self.inner.list_objects_v2().bucket(bucket).prefix(prefix);
        if let Some(d) = delimiter {
            request = request.delimiter(d);
        }
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{prefix}")))?;

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let objects = response
            .contents()
            .iter()
            .map(|object| {
                let mut info = ObjectInfo::file(object.key().unwrap_or_default(), object_size(object.size()));
                info.last_modified = object.last_modified().and_then(timestamp);
                info.etag = object.e_tag().map(|t| t.trim_matches('"').to_string());
                info
            })
            .collect();

        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            common_prefixes,
            objects,
            next_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let context = format!("{bucket}/{key}");
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &context))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Store(format!("{context}: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);
        let mut request = self.inner.put_object().bucket(bucket).key(key).body(body);
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;
        Ok(())
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(copy_source(src_bucket, src_key)?)
            .bucket(dst_bucket)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{src_bucket}/{src_key}")))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut request = self.inner.create_bucket().bucket(bucket);
        if region != DEFAULT_REGION {
            let location = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build();
            request = request.create_bucket_configuration(location);
        }

        request.send().await.map_err(|e| map_sdk_error(e, bucket))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket))?;
        Ok(())
    }

    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| Error::InvalidArgument(format!("presign expiry: {e}")))?;

        let request = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        Ok(request.uri().to_string())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        on_bytes: BytesCallback<'_>,
    ) -> Result<()> {
        transfer::upload(&self.inner, &self.multipart, bucket, key, local, on_bytes).await
    }

    async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        local: &Path,
        on_bytes: BytesCallback<'_>,
    ) -> Result<()> {
        transfer::download(&self.inner, bucket, key, local, on_bytes).await
    }
}
