//! ps-s3: S3 SDK adapter for pathstore
//!
//! This crate provides the implementation of the ObjectStore trait
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

use std::sync::Arc;

use ps_core::{PathStore, Profile, Result};

pub mod client;
mod transfer;

pub use client::S3Client;

/// Connect to the service described by `profile` and wrap it in a
/// PathStore that creates buckets in the profile's region
pub async fn open(profile: &Profile) -> Result<PathStore> {
    let client = S3Client::connect(profile).await?;
    let region = client.region().to_string();
    Ok(PathStore::new(Arc::new(client), region))
}
