//! mb command - Make bucket
//!
//! Creates a new bucket in the active profile's region.

use clap::Args;
use ps_core::Error;
use ps_core::path::is_valid_bucket_name;
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;

/// Create a bucket
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Bucket name
    pub bucket: String,

    /// Ignore error if bucket already exists
    #[arg(short = 'p', long)]
    pub ignore_existing: bool,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    status: &'static str,
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Parse and validate a bucket argument
pub(crate) fn bucket_arg(raw: &str) -> ps_core::Result<String> {
    let bucket = raw.trim_matches('/').to_string();
    if !is_valid_bucket_name(&bucket) {
        return Err(Error::InvalidPath(format!(
            "'{bucket}' is not a valid bucket name (3-63 lowercase letters, digits, dots, hyphens)"
        )));
    }
    Ok(bucket)
}

/// Execute the mb command
pub async fn execute(args: MbArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let bucket = match bucket_arg(&args.bucket) {
        Ok(b) => b,
        Err(e) => return report(&formatter, &e),
    };

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    let (message, result) = match store.create_bucket(&bucket).await {
        Ok(()) => (None, Ok(())),
        Err(Error::AlreadyExists(_) | Error::OwnedByCaller(_)) if args.ignore_existing => {
            (Some("Bucket already exists".to_string()), Ok(()))
        }
        Err(e) => (None, Err(e)),
    };

    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    bucket,
                    message,
                });
            } else if message.is_some() {
                formatter.success(&format!("Bucket '{bucket}' already exists."));
            } else {
                formatter.success(&format!(
                    "Bucket '{bucket}' created in {}.",
                    store.region()
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
