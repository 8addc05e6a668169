//! rb command - Remove bucket
//!
//! Only empty buckets are removed; clear a bucket first with `rm -r`.

use clap::Args;
use serde::Serialize;

use super::mb::bucket_arg;
use super::{Context, report};
use crate::exit_code::ExitCode;

/// Remove an empty bucket
#[derive(Args, Debug)]
pub struct RbArgs {
    /// Bucket name
    pub bucket: String,
}

#[derive(Debug, Serialize)]
struct RbOutput {
    status: &'static str,
    bucket: String,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let bucket = match bucket_arg(&args.bucket) {
        Ok(b) => b,
        Err(e) => return report(&formatter, &e),
    };

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    match store.delete_bucket(&bucket).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RbOutput {
                    status: "success",
                    bucket,
                });
            } else {
                formatter.success(&format!("Bucket '{bucket}' removed."));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
