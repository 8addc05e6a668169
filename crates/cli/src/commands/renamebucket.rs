//! renamebucket command - Rename a bucket
//!
//! Buckets cannot be renamed in place. The new bucket is created, every
//! object is copied, then the old bucket is emptied and deleted. A failure
//! partway leaves both buckets behind.

use clap::Args;
use serde::Serialize;

use super::mb::bucket_arg;
use super::{Context, report};
use crate::exit_code::ExitCode;

/// Rename a bucket by copying its contents
#[derive(Args, Debug)]
pub struct RenameBucketArgs {
    /// Current bucket name
    pub old: String,

    /// New bucket name
    pub new: String,
}

#[derive(Debug, Serialize)]
struct RenameBucketOutput {
    status: &'static str,
    old: String,
    new: String,
}

/// Execute the renamebucket command
pub async fn execute(args: RenameBucketArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let (old, new) = match (bucket_arg(&args.old), bucket_arg(&args.new)) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) | (_, Err(e)) => return report(&formatter, &e),
    };

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    match store.rename_bucket(&old, &new).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RenameBucketOutput {
                    status: "success",
                    old,
                    new,
                });
            } else {
                formatter.success(&format!("Bucket '{old}' renamed to '{new}'."));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
