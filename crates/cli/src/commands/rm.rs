//! rm command - Remove a file or folder

use clap::Args;
use ps_core::parse_remote;
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;

/// Remove a file, or a folder tree with --recursive
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path to remove (bucket/key or bucket/folder); `bucket/` with
    /// --recursive empties the bucket
    pub path: String,

    /// Remove a folder and everything under it
    #[arg(short, long)]
    pub recursive: bool,

    /// Keep the folder's own marker key
    #[arg(long, requires = "recursive")]
    pub keep_marker: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    removed: String,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let target = match parse_remote(&args.path) {
        Ok(t) => t,
        Err(e) => return report(&formatter, &e),
    };
    if !args.recursive && target.is_dir() {
        formatter.error(&format!("'{target}' is a folder; pass --recursive to remove it"));
        return ExitCode::UsageError;
    }

    let mut store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };
    if args.keep_marker {
        let options = store.options().delete_folder_markers(false);
        store = store.with_options(options);
    }

    let result = if args.recursive {
        store.delete_folder(&target.bucket, &target.key).await
    } else {
        store.delete_file(&target.bucket, &target.key).await
    };

    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&RmOutput {
                    status: "success",
                    removed: target.to_string(),
                });
            } else {
                formatter.success(&format!("Removed '{target}'."));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
