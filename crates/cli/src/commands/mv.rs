//! mv command - Rename a file or folder within a bucket
//!
//! Renames are copy-then-delete and not atomic: an interrupted folder
//! rename leaves children split between the old and new locations.

use clap::Args;
use ps_core::{RemotePath, parse_remote};
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;

/// Rename a file, or a folder tree with --recursive
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Current path (bucket/key)
    pub source: String,

    /// New path in the same bucket (bucket/key)
    pub target: String,

    /// Rename a whole folder
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
struct MvOutput {
    status: &'static str,
    source: String,
    target: String,
}

fn parse_pair(source: &str, target: &str) -> ps_core::Result<(RemotePath, RemotePath)> {
    let source = parse_remote(source)?;
    let target = parse_remote(target)?;
    if source.bucket != target.bucket {
        return Err(ps_core::Error::InvalidPath(format!(
            "cannot move across buckets ('{}' to '{}'); use renamebucket or get/put",
            source.bucket, target.bucket
        )));
    }
    Ok((source, target))
}

/// Execute the mv command
pub async fn execute(args: MvArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let (source, target) = match parse_pair(&args.source, &args.target) {
        Ok(pair) => pair,
        Err(e) => return report(&formatter, &e),
    };
    if !args.recursive && source.is_dir() {
        formatter.error(&format!("'{source}' is a folder; pass --recursive to move it"));
        return ExitCode::UsageError;
    }

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    let result = if args.recursive {
        store
            .rename_folder(&source.bucket, &source.key, &target.key)
            .await
    } else {
        store
            .rename_file(&source.bucket, &source.key, &target.key)
            .await
    };

    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MvOutput {
                    status: "success",
                    source: source.to_string(),
                    target: target.to_string(),
                });
            } else {
                formatter.success(&format!("Moved '{source}' to '{target}'."));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
