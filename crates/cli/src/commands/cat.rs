//! cat command - Display file contents
//!
//! Writes the raw bytes to stdout, or decodes them first when an encoding
//! is given.

use clap::Args;
use ps_core::{FileContent, parse_remote};
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;

/// Display file contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// File to display (bucket/key)
    pub path: String,

    /// Decode the body as text: utf-8, ascii or latin-1
    #[arg(short, long)]
    pub encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatOutput {
    path: String,
    size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let target = match parse_remote(&args.path) {
        Ok(t) => t,
        Err(e) => return report(&formatter, &e),
    };
    if target.is_dir() {
        formatter.error("cat requires a file path (bucket/key)");
        return ExitCode::UsageError;
    }

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    let content = match store
        .read_file(&target.bucket, &target.key, args.encoding.as_deref())
        .await
    {
        Ok(c) => c,
        Err(e) => return report(&formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&CatOutput {
            path: target.to_string(),
            size_bytes: content.len(),
            text: content.as_text().map(str::to_string),
        });
        return ExitCode::Success;
    }

    let written = match content {
        FileContent::Text(text) => formatter.raw(text.as_bytes()),
        FileContent::Bytes(bytes) => formatter.raw(&bytes),
    };
    match written {
        Ok(()) => ExitCode::Success,
        Err(e) => report(&formatter, &e.into()),
    }
}
