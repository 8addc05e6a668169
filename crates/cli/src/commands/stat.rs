//! stat command - Show file metadata

use clap::Args;
use ps_core::{ObjectInfo, parse_remote};

use super::{Context, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Show file metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// File to inspect (bucket/key)
    pub path: String,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let target = match parse_remote(&args.path) {
        Ok(t) => t,
        Err(e) => return report(&formatter, &e),
    };

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    match store.stat(&target.bucket, &target.key).await {
        Ok(info) => {
            print_info(&formatter, &target.bucket, &info);
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}

fn info_rows(bucket: &str, info: &ObjectInfo) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["Bucket".to_string(), bucket.to_string()],
        vec!["Key".to_string(), info.key.clone()],
    ];
    if let (Some(bytes), Some(human)) = (info.size_bytes, &info.size_human) {
        rows.push(vec!["Size".to_string(), format!("{human} ({bytes} bytes)")]);
    }
    if let Some(modified) = info.last_modified {
        rows.push(vec![
            "Modified".to_string(),
            modified.strftime("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ]);
    }
    if let Some(etag) = &info.etag {
        rows.push(vec!["ETag".to_string(), etag.clone()]);
    }
    if let Some(ct) = &info.content_type {
        rows.push(vec!["Content-Type".to_string(), ct.clone()]);
    }
    rows
}

fn print_info(formatter: &Formatter, bucket: &str, info: &ObjectInfo) {
    if formatter.is_json() {
        formatter.json(info);
    } else {
        formatter.table(&["Field", "Value"], info_rows(bucket, info));
    }
}
