//! share command - Generate a presigned download URL

use std::time::Duration;

use clap::Args;
use ps_core::parse_remote;
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;

/// Generate a time-limited URL for downloading a file without credentials
#[derive(Args, Debug)]
pub struct ShareArgs {
    /// File to share (bucket/key)
    pub path: String,

    /// URL lifetime in seconds (1 second to 7 days)
    #[arg(short, long)]
    pub expires: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ShareOutput {
    path: String,
    url: String,
    expires_in_secs: u64,
}

/// Execute the share command
pub async fn execute(args: ShareArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let target = match parse_remote(&args.path) {
        Ok(t) => t,
        Err(e) => return report(&formatter, &e),
    };

    let mut store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };
    if let Some(secs) = args.expires {
        let options = store.options().presign_expiry(Duration::from_secs(secs));
        store = store.with_options(options);
    }
    let expires_in_secs = store.options().presign_expiry.as_secs();

    match store
        .get_presigned_url_file(&target.bucket, &target.key)
        .await
    {
        Ok(url) => {
            if formatter.is_json() {
                formatter.json(&ShareOutput {
                    path: target.to_string(),
                    url,
                    expires_in_secs,
                });
            } else {
                formatter.println(&url);
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}
