//! ls command - List buckets or one folder level
//!
//! Without a path, lists buckets. With `bucket[/folder]`, lists the direct
//! sub-folders and files of that folder.

use clap::Args;
use ps_core::{Listing, parse_remote};
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// List buckets or folder contents
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (bucket[/folder]); omit to list buckets
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
struct BucketsOutput {
    buckets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LsOutput {
    bucket: String,
    prefix: String,
    #[serde(flatten)]
    listing: Listing,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let target = match args.path.as_deref().map(parse_remote).transpose() {
        Ok(t) => t,
        Err(e) => return report(&formatter, &e),
    };

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    let Some(target) = target else {
        return match store.list_buckets().await {
            Ok(buckets) => {
                print_buckets(&formatter, buckets);
                ExitCode::Success
            }
            Err(e) => report(&formatter, &e),
        };
    };

    match store.list(&target.bucket, &target.key).await {
        Ok(listing) => {
            print_listing(&formatter, target.bucket, target.key, listing);
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}

fn print_buckets(formatter: &Formatter, buckets: Vec<String>) {
    if formatter.is_json() {
        formatter.json(&BucketsOutput { buckets });
        return;
    }
    for bucket in &buckets {
        formatter.println(&formatter.folder(bucket));
    }
}

fn print_listing(formatter: &Formatter, bucket: String, prefix: String, listing: Listing) {
    if formatter.is_json() {
        formatter.json(&LsOutput {
            bucket,
            prefix,
            listing,
        });
        return;
    }
    for folder in &listing.folders {
        formatter.println(&formatter.folder(folder));
    }
    for file in &listing.files {
        formatter.println(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ls_output_flattens_listing() {
        let output = LsOutput {
            bucket: "b1".to_string(),
            prefix: "data".to_string(),
            listing: Listing {
                folders: vec!["sub".to_string()],
                files: vec!["a.txt".to_string()],
            },
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["bucket"], "b1");
        assert_eq!(json["folders"][0], "sub");
        assert_eq!(json["files"][0], "a.txt");
    }

    #[test]
    fn test_ls_rejects_bad_bucket() {
        assert!(parse_remote("Bad_Bucket/x").is_err());
    }
}
