//! put command - Upload a file or folder

use std::path::{Path, PathBuf};

use clap::Args;
use ps_core::{RemotePath, parse_remote};
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;

/// Upload a file, or a folder tree with --recursive
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local source path
    pub source: PathBuf,

    /// Remote destination (bucket/key or bucket/folder)
    pub target: String,

    /// Upload a whole folder
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    source: String,
    target: String,
}

/// Key for a single uploaded file: a folder target receives the local file
/// name, any other target is used as the key
fn remote_key(source: &Path, target: &RemotePath) -> String {
    match source.file_name() {
        Some(name) if target.is_dir() => {
            format!("{}{}", target.key, name.to_string_lossy())
        }
        _ => target.key.clone(),
    }
}

/// Execute the put command
pub async fn execute(args: PutArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let target = match parse_remote(&args.target) {
        Ok(t) => t,
        Err(e) => return report(&formatter, &e),
    };
    if !args.recursive && args.source.is_dir() {
        formatter.error(&format!(
            "'{}' is a directory; pass --recursive to upload it",
            args.source.display()
        ));
        return ExitCode::UsageError;
    }

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    let (result, key) = if args.recursive {
        let r = store
            .upload_folder(&target.bucket, &args.source, &target.key)
            .await;
        (r, target.key.clone())
    } else {
        let key = remote_key(&args.source, &target);
        let r = store.upload_file(&target.bucket, &args.source, &key).await;
        (r, key)
    };

    let destination = RemotePath::new(&target.bucket, &key);
    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&PutOutput {
                    status: "success",
                    source: args.source.display().to_string(),
                    target: destination.to_string(),
                });
            } else {
                formatter.success(&format!(
                    "Uploaded '{}' to '{destination}'.",
                    args.source.display()
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_key_into_folder() {
        let target = RemotePath::new("b1", "docs/");
        assert_eq!(remote_key(Path::new("/tmp/a.txt"), &target), "docs/a.txt");

        let root = RemotePath::new("b1", "");
        assert_eq!(remote_key(Path::new("/tmp/a.txt"), &root), "a.txt");
    }

    #[test]
    fn test_remote_key_explicit() {
        let target = RemotePath::new("b1", "docs/b.txt");
        assert_eq!(remote_key(Path::new("/tmp/a.txt"), &target), "docs/b.txt");
    }
}
