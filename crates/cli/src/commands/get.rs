//! get command - Download a file or folder

use std::path::{Path, PathBuf};

use clap::Args;
use ps_core::{RemotePath, parse_remote};
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;

/// Download a file, or a folder tree with --recursive
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Remote source (bucket/key or bucket/folder)
    pub source: String,

    /// Local destination path
    pub target: PathBuf,

    /// Download a whole folder
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    status: &'static str,
    source: String,
    target: String,
}

/// Where a single remote file lands locally: inside `target` when it is an
/// existing directory, otherwise at `target` itself
fn local_destination(source: &RemotePath, target: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) if target.is_dir() => target.join(name),
        _ => target.to_path_buf(),
    }
}

/// Execute the get command
pub async fn execute(args: GetArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let source = match parse_remote(&args.source) {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };
    if !args.recursive && source.is_dir() {
        formatter.error(&format!(
            "'{source}' is a folder; pass --recursive to download it"
        ));
        return ExitCode::UsageError;
    }

    let store = match ctx.open_store().await {
        Ok(s) => s,
        Err(e) => return report(&formatter, &e),
    };

    let target = if args.recursive {
        args.target.clone()
    } else {
        local_destination(&source, &args.target)
    };

    let result = if args.recursive {
        store
            .download_folder(&source.bucket, &source.key, &target)
            .await
    } else {
        store.download_file(&source.bucket, &source.key, &target).await
    };

    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&GetOutput {
                    status: "success",
                    source: source.to_string(),
                    target: target.display().to_string(),
                });
            } else {
                formatter.success(&format!("Downloaded '{source}' to '{}'.", target.display()));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_destination_into_directory() {
        let dir = TempDir::new().unwrap();
        let source = RemotePath::new("b1", "docs/report.pdf");
        assert_eq!(
            local_destination(&source, dir.path()),
            dir.path().join("report.pdf")
        );
    }

    #[test]
    fn test_local_destination_explicit_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("renamed.pdf");
        let source = RemotePath::new("b1", "docs/report.pdf");
        assert_eq!(local_destination(&source, &target), target);
    }
}
