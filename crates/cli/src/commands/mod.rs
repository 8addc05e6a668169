//! CLI command definitions and execution
//!
//! Every command resolves a profile, opens a PathStore and maps the
//! outcome onto an exit code. Remote paths are written `bucket[/key]`.

use clap::{Parser, Subcommand};
use ps_core::{ConfigManager, Defaults, Error, PathStore, Profile, ProfileManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, TransferProgress};

mod cat;
mod completions;
mod get;
mod ls;
mod mb;
mod mv;
mod profile;
mod put;
mod rb;
mod renamebucket;
mod rm;
mod share;
mod stat;

/// pstore - folder-oriented object storage client
///
/// Treats buckets on S3-compatible services as folder trees: list one
/// level at a time, and upload, download, rename or delete whole folders.
#[derive(Parser, Debug)]
#[command(name = "pstore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Profile to connect with; falls back to the AWS_* environment variables
    #[arg(short, long, global = true, env = "PSTORE_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage connection profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List buckets, or the folders and files of one folder level
    Ls(ls::LsArgs),

    /// Display file contents
    Cat(cat::CatArgs),

    /// Show file metadata
    Stat(stat::StatArgs),

    /// Download a file or folder
    Get(get::GetArgs),

    /// Upload a file or folder
    Put(put::PutArgs),

    /// Rename a file or folder within a bucket
    Mv(mv::MvArgs),

    /// Remove a file or folder
    Rm(rm::RmArgs),

    /// Generate a presigned download URL
    Share(share::ShareArgs),

    /// Create a bucket
    Mb(mb::MbArgs),

    /// Remove an empty bucket
    Rb(rb::RbArgs),

    /// Rename a bucket by copying it to a new one
    #[command(name = "renamebucket", visible_alias = "rename-bucket")]
    RenameBucket(renamebucket::RenameBucketArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub output: OutputConfig,
    pub profile: Option<String>,
    pub defaults: Defaults,
}

impl Context {
    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.output.clone())
    }

    /// Resolve the active profile: the named one, or the environment
    pub fn resolve_profile(&self) -> ps_core::Result<Profile> {
        match &self.profile {
            Some(name) => ProfileManager::new()?.get(name),
            None => Profile::from_env().map_err(|e| {
                Error::Config(format!(
                    "no profile selected: pass --profile or set the AWS_* variables ({e})"
                ))
            }),
        }
    }

    /// Connect to the active profile's service
    pub async fn open_store(&self) -> ps_core::Result<PathStore> {
        let profile = self.resolve_profile()?;
        tracing::debug!(profile = %profile.name, "opening store");
        Ok(ps_s3::open(&profile)
            .await?
            .with_options(self.defaults.store_options())
            .with_progress(TransferProgress::for_output(&self.output)))
    }
}

/// Print an error and return its exit code
pub(crate) fn report(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from_error(error)
}

/// Combine CLI flags with the configuration file defaults
fn build_context(cli: &Cli, defaults: Defaults) -> Context {
    let output = OutputConfig {
        json: cli.json || defaults.output == "json",
        no_color: cli.no_color || defaults.color == "never",
        no_progress: cli.no_progress || !defaults.progress,
        quiet: cli.quiet,
    };
    if output.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    Context {
        output,
        profile: cli.profile.clone(),
        defaults,
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let defaults = match ConfigManager::new().and_then(|m| m.load()) {
        Ok(config) => config.defaults,
        Err(e) => {
            let formatter = Formatter::new(OutputConfig {
                json: cli.json,
                no_color: cli.no_color,
                ..Default::default()
            });
            return report(&formatter, &e);
        }
    };
    let ctx = build_context(&cli, defaults);

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, &ctx),
        Commands::Ls(args) => ls::execute(args, &ctx).await,
        Commands::Cat(args) => cat::execute(args, &ctx).await,
        Commands::Stat(args) => stat::execute(args, &ctx).await,
        Commands::Get(args) => get::execute(args, &ctx).await,
        Commands::Put(args) => put::execute(args, &ctx).await,
        Commands::Mv(args) => mv::execute(args, &ctx).await,
        Commands::Rm(args) => rm::execute(args, &ctx).await,
        Commands::Share(args) => share::execute(args, &ctx).await,
        Commands::Mb(args) => mb::execute(args, &ctx).await,
        Commands::Rb(args) => rb::execute(args, &ctx).await,
        Commands::RenameBucket(args) => renamebucket::execute(args, &ctx).await,
        Commands::Completions(args) => completions::execute(args),
    }
}
