//! Profile management commands
//!
//! Profiles are named connections to S3-compatible services: credentials,
//! region and an optional custom endpoint.

use clap::Subcommand;
use ps_core::{Credentials, Profile, ProfileManager};
use serde::Serialize;

use super::{Context, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Profile subcommands for managing storage connections
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or replace a profile
    Set(SetArgs),

    /// List all configured profiles
    List,

    /// Remove a profile
    Remove(RemoveArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "aws", "minio")
    pub name: String,

    /// Access key ID
    #[arg(long)]
    pub access_key: String,

    /// Secret access key
    #[arg(long)]
    pub secret_key: String,

    /// Region buckets are created in
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Custom endpoint URL for S3-compatible services
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub path_style: bool,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

/// Profile information for output (without secrets)
#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    path_style: bool,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            region: profile.credentials.region.clone(),
            endpoint: profile.endpoint.clone(),
            path_style: profile.path_style,
        }
    }
}

#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub fn execute(cmd: ProfileCommands, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();
    let manager = match ProfileManager::new() {
        Ok(m) => m,
        Err(e) => return report(&formatter, &e),
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, &formatter),
        ProfileCommands::List => execute_list(&manager, &formatter),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn profile_from_args(args: SetArgs) -> Profile {
    let mut profile = Profile::new(
        args.name,
        Credentials::new(args.access_key, args.secret_key, args.region),
    )
    .with_path_style(args.path_style);
    if let Some(endpoint) = args.endpoint {
        profile = profile.with_endpoint(endpoint);
    }
    profile
}

fn execute_set(args: SetArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    if args.name.trim().is_empty() {
        formatter.error("Profile name cannot be empty");
        return ExitCode::UsageError;
    }

    let profile = profile_from_args(args);
    let name = profile.name.clone();
    if let Err(e) = manager.set(profile) {
        return report(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&ProfileOperationOutput {
            success: true,
            profile: name,
            message: "Profile saved".to_string(),
        });
    } else {
        formatter.success(&format!("Profile '{name}' saved."));
    }
    ExitCode::Success
}

fn execute_list(manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profiles = match manager.list() {
        Ok(p) => p,
        Err(e) => return report(formatter, &e),
    };
    let infos: Vec<ProfileInfo> = profiles.iter().map(ProfileInfo::from).collect();

    if formatter.is_json() {
        formatter.json(&infos);
    } else if infos.is_empty() {
        formatter.println("No profiles configured.");
    } else {
        let rows = infos
            .into_iter()
            .map(|p| {
                vec![
                    p.name,
                    p.region,
                    p.endpoint.unwrap_or_else(|| "-".to_string()),
                    if p.path_style { "path" } else { "virtual" }.to_string(),
                ]
            })
            .collect();
        formatter.table(&["Name", "Region", "Endpoint", "Addressing"], rows);
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    if let Err(e) = manager.remove(&args.name) {
        return report(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&ProfileOperationOutput {
            success: true,
            profile: args.name,
            message: "Profile removed".to_string(),
        });
    } else {
        formatter.success(&format!("Profile '{}' removed.", args.name));
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::ConfigManager;
    use tempfile::TempDir;

    fn set_args(name: &str) -> SetArgs {
        SetArgs {
            name: name.to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: Some("http://localhost:9000".to_string()),
            path_style: true,
        }
    }

    #[test]
    fn test_profile_from_args() {
        let profile = profile_from_args(set_args("minio"));
        assert_eq!(profile.name, "minio");
        assert_eq!(profile.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(profile.path_style);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_profile_info_hides_secret() {
        let profile = profile_from_args(set_args("minio"));
        let json = serde_json::to_string(&ProfileInfo::from(&profile)).unwrap();
        assert!(json.contains("eu-west-1"));
        assert!(!json.contains("\"sk\""));
    }

    #[test]
    fn test_set_list_remove() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ProfileManager::with_config_manager(ConfigManager::with_path(
            temp_dir.path().join("config.toml"),
        ));
        let formatter = Formatter::new(crate::output::OutputConfig {
            quiet: true,
            ..Default::default()
        });

        assert_eq!(execute_set(set_args("minio"), &manager, &formatter), ExitCode::Success);
        assert_eq!(execute_list(&manager, &formatter), ExitCode::Success);
        assert!(manager.exists("minio").unwrap());

        let remove = RemoveArgs {
            name: "minio".to_string(),
        };
        assert_eq!(execute_remove(remove, &manager, &formatter), ExitCode::Success);

        let again = RemoveArgs {
            name: "minio".to_string(),
        };
        assert_eq!(execute_remove(again, &manager, &formatter), ExitCode::NotFound);
    }

    #[test]
    fn test_set_empty_name_is_usage_error() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ProfileManager::with_config_manager(ConfigManager::with_path(
            temp_dir.path().join("config.toml"),
        ));
        let formatter = Formatter::new(crate::output::OutputConfig {
            quiet: true,
            ..Default::default()
        });
        assert_eq!(execute_set(set_args(" "), &manager, &formatter), ExitCode::UsageError);
    }
}
