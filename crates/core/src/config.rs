//! Configuration management
//!
//! Loads and saves the pstore configuration file (TOML). The file lives at
//! `$PSTORE_CONFIG_DIR/config.toml`, falling back to
//! `<config dir>/pstore/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::Profile;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "PSTORE_CONFIG_DIR";

/// Default presigned URL lifetime, in seconds
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

/// Longest presigned URL lifetime accepted by SigV4 (7 days)
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Access key, secret key and region used to build a store client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    /// Reject missing values before any client is built
    pub fn validate(&self) -> Result<()> {
        if self.access_key.trim().is_empty() {
            return Err(Error::Config("access key is empty".into()));
        }
        if self.secret_key.trim().is_empty() {
            return Err(Error::Config("secret key is empty".into()));
        }
        if self.region.trim().is_empty() {
            return Err(Error::Config("region is empty".into()));
        }
        if self.region.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!("malformed region '{}'", self.region)));
        }
        Ok(())
    }
}

// Keep the secret out of debug output
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

/// Behavior switches for PathStore operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Delete a folder's own marker key after its children are cleared
    pub delete_folder_markers: bool,

    /// Lifetime of generated presigned URLs
    pub presign_expiry: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            delete_folder_markers: true,
            presign_expiry: Duration::from_secs(DEFAULT_PRESIGN_EXPIRY_SECS),
        }
    }
}

impl StoreOptions {
    pub fn delete_folder_markers(mut self, yes: bool) -> Self {
        self.delete_folder_markers = yes;
        self
    }

    /// Set the presign lifetime, clamped to 1 second..7 days
    pub fn presign_expiry(mut self, expiry: Duration) -> Self {
        let secs = expiry.as_secs().clamp(1, MAX_PRESIGN_EXPIRY_SECS);
        self.presign_expiry = Duration::from_secs(secs);
        self
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Configured profiles
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// Default settings for CLI and store behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Delete folder marker keys when clearing folders
    #[serde(default = "default_true")]
    pub delete_folder_markers: bool,

    /// Presigned URL lifetime in seconds
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,
}

fn default_output() -> String {
    "human".to_string()
}

fn default_color() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

fn default_presign_expiry() -> u64 {
    DEFAULT_PRESIGN_EXPIRY_SECS
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
            delete_folder_markers: true,
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
        }
    }
}

impl Defaults {
    /// Store options derived from these defaults
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::default()
            .delete_folder_markers(self.delete_folder_markers)
            .presign_expiry(Duration::from_secs(self.presign_expiry_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            profiles: Vec::new(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager at the default location
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("pstore"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// A missing file yields the default configuration. A file written by a
    /// newer schema is rejected.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade pstore.",
                config.schema_version, SCHEMA_VERSION
            )));
        }
        config.schema_version = SCHEMA_VERSION;

        Ok(config)
    }

    /// Save configuration to disk with owner-only permissions
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        tracing::debug!(path = %self.config_path.display(), "saved configuration");
        Ok(())
    }
}
