//! Profile management
//!
//! A profile is a named connection to an S3-compatible service: the
//! credentials and region, plus an optional custom endpoint.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigManager, Credentials};
use crate::error::{Error, Result};

/// Environment variables read by [`Profile::from_env`]
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL";

/// A named storage connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique name for this profile
    pub name: String,

    #[serde(flatten)]
    pub credentials: Credentials,

    /// Custom endpoint URL for S3-compatible services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[serde(default)]
    pub path_style: bool,
}

impl Profile {
    /// Create a profile against the provider's default endpoint
    pub fn new(name: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            name: name.into(),
            credentials,
            endpoint: None,
            path_style: false,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    /// Build an unnamed profile from the standard AWS environment variables
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| Error::Config(format!("environment variable {name} is not set")))
        };
        let credentials = Credentials::new(var(ENV_ACCESS_KEY)?, var(ENV_SECRET_KEY)?, var(ENV_REGION)?);
        let mut profile = Profile::new("env", credentials);
        profile.endpoint = std::env::var(ENV_ENDPOINT).ok().filter(|e| !e.is_empty());
        profile.path_style = profile.endpoint.is_some();
        Ok(profile)
    }

    /// Check credentials and endpoint before a client is built
    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "endpoint '{endpoint}' must use http or https"
                )));
            }
        }
        Ok(())
    }
}

/// Manager for profile operations
pub struct ProfileManager {
    config_manager: ConfigManager,
}

impl ProfileManager {
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a ProfileManager using the default config location
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_manager: ConfigManager::new()?,
        })
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    pub fn list(&self) -> Result<Vec<Profile>> {
        Ok(self.config_manager.load()?.profiles)
    }

    pub fn get(&self, name: &str) -> Result<Profile> {
        self.config_manager
            .load()?
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Add or replace a profile after validating it
    pub fn set(&self, profile: Profile) -> Result<()> {
        profile.validate()?;
        let mut config = self.config_manager.load()?;
        config.profiles.retain(|p| p.name != profile.name);
        config.profiles.push(profile);
        self.config_manager.save(&config)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.profiles.len();
        config.profiles.retain(|p| p.name != name);

        if config.profiles.len() == original_len {
            return Err(Error::ProfileNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|p| p.name == name))
    }
}
