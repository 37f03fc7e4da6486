//! Configuration Management
//!
//! [`ProviderConfig`] is the explicit settings object the provider is built
//! from. Resolution of where each value comes from happens once, at the
//! binary boundary: command-line flag, then the persisted [`Config`] file,
//! then the `PINECONE_*` environment variables.

use crate::resource::DEFAULT_POLL_INTERVAL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "PINECONE_API_KEY";
pub const ENVIRONMENT_ENV: &str = "PINECONE_ENVIRONMENT";

/// Persisted user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default Pinecone environment
    #[serde(default)]
    pub environment: Option<String>,
    /// Default API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Controller URL override
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pinecone-provider").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; missing or unreadable files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Set environment and save
    pub fn set_environment(&mut self, environment: &str) -> Result<()> {
        self.environment = Some(environment.to_string());
        self.save()
    }
}

/// Credentials read from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    pub environment: Option<String>,
    pub api_key: Option<String>,
}

impl EnvCredentials {
    pub fn from_process() -> Self {
        Self {
            environment: std::env::var(ENVIRONMENT_ENV).ok(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

/// Explicitly supplied values (command-line flags)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub environment: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub poll_interval: Option<Duration>,
    pub timeout: Option<Duration>,
}

/// Settings the provider is configured with
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub environment: String,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub poll_interval: Duration,
    /// Upper bound on each convergence wait; unbounded when `None`
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("environment", &self.environment)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("endpoint", &self.endpoint)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(environment: &str, api_key: &str) -> Self {
        Self {
            environment: environment.to_string(),
            api_key: api_key.to_string(),
            endpoint: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Merge sources: explicit flag > config file > environment variable
    /// Missing values resolve to empty strings and are rejected at configure time
    pub fn resolve(overrides: &Overrides, file: &Config, env: &EnvCredentials) -> Self {
        let pick = |explicit: &Option<String>, persisted: &Option<String>, ambient: &Option<String>| {
            explicit
                .clone()
                .or_else(|| persisted.clone())
                .or_else(|| ambient.clone())
                .unwrap_or_default()
        };

        Self {
            environment: pick(&overrides.environment, &file.environment, &env.environment),
            api_key: pick(&overrides.api_key, &file.api_key, &env.api_key),
            endpoint: overrides.endpoint.clone().or_else(|| file.endpoint.clone()),
            poll_interval: overrides.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            timeout: overrides.timeout,
        }
    }
}
