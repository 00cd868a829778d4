//! Configuration management for Warrant
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (WARRANT_* prefix, `__` between keys)
//! 2. warrant.local.toml (local overrides)
//! 3. warrant.toml (project config)
//! 4. ~/.config/warrant/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! There is no built-in signing secret. [`WarrantConfig::validate`] must pass
//! before the configuration is used.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Minimum signing secret length outside the test environment.
pub const MIN_SECRET_LEN: usize = 32;

/// Well-known values that must never sign production tokens.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "changeme",
    "change-me",
    "secret",
    "default-secret",
    "your-secret-here",
    "password",
];

/// Main Warrant configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WarrantConfig {
    pub environment: Environment,
    pub sharing: SharingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    /// HMAC key for share tokens.
    pub signing_secret: String,
    /// Host that share links point at, with or without a scheme.
    pub base_domain: String,
    pub cache_ttl_secs: u64,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            base_domain: "localhost".to_string(),
            cache_ttl_secs: 300,
        }
    }
}

impl fmt::Debug for SharingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharingConfig")
            .field("signing_secret", &"<redacted>")
            .field("base_domain", &self.base_domain)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish()
    }
}

impl SharingConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// `base_domain` without scheme or trailing slash.
    pub fn host(&self) -> &str {
        let domain = self.base_domain.trim();
        domain
            .strip_prefix("https://")
            .or_else(|| domain.strip_prefix("http://"))
            .unwrap_or(domain)
            .trim_end_matches('/')
    }
}

impl WarrantConfig {
    /// Load configuration from the current directory
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from a specific directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// A test-environment configuration signing with `secret`
    pub fn for_tests(secret: impl Into<String>) -> Self {
        Self {
            environment: Environment::Test,
            sharing: SharingConfig {
                signing_secret: secret.into(),
                ..Default::default()
            },
        }
    }

    /// Start-up checks. Any failure must stop the process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.sharing.signing_secret.trim();
        if secret.is_empty() {
            return Err(ConfigError::Validation(
                "sharing.signing_secret is required".to_string(),
            ));
        }
        if self.environment != Environment::Test {
            if PLACEHOLDER_SECRETS
                .iter()
                .any(|p| secret.eq_ignore_ascii_case(p))
            {
                return Err(ConfigError::Validation(
                    "sharing.signing_secret is a placeholder value".to_string(),
                ));
            }
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::Validation(format!(
                    "sharing.signing_secret must be at least {MIN_SECRET_LEN} bytes"
                )));
            }
        }

        let host = self.sharing.host();
        if host.is_empty() {
            return Err(ConfigError::Validation(
                "sharing.base_domain is required".to_string(),
            ));
        }
        if host.contains('/') {
            return Err(ConfigError::Validation(
                "sharing.base_domain must not carry a path".to_string(),
            ));
        }
        if self.sharing.cache_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "sharing.cache_ttl_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
