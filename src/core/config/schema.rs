//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing; unknown keys are rejected.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// quiet = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Suppress status output unless overridden on the command line
    pub quiet: Option<bool>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// default_push = "ssh://hg.example.com/project"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Push destination, overriding the git remotes `default-push` and `default`
    pub default_push: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `default_push` is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dest) = &self.default_push {
            if dest.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_push cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }
}
