//! Configuration for share-backed adapters.
//!
//! This module defines the configuration bag an adapter is constructed from.
//! It is typically loaded from a TOML file, with defaults applied for missing
//! values.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{AdapterError, AdapterResult};
use crate::path::PathPrefix;

/// Share adapter configuration.
///
/// Recognized keys:
///
/// ```toml
/// container = "assets"          # alias: share
/// endpoint = "/srv/shares"
/// disable_recursive_delete = true   # alias: disableRecursiveDelete
/// prefix = "tenant-a/uploads"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Name of the file share (container) on the remote store.
    #[serde(alias = "share")]
    pub container: String,

    /// Where the share lives. Interpreted by the client; the local client
    /// treats it as the directory holding the containers.
    pub endpoint: Option<String>,

    /// When true, deleting a non-empty directory fails instead of cascading.
    #[serde(alias = "disableRecursiveDelete")]
    pub disable_recursive_delete: bool,

    /// Path prefix prepended to every logical path.
    pub prefix: Option<String>,
}

impl ShareConfig {
    /// Creates a configuration for `container` with default settings.
    ///
    /// Recursive delete is enabled and no prefix is applied.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a TOML file.
    ///
    /// The result is not validated; call [`ShareConfig::validate`] before
    /// constructing an adapter from it.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::ConfigNotFound` if the file does not exist,
    /// `AdapterError::ConfigParseError` if it is not valid TOML for this
    /// structure, or `AdapterError::Io` if it cannot be read.
    pub fn load(path: &Path) -> AdapterResult<Self> {
        if !path.exists() {
            return Err(AdapterError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AdapterError::ConfigParseError(e.to_string()))
    }

    /// Sets the path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Disables recursive directory deletion.
    pub fn without_recursive_delete(mut self) -> Self {
        self.disable_recursive_delete = true;
        self
    }

    /// True unless recursive delete was disabled.
    pub fn recursive_delete(&self) -> bool {
        !self.disable_recursive_delete
    }

    /// Parses the configured prefix; no prefix when unset.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidConfig` if the prefix climbs above the root.
    pub fn path_prefix(&self) -> AdapterResult<PathPrefix> {
        match &self.prefix {
            Some(prefix) => PathPrefix::parse(prefix)
                .map_err(|e| AdapterError::InvalidConfig(format!("prefix: {e}"))),
            None => Ok(PathPrefix::none()),
        }
    }

    /// Checks the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidConfig` for an empty or multi-segment
    /// container name, or an invalid prefix.
    pub fn validate(&self) -> AdapterResult<()> {
        let container = self.container.trim();
        if container.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "container name must not be empty".to_string(),
            ));
        }
        if container.contains('/') || container == "." || container == ".." {
            return Err(AdapterError::InvalidConfig(format!(
                "container name {container:?} must be a single path segment"
            )));
        }
        self.path_prefix()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShareConfig::new("assets");
        assert_eq!(config.container, "assets");
        assert!(config.recursive_delete());
        assert!(config.endpoint.is_none());
        assert!(config.path_prefix().unwrap().is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_builder_setters() {
        let config = ShareConfig::new("assets")
            .with_prefix("a/b")
            .without_recursive_delete();
        assert!(!config.recursive_delete());
        assert_eq!(config.path_prefix().unwrap().to_string(), "a/b");
    }

    #[test]
    fn test_camel_case_aliases() {
        let config: ShareConfig = toml::from_str(
            r#"
share = "media"
disableRecursiveDelete = true
"#,
        )
        .unwrap();
        assert_eq!(config.container, "media");
        assert!(config.disable_recursive_delete);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            ShareConfig::default().validate(),
            Err(AdapterError::InvalidConfig(_))
        ));
        assert!(matches!(
            ShareConfig::new("a/b").validate(),
            Err(AdapterError::InvalidConfig(_))
        ));
        assert!(matches!(
            ShareConfig::new("ok").with_prefix("../up").validate(),
            Err(AdapterError::InvalidConfig(_))
        ));
    }
}
