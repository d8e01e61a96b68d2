//! YAML configuration as handed to integrations
//!
//! The host loads `configuration.yaml` once; each integration looks up its
//! own top-level block by domain and deserializes it into its own type.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document root is not a mapping of domains
    #[error("configuration root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("invalid configuration for '{domain}': {source}")]
    InvalidDomainConfig {
        domain: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// The whole configuration, keyed by domain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigType {
    root: Mapping,
}

impl ConfigType {
    /// An empty configuration (no domain configured)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading YAML file: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, Path::new("<string>"))
    }

    fn parse(content: &str, source_path: &Path) -> ConfigResult<Self> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        match value {
            Value::Mapping(root) => Ok(Self { root }),
            // An empty document is an empty configuration
            Value::Null => Ok(Self::empty()),
            other => Err(ConfigError::NotAMapping {
                found: kind(&other),
            }),
        }
    }

    /// Whether `domain` has a top-level block (even an empty one)
    pub fn has_domain(&self, domain: &str) -> bool {
        self.root.contains_key(domain)
    }

    /// Deserialize the block for `domain`
    ///
    /// A missing or empty (`domain:` with nothing after it) block yields
    /// `T::default()`.
    pub fn domain_config<T>(&self, domain: &str) -> ConfigResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.root.get(domain) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => serde_yaml::from_value(value.clone()).map_err(|e| {
                ConfigError::InvalidDomainConfig {
                    domain: domain.to_string(),
                    source: e,
                }
            }),
        }
    }

    /// All configured domains, in file order
    pub fn domains(&self) -> Vec<String> {
        self.root
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
