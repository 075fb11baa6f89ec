// ABOUTME: Configuration loading for relaystore from environment variables.
// ABOUTME: Chooses the backend kind, its data directory, and the storage key prefix.

use std::path::PathBuf;
use std::str::FromStr;

use relaystore_core::DEFAULT_STORAGE_PREFIX;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RELAYSTORE_BACKEND must be 'file' or 'memory', got: {0}")]
    InvalidBackend(String),

    #[error("RELAYSTORE_PREFIX must not be empty")]
    EmptyPrefix,
}

/// Which persistence backend the stores are mirrored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayStoreConfig {
    pub home: PathBuf,
    pub backend: BackendKind,
    pub storage_prefix: String,
}

impl RelayStoreConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - RELAYSTORE_HOME: data directory for the file backend (default: ~/.relaystore)
    /// - RELAYSTORE_BACKEND: `file` or `memory` (default: file)
    /// - RELAYSTORE_PREFIX: storage key prefix (default: wc@2:client:)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = lookup("RELAYSTORE_HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                lookup("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".relaystore")
            });

        let backend = match lookup("RELAYSTORE_BACKEND") {
            Some(value) => value.parse()?,
            None => BackendKind::File,
        };

        let storage_prefix =
            lookup("RELAYSTORE_PREFIX").unwrap_or_else(|| DEFAULT_STORAGE_PREFIX.to_string());
        if storage_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        Ok(Self {
            home,
            backend,
            storage_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn config_loads_defaults() {
        let config = RelayStoreConfig::from_lookup(lookup_from(&[("HOME", "/home/peer")])).unwrap();

        assert_eq!(config.home, PathBuf::from("/home/peer/.relaystore"));
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.storage_prefix, "wc@2:client:");
    }

    #[test]
    fn config_reads_overrides() {
        let config = RelayStoreConfig::from_lookup(lookup_from(&[
            ("RELAYSTORE_HOME", "/data/relay"),
            ("RELAYSTORE_BACKEND", "Memory"),
            ("RELAYSTORE_PREFIX", "app:"),
        ]))
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/data/relay"));
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.storage_prefix, "app:");
    }

    #[test]
    fn config_rejects_unknown_backend() {
        let err = RelayStoreConfig::from_lookup(lookup_from(&[("RELAYSTORE_BACKEND", "redis")]))
            .unwrap_err();
        assert!(
            err.to_string().contains("redis"),
            "error should name the bad value: {}",
            err
        );
    }

    #[test]
    fn config_rejects_empty_prefix() {
        let result = RelayStoreConfig::from_lookup(lookup_from(&[("RELAYSTORE_PREFIX", "")]));
        assert!(matches!(result, Err(ConfigError::EmptyPrefix)));
    }
}
