//! Registry configuration
//!
//! Defines the serde schema for `config.yaml`:
//!
//! ```yaml
//! experiment_file: experiments.json
//! auto_kill_experiments: 7200      # seconds
//! bind_addr: 127.0.0.1:8000
//! allowed_addresses:
//!   - 127.0.0.1
//! unknown_fields: reject           # on update; or `ignore`
//! ```
//!
//! Keys not listed here are ignored.
//!
//! `experiment_file` must hold tokens as hex strings and stamps as integer
//! seconds. A legacy file with integer `auth_hash` or float `last_updated`
//! values fails to load; remove or empty it and let workers register again.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::service::RegistryOptions;
use crate::validate::UnknownFields;

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Where the experiment set is persisted.
    pub experiment_file: PathBuf,

    /// Seconds without an update after which an experiment is swept (default: 7200)
    #[serde(rename = "auto_kill_experiments", default = "default_auto_kill")]
    pub auto_kill_secs: u64,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Peers allowed to create and list. Empty disables the check.
    #[serde(default = "default_allowed_addresses")]
    pub allowed_addresses: Vec<IpAddr>,

    #[serde(default)]
    pub unknown_fields: UnknownFields,
}

fn default_auto_kill() -> u64 {
    2 * 60 * 60
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_allowed_addresses() -> Vec<IpAddr> {
    vec![IpAddr::from([127, 0, 0, 1])]
}

impl RegistryConfig {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config {:?}", path))
    }

    /// Load configuration from YAML string (for testing)
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: RegistryConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.auto_kill_secs)
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            max_age: self.max_age(),
            unknown_fields: self.unknown_fields,
            ..RegistryOptions::default()
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = RegistryConfig::from_yaml("experiment_file: experiments.json\n").unwrap();
        assert_eq!(config.experiment_file, PathBuf::from("experiments.json"));
        assert_eq!(config.max_age(), Duration::from_secs(7200));
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(
            config.allowed_addresses,
            vec!["127.0.0.1".parse::<IpAddr>().unwrap()]
        );
        assert_eq!(config.unknown_fields, UnknownFields::Reject);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
experiment_file: /var/lib/registry/experiments.json
auto_kill_experiments: 600
bind_addr: 0.0.0.0:9000
allowed_addresses:
  - 127.0.0.1
  - "::1"
  - 10.1.2.3
unknown_fields: ignore
mongodb:
  use: false
  connection_string: mongodb://localhost
  database: experiments
"#;
        let config = RegistryConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.auto_kill_secs, 600);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.allowed_addresses.len(), 3);
        assert!(config.allowed_addresses[1].is_loopback());
        assert_eq!(config.unknown_fields, UnknownFields::Ignore);

        let options = config.registry_options();
        assert_eq!(options.max_age, Duration::from_secs(600));
        assert_eq!(options.unknown_fields, UnknownFields::Ignore);
    }

    #[test]
    fn test_missing_experiment_file_is_error() {
        assert!(RegistryConfig::from_yaml("auto_kill_experiments: 10\n").is_err());
    }

    #[test]
    fn test_bad_address_is_error() {
        let yaml = "experiment_file: e.json\nallowed_addresses: [\"not-an-ip\"]\n";
        assert!(RegistryConfig::from_yaml(yaml).is_err());
    }
}
