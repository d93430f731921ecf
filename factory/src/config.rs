//! Container configuration, loadable from YAML.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// What happens when a second type is registered for a contract that
/// already has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
  /// Fail the registration. Scans report every conflict at once.
  #[default]
  Reject,
  /// The later registration wins.
  Replace,
}

/// Settings shared by a [`Factory`](crate::Factory) and a
/// [`SingletonManager`](crate::SingletonManager).
///
/// ```yaml
/// name: my_app
/// conflict_policy: replace
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
  /// Labels the container's log events.
  pub name: String,
  pub conflict_policy: ConflictPolicy,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      name: "fibre".to_string(),
      conflict_policy: ConflictPolicy::Reject,
    }
  }
}

impl ContainerConfig {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
    self.conflict_policy = policy;
    self
  }

  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(yaml)?)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;

  #[test]
  fn parses_full_config() {
    let config = ContainerConfig::from_yaml_str("name: my_app\nconflict_policy: replace\n").unwrap();
    assert_eq!(config.name, "my_app");
    assert_eq!(config.conflict_policy, ConflictPolicy::Replace);
  }

  #[test]
  fn missing_fields_fall_back_to_defaults() {
    let config = ContainerConfig::from_yaml_str("name: partial\n").unwrap();
    assert_eq!(config.name, "partial");
    assert_eq!(config.conflict_policy, ConflictPolicy::Reject);
  }

  #[test]
  fn unknown_policy_is_a_parse_error() {
    let err = ContainerConfig::from_yaml_str("conflict_policy: merge\n").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)), "got {err:?}");
  }

  #[test]
  fn reads_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.yaml");
    fs::write(&path, "name: from_disk\n").unwrap();

    let config = ContainerConfig::from_file(&path).unwrap();
    assert_eq!(config, ContainerConfig::new("from_disk"));
  }

  #[test]
  fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ContainerConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, Error::ConfigRead(_)), "got {err:?}");
  }
}
