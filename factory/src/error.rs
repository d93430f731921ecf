use thiserror::Error;

use crate::singleton::Phase;

/// The main error type for the `fibre_factory` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Cannot register '{contract}': {reason}")]
  Registration { contract: String, reason: String },

  #[error("Type scan produced conflicting registrations:\n{}", conflicts.join("\n"))]
  RegistrationConflicts { conflicts: Vec<String> },

  #[error("No type is registered for contract '{contract}'")]
  UnregisteredType { contract: String },

  #[error("Unsatisfied dependency '{slot}' ({contract}) while creating '{target}'")]
  UnsatisfiedDependency {
    target: String,
    slot: String,
    contract: String,
  },

  #[error("Cannot {operation} singletons while the manager is {phase}")]
  InvalidLifecycleState { operation: &'static str, phase: Phase },

  #[error("Singleton '{contract}' failed to start")]
  Start {
    contract: String,
    #[source]
    source: anyhow::Error,
  },

  #[error("{} singleton(s) failed to shut down: {}", failures.len(), describe(failures))]
  Shutdown { failures: Vec<(String, anyhow::Error)> },

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(#[from] serde_yaml::Error),
}

fn describe(failures: &[(String, anyhow::Error)]) -> String {
  failures
    .iter()
    .map(|(contract, error)| format!("'{contract}': {error:#}"))
    .collect::<Vec<_>>()
    .join("; ")
}

/// A specialized `Result` type for `fibre_factory` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
