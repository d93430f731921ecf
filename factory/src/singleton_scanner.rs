use crate::config::ConflictPolicy;
use crate::error::Result;
use crate::scanner::{collect_marked, MarkerKind, TypeScanner};
use crate::singleton::SingletonManager;

/// Feeds every type carrying the singleton marker into a [`SingletonManager`].
pub struct SingletonScanner<'a> {
  scanner: &'a dyn TypeScanner,
  manager: &'a SingletonManager,
}

impl<'a> SingletonScanner<'a> {
  pub fn new(scanner: &'a dyn TypeScanner, manager: &'a SingletonManager) -> Self {
    Self { scanner, manager }
  }

  /// Registers each discovered singleton with the manager and returns how
  /// many were registered.
  ///
  /// Conflicts follow the manager's policy, as in
  /// [`Factory::auto_register_types`](crate::Factory::auto_register_types).
  pub fn scan_singleton_types(&self) -> Result<usize> {
    let replace = self.manager.conflict_policy() == ConflictPolicy::Replace;
    let found = collect_marked(self.scanner, MarkerKind::Singleton, replace)?;
    let count = self.manager.register_all(found)?;
    tracing::info!(manager = %self.manager.name(), count, "Registered scanned singleton types");
    Ok(count)
  }
}
