//! The dependency-provider seam and a simple value-backed provider.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{Contract, Instance};

/// A source of already-constructed dependencies.
///
/// Returning `None` means "not mine", never failure: the factory walks its
/// providers in order and only gives up once all of them have declined.
/// Implementations must not have side effects on lookup.
pub trait DependencyProvider: Send + Sync {
  /// Resolves a named dependency.
  fn resolve_dependency(&self, name: &str) -> Option<Instance>;

  /// Finds the contract a named dependency would be resolved as.
  fn find_dependency_type(&self, name: &str) -> Option<Contract>;

  /// Resolves by contract rather than by slot name.
  fn resolve_contract(&self, contract: &Contract) -> Option<Instance> {
    match self.find_dependency_type(contract.name()) {
      Some(found) if found.accepts(contract) => self.resolve_dependency(contract.name()),
      _ => None,
    }
  }
}

/// A provider over a fixed set of externally built instances.
///
/// Useful for feeding configuration objects or hand-wired services into the
/// factory's resolution chain.
#[derive(Default)]
pub struct ValueProvider {
  values: RwLock<Vec<(String, Instance)>>,
}

impl ValueProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds `value` under `name`, replacing any earlier value with that name.
  pub fn insert<I: ?Sized + Send + Sync + 'static>(&self, name: &str, value: Arc<I>) {
    self.insert_instance(name, Instance::new(value));
  }

  pub fn insert_instance(&self, name: &str, instance: Instance) {
    let mut values = self.values.write();
    match values.iter_mut().find(|(existing, _)| existing == name) {
      Some(slot) => slot.1 = instance,
      None => values.push((name.to_owned(), instance)),
    }
  }

  pub fn len(&self) -> usize {
    self.values.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.read().is_empty()
  }
}

impl DependencyProvider for ValueProvider {
  fn resolve_dependency(&self, name: &str) -> Option<Instance> {
    self
      .values
      .read()
      .iter()
      .find(|(existing, _)| existing == name)
      .map(|(_, instance)| instance.clone())
  }

  fn find_dependency_type(&self, name: &str) -> Option<Contract> {
    self
      .values
      .read()
      .iter()
      .find(|(existing, _)| existing == name)
      .map(|(_, instance)| *instance.contract())
  }

  fn resolve_contract(&self, contract: &Contract) -> Option<Instance> {
    self
      .values
      .read()
      .iter()
      .find(|(_, instance)| instance.contract().accepts(contract))
      .map(|(_, instance)| instance.clone())
  }
}

/// The ordered provider chain a factory consults while wiring a type.
#[derive(Default)]
pub(crate) struct ProviderChain {
  providers: RwLock<Vec<Arc<dyn DependencyProvider>>>,
}

impl ProviderChain {
  pub(crate) fn push(&self, provider: Arc<dyn DependencyProvider>) {
    self.providers.write().push(provider);
  }

  pub(crate) fn len(&self) -> usize {
    self.providers.read().len()
  }

  /// The providers in precedence order, detached from the lock so providers
  /// may be consulted without holding it.
  pub(crate) fn snapshot(&self) -> Vec<Arc<dyn DependencyProvider>> {
    self.providers.read().clone()
  }

  /// First provider that knows `name` as a compatible contract wins; failing
  /// that, the first provider that can satisfy `contract` by type.
  pub(crate) fn resolve(&self, name: &str, contract: &Contract) -> Option<Instance> {
    let providers = self.snapshot();

    let by_name = providers.iter().find_map(|provider| {
      let found = provider.find_dependency_type(name)?;
      if !found.accepts(contract) {
        return None;
      }
      provider
        .resolve_dependency(name)
        .filter(|instance| instance.contract().accepts(contract))
    });

    by_name.or_else(|| {
      providers
        .iter()
        .find_map(|provider| {
          provider
            .resolve_contract(contract)
            .filter(|instance| instance.contract().accepts(contract))
        })
    })
  }
}
