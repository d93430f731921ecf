//! The `Factory`: a contract registry that builds and wires instances on demand.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::{ConflictPolicy, ContainerConfig};
use crate::core::{Contract, Instance};
use crate::error::{Error, Result};
use crate::provider::{DependencyProvider, ProviderChain};
use crate::registration::{Creatable, Registration, Resolve, Slot};
use crate::scanner::{collect_marked, InventoryScanner, MarkerKind, TypeScanner};

/// Builds instances of registered contracts and injects their dependencies
/// from an ordered chain of [`DependencyProvider`]s.
///
/// Every instance returned by the factory is freshly constructed and owned by
/// the caller. Dependencies are not built recursively: slots are filled only
/// with values that some provider already holds.
pub struct Factory {
  name: String,
  policy: ConflictPolicy,
  registrations: DashMap<Contract, Registration>,
  providers: ProviderChain,
  scanner: Arc<dyn TypeScanner>,
}

impl Default for Factory {
  fn default() -> Self {
    Self::new(&ContainerConfig::default())
  }
}

impl Factory {
  /// Creates an empty factory that discovers marked types through `inventory`.
  pub fn new(config: &ContainerConfig) -> Self {
    Self::with_scanner(config, Arc::new(InventoryScanner))
  }

  /// Creates an empty factory that discovers marked types through `scanner`.
  pub fn with_scanner(config: &ContainerConfig, scanner: Arc<dyn TypeScanner>) -> Self {
    Self {
      name: config.name.clone(),
      policy: config.conflict_policy,
      registrations: DashMap::new(),
      providers: ProviderChain::default(),
      scanner,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  // --- Registration ---

  /// Registers `C` as the implementation of `I`.
  ///
  /// ```
  /// use fibre_factory::{Creatable, Factory};
  ///
  /// trait Greeter: Send + Sync {
  ///   fn greet(&self) -> String;
  /// }
  ///
  /// #[derive(Default)]
  /// struct EnglishGreeter;
  /// impl Creatable for EnglishGreeter {}
  /// impl Greeter for EnglishGreeter {
  ///   fn greet(&self) -> String {
  ///     "Hello!".to_string()
  ///   }
  /// }
  ///
  /// let factory = Factory::default();
  /// factory.register_type::<dyn Greeter, EnglishGreeter>(|it| it).unwrap();
  /// assert_eq!(factory.create_interface::<dyn Greeter>().unwrap().greet(), "Hello!");
  /// ```
  pub fn register_type<I, C>(&self, upcast: fn(Arc<C>) -> Arc<I>) -> Result<()>
  where
    I: ?Sized + Send + Sync + 'static,
    C: Creatable,
  {
    self.register(Registration::of::<I, C>(upcast))
  }

  /// Records `registration`, honouring the configured conflict policy.
  pub fn register(&self, registration: Registration) -> Result<()> {
    registration.validate()?;
    let contract = *registration.contract();

    match self.registrations.entry(contract) {
      Entry::Occupied(mut occupied) => match self.policy {
        ConflictPolicy::Reject => {
          return Err(Error::Registration {
            contract: contract.name().to_string(),
            reason: format!(
              "already registered to {}, refusing {}",
              occupied.get().concrete(),
              registration.concrete()
            ),
          });
        }
        ConflictPolicy::Replace => {
          tracing::debug!(
            factory = %self.name,
            contract = contract.name(),
            replaced = occupied.get().concrete(),
            concrete = registration.concrete(),
            "Replacing registration"
          );
          occupied.insert(registration);
        }
      },
      Entry::Vacant(vacant) => {
        tracing::debug!(
          factory = %self.name,
          contract = contract.name(),
          concrete = registration.concrete(),
          "Registered type"
        );
        vacant.insert(registration);
      }
    }
    Ok(())
  }

  /// Registers every type carrying the creatable marker.
  ///
  /// Under [`ConflictPolicy::Reject`] all conflicts, both within the scan and
  /// against existing registrations, are reported together and nothing from
  /// the scan is registered. Under [`ConflictPolicy::Replace`] the last type
  /// in scan order wins.
  pub fn auto_register_types(&self) -> Result<usize> {
    let replace = self.policy == ConflictPolicy::Replace;
    let found = collect_marked(self.scanner.as_ref(), MarkerKind::Creatable, replace)?;

    if !replace {
      let clashes: Vec<String> = found
        .iter()
        .filter_map(|registration| {
          self.registrations.get(registration.contract()).map(|existing| {
            format!(
              "'{}' is already registered to {}, refusing {}",
              registration.contract(),
              existing.concrete(),
              registration.concrete()
            )
          })
        })
        .collect();
      if !clashes.is_empty() {
        return Err(Error::RegistrationConflicts { conflicts: clashes });
      }
    }

    let count = found.len();
    for registration in found {
      self.register(registration)?;
    }
    tracing::info!(factory = %self.name, count, "Auto-registered creatable types");
    Ok(count)
  }

  pub fn is_registered(&self, contract: &Contract) -> bool {
    self.registrations.contains_key(contract)
  }

  pub fn registered_contracts(&self) -> Vec<Contract> {
    self.registrations.iter().map(|entry| *entry.key()).collect()
  }

  // --- Providers ---

  /// Appends `provider` to the resolution chain. Earlier providers win.
  pub fn add_dependency_provider(&self, provider: Arc<dyn DependencyProvider>) {
    self.providers.push(provider);
    tracing::debug!(factory = %self.name, providers = self.providers.len(), "Added dependency provider");
  }

  // --- Creation ---

  /// Creates a new, fully wired instance of `I`.
  pub fn create_interface<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
    self.create_as::<I>(&Contract::of::<I>())
  }

  /// Creates a new instance registered under an explicitly named contract.
  pub fn create_named<I: ?Sized + Send + Sync + 'static>(&self, name: &'static str) -> Result<Arc<I>> {
    self.create_as::<I>(&Contract::named::<I>(name))
  }

  /// Creates a new, fully wired instance of `contract`, type-erased.
  pub fn create(&self, contract: &Contract) -> Result<Instance> {
    // Clone out so the map shard is not held while constructors run.
    let registration = self
      .registrations
      .get(contract)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| Error::UnregisteredType {
        contract: contract.name().to_string(),
      })?;
    self.construct(&registration)
  }

  /// Builds `registration` using this factory's provider chain, whether or
  /// not the registration is held by this factory.
  pub fn construct(&self, registration: &Registration) -> Result<Instance> {
    registration.validate()?;
    registration.construct(self)
  }

  fn create_as<I: ?Sized + Send + Sync + 'static>(&self, contract: &Contract) -> Result<Arc<I>> {
    let instance = self.create(contract)?;
    instance.downcast::<I>().ok_or_else(|| Error::UnregisteredType {
      contract: contract.name().to_string(),
    })
  }
}

impl Resolve for Factory {
  fn resolve(&self, target: &Contract, slot: &Slot) -> Result<Instance> {
    match self.providers.resolve(slot.name, &slot.contract) {
      Some(instance) => {
        tracing::debug!(
          factory = %self.name,
          contract = target.name(),
          slot = slot.name,
          "Resolved dependency"
        );
        Ok(instance)
      }
      None => Err(Error::UnsatisfiedDependency {
        target: target.name().to_string(),
        slot: slot.name.to_string(),
        contract: slot.contract.name().to_string(),
      }),
    }
  }
}

impl std::fmt::Debug for Factory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Factory")
      .field("name", &self.name)
      .field("policy", &self.policy)
      .field("registrations", &self.registrations.len())
      .field("providers", &self.providers.len())
      .finish()
  }
}
