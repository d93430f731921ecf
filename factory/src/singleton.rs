//! The singleton manager: one instance per contract, started and shut down
//! together.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{ConflictPolicy, ContainerConfig};
use crate::core::{Contract, Instance};
use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::provider::DependencyProvider;
use crate::registration::{Creatable, Registration, Startable};

/// The manager-wide lifecycle phase. Every singleton moves through it together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
  #[default]
  Empty,
  Registered,
  Instantiated,
  Started,
  Shutdown,
  /// Instantiation or start failed part-way. Only `shutdown` is accepted, to
  /// unwind whatever did start.
  Faulted,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Phase::Empty => "empty",
      Phase::Registered => "registered",
      Phase::Instantiated => "instantiated",
      Phase::Started => "started",
      Phase::Shutdown => "shut down",
      Phase::Faulted => "faulted",
    };
    f.write_str(name)
  }
}

#[derive(Default)]
struct State {
  phase: Phase,
  registrations: Vec<Registration>,
  // In instantiation order.
  instances: Vec<Instance>,
  // Indices into `instances`, in start order.
  started: Vec<usize>,
}

impl State {
  fn expect(&self, operation: &'static str, allowed: &[Phase]) -> Result<()> {
    let phase = self.phase;
    if allowed.contains(&phase) {
      Ok(())
    } else {
      Err(Error::InvalidLifecycleState { operation, phase })
    }
  }

  fn instance_named(&self, name: &str) -> Option<&Instance> {
    self.instances.iter().find(|instance| instance.contract().name() == name)
  }
}

/// Owns the process-lifetime singletons and drives their lifecycle.
///
/// The manager is also a [`DependencyProvider`]: once a singleton has been
/// instantiated it can be injected into anything the factory builds,
/// including singletons instantiated later in the same pass.
///
/// Instantiation follows registration order and no dependency sorting is
/// done, so a singleton that needs another must be registered after it.
pub struct SingletonManager {
  name: String,
  policy: ConflictPolicy,
  state: RwLock<State>,
}

impl Default for SingletonManager {
  fn default() -> Self {
    Self::new(&ContainerConfig::default())
  }
}

impl SingletonManager {
  pub fn new(config: &ContainerConfig) -> Self {
    Self {
      name: config.name.clone(),
      policy: config.conflict_policy,
      state: RwLock::new(State::default()),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn phase(&self) -> Phase {
    self.state.read().phase
  }

  pub fn conflict_policy(&self) -> ConflictPolicy {
    self.policy
  }

  // --- Registration ---

  /// Registers `C` as the singleton implementation of `I`.
  ///
  /// If `C` exposes [`Startable`] hooks through [`Creatable::as_startable`],
  /// the singleton takes part in [`start`](Self::start) and
  /// [`shutdown`](Self::shutdown).
  pub fn register_type<I, C>(&self, upcast: fn(Arc<C>) -> Arc<I>) -> Result<()>
  where
    I: ?Sized + Send + Sync + 'static,
    C: Creatable,
  {
    self.register(Registration::of::<I, C>(upcast))
  }


  pub fn register(&self, registration: Registration) -> Result<()> {
    registration.validate()?;
    let mut state = self.state.write();
    state.expect("register", &[Phase::Empty, Phase::Registered])?;

    let contract = *registration.contract();
    let existing = state
      .registrations
      .iter()
      .position(|held| held.contract() == &contract);
    match (existing, self.policy) {
      (Some(at), ConflictPolicy::Reject) => {
        return Err(Error::Registration {
          contract: contract.name().to_string(),
          reason: format!(
            "singleton already registered to {}, refusing {}",
            state.registrations[at].concrete(),
            registration.concrete()
          ),
        });
      }
      (Some(at), ConflictPolicy::Replace) => state.registrations[at] = registration,
      (None, _) => state.registrations.push(registration),
    }

    tracing::debug!(manager = %self.name, contract = contract.name(), "Registered singleton");
    state.phase = Phase::Registered;
    Ok(())
  }

  /// Registers a batch as one unit: either every registration is accepted or
  /// none is.
  pub(crate) fn register_all(&self, registrations: Vec<Registration>) -> Result<usize> {
    {
      let state = self.state.read();
      state.expect("register", &[Phase::Empty, Phase::Registered])?;
      if self.policy == ConflictPolicy::Reject {
        let clashes: Vec<String> = registrations
          .iter()
          .filter_map(|registration| {
            state
              .registrations
              .iter()
              .find(|held| held.contract() == registration.contract())
              .map(|held| {
                format!(
                  "'{}' is already registered to {}, refusing {}",
                  registration.contract(),
                  held.concrete(),
                  registration.concrete()
                )
              })
          })
          .collect();
        if !clashes.is_empty() {
          return Err(Error::RegistrationConflicts { conflicts: clashes });
        }
      }
    }

    let count = registrations.len();
    for registration in registrations {
      self.register(registration)?;
    }
    Ok(count)
  }

  pub fn is_registered(&self, contract: &Contract) -> bool {
    self
      .state
      .read()
      .registrations
      .iter()
      .any(|held| held.contract() == contract)
  }

  // --- Lifecycle ---

  /// Builds every registered singleton through `factory`, in registration
  /// order.
  ///
  /// The manager should already be one of `factory`'s providers so that
  /// singletons can depend on singletons registered before them. On failure
  /// the manager is left [`Phase::Faulted`] and the singletons built so far
  /// remain available.
  pub fn instantiate_singletons(&self, factory: &Factory) -> Result<()> {
    let registrations = {
      let mut state = self.state.write();
      state.expect("instantiate", &[Phase::Empty, Phase::Registered])?;
      // Claim the phase up front so a re-entrant call cannot start a second pass.
      state.phase = Phase::Instantiated;
      state.registrations.clone()
    };

    tracing::info!(manager = %self.name, count = registrations.len(), "Instantiating singletons");
    for registration in &registrations {
      // The lock is released while constructing: the factory calls back into
      // this manager to resolve earlier singletons.
      match factory.construct(registration) {
        Ok(instance) => self.state.write().instances.push(instance),
        Err(err) => {
          tracing::error!(
            manager = %self.name,
            contract = registration.contract().name(),
            error = %err,
            "Failed to instantiate singleton"
          );
          self.state.write().phase = Phase::Faulted;
          return Err(err);
        }
      }
    }
    Ok(())
  }

  /// Starts every startable singleton in instantiation order.
  ///
  /// Stops at the first failure, leaving the manager [`Phase::Faulted`]; the
  /// singletons started before it are recorded and will be shut down by
  /// [`SingletonManager::shutdown`].
  pub fn start(&self) -> Result<()> {
    let startables: Vec<(usize, Contract, Arc<dyn Startable>)> = {
      let mut state = self.state.write();
      state.expect("start", &[Phase::Instantiated])?;
      state.phase = Phase::Started;
      state
        .instances
        .iter()
        .enumerate()
        .filter_map(|(at, instance)| Some((at, *instance.contract(), instance.startable()?.clone())))
        .collect()
    };

    tracing::info!(manager = %self.name, count = startables.len(), "Starting singletons");
    for (at, contract, startable) in startables {
      if let Err(source) = startable.start() {
        tracing::error!(manager = %self.name, contract = contract.name(), error = %source, "Singleton failed to start");
        self.state.write().phase = Phase::Faulted;
        return Err(Error::Start {
          contract: contract.name().to_string(),
          source,
        });
      }
      tracing::debug!(manager = %self.name, contract = contract.name(), "Started singleton");
      self.state.write().started.push(at);
    }
    Ok(())
  }

  /// Shuts down every started singleton in the reverse order of start.
  ///
  /// Every shutdown is attempted even when one fails; failures are logged and
  /// returned together.
  pub fn shutdown(&self) -> Result<()> {
    let stoppables: Vec<(Contract, Arc<dyn Startable>)> = {
      let mut state = self.state.write();
      state.expect("shut down", &[Phase::Started, Phase::Faulted])?;
      state.phase = Phase::Shutdown;
      let started = std::mem::take(&mut state.started);
      started
        .into_iter()
        .rev()
        .filter_map(|at| {
          let instance = &state.instances[at];
          Some((*instance.contract(), instance.startable()?.clone()))
        })
        .collect()
    };

    tracing::info!(manager = %self.name, count = stoppables.len(), "Shutting down singletons");
    let mut failures = Vec::new();
    for (contract, startable) in stoppables {
      match startable.shutdown() {
        Ok(()) => tracing::debug!(manager = %self.name, contract = contract.name(), "Shut down singleton"),
        Err(err) => {
          tracing::warn!(manager = %self.name, contract = contract.name(), error = %err, "Failed to shut down singleton");
          failures.push((contract.name().to_string(), err));
        }
      }
    }

    if failures.is_empty() {
      Ok(())
    } else {
      Err(Error::Shutdown { failures })
    }
  }

  // --- Inspection ---

  /// The singleton for `I`, once instantiated.
  pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
    self.get_instance(&Contract::of::<I>())?.downcast::<I>()
  }

  pub fn get_instance(&self, contract: &Contract) -> Option<Instance> {
    self
      .state
      .read()
      .instances
      .iter()
      .find(|instance| instance.contract() == contract)
      .cloned()
  }

  /// Contracts of the singletons built so far, in instantiation order.
  pub fn instantiated_contracts(&self) -> Vec<Contract> {
    self.state.read().instances.iter().map(|instance| *instance.contract()).collect()
  }

  /// Contracts of the singletons currently started, in start order.
  pub fn started_contracts(&self) -> Vec<Contract> {
    let state = self.state.read();
    state
      .started
      .iter()
      .map(|&at| *state.instances[at].contract())
      .collect()
  }
}

impl DependencyProvider for SingletonManager {
  fn resolve_dependency(&self, name: &str) -> Option<Instance> {
    self.state.read().instance_named(name).cloned()
  }

  fn find_dependency_type(&self, name: &str) -> Option<Contract> {
    self.state.read().instance_named(name).map(|instance| *instance.contract())
  }

  fn resolve_contract(&self, contract: &Contract) -> Option<Instance> {
    let state = self.state.read();
    state
      .instances
      .iter()
      .find(|instance| instance.contract() == contract)
      .or_else(|| state.instances.iter().find(|instance| instance.contract().accepts(contract)))
      .cloned()
  }
}

impl fmt::Debug for SingletonManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.read();
    f.debug_struct("SingletonManager")
      .field("name", &self.name)
      .field("phase", &state.phase)
      .field("registrations", &state.registrations.len())
      .field("instances", &state.instances.len())
      .finish()
  }
}
