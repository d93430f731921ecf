//! Concrete-type descriptors: what a type needs injected and how it is built.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::core::{Contract, Instance};
use crate::error::{Error, Result};

/// Lifecycle hooks a singleton may opt into.
///
/// `start` runs after every singleton has been instantiated; `shutdown` runs
/// in the reverse order of `start`. A type opts in by implementing this trait
/// and returning `Some(self)` from [`Creatable::as_startable`].
pub trait Startable: Send + Sync {
  fn start(&self) -> anyhow::Result<()>;
  fn shutdown(&self) -> anyhow::Result<()>;
}

/// A concrete type the factory can build.
///
/// The factory default-constructs the value and then fills every slot listed
/// by [`Creatable::dependencies`].
///
/// ```
/// use fibre_factory::{Creatable, Dependency};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///   fn now(&self) -> u64;
/// }
///
/// #[derive(Default)]
/// struct Stopwatch {
///   clock: Option<Arc<dyn Clock>>,
/// }
///
/// impl Creatable for Stopwatch {
///   fn dependencies() -> Vec<Dependency<Self>> {
///     vec![Dependency::<Self>::on::<dyn Clock>("clock", |this, clock| this.clock = Some(clock))]
///   }
/// }
/// ```
pub trait Creatable: Default + Send + Sync + 'static {
  fn dependencies() -> Vec<Dependency<Self>> {
    Vec::new()
  }

  /// The lifecycle hooks of a built value, if its type has any.
  ///
  /// Types implementing [`Startable`] override this to return `Some(self)`;
  /// the singleton manager then starts and shuts them down however they were
  /// registered.
  fn as_startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
    None
  }
}

type Assign<T> = Box<dyn Fn(&mut T, &Instance) -> bool + Send + Sync>;

/// A single injection slot declared by a concrete type `T`.
pub struct Dependency<T> {
  slot: &'static str,
  contract: Contract,
  provides: TypeId,
  assign: Assign<T>,
}

impl<T: 'static> Dependency<T> {
  /// A slot filled with the provider value for `I`'s default contract.
  pub fn on<I: ?Sized + Send + Sync + 'static>(slot: &'static str, set: fn(&mut T, Arc<I>)) -> Self {
    Self::with_contract(slot, Contract::of::<I>(), set)
  }

  /// A slot filled with the provider value for an explicitly named contract.
  pub fn with_contract<I: ?Sized + Send + Sync + 'static>(
    slot: &'static str,
    contract: Contract,
    set: fn(&mut T, Arc<I>),
  ) -> Self {
    Self {
      slot,
      contract,
      provides: TypeId::of::<I>(),
      assign: Box::new(move |target: &mut T, instance: &Instance| match instance.downcast::<I>() {
        Some(value) => {
          set(target, value);
          true
        }
        None => false,
      }),
    }
  }

  pub fn slot(&self) -> &'static str {
    self.slot
  }

  pub fn contract(&self) -> &Contract {
    &self.contract
  }

  fn to_slot(&self) -> Slot {
    Slot {
      name: self.slot,
      contract: self.contract,
      provides: self.provides,
    }
  }

  /// Writes `instance` into the slot. Returns `false` on a type mismatch.
  pub(crate) fn assign(&self, target: &mut T, instance: &Instance) -> bool {
    (self.assign)(target, instance)
  }
}

impl<T> fmt::Debug for Dependency<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dependency")
      .field("slot", &self.slot)
      .field("contract", &self.contract)
      .finish()
  }
}

/// Read-only view of a declared slot, free of the owning type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
  pub name: &'static str,
  pub contract: Contract,
  // Type the slot's setter accepts.
  provides: TypeId,
}

/// Looks up slot values on behalf of a constructor.
pub(crate) trait Resolve {
  fn resolve(&self, target: &Contract, slot: &Slot) -> Result<Instance>;
}

type Constructor = Arc<dyn Fn(&dyn Resolve, &Contract) -> Result<Instance> + Send + Sync>;

/// A (contract, concrete type) pair plus the recipe to build the concrete type.
#[derive(Clone)]
pub struct Registration {
  contract: Contract,
  provides: TypeId,
  concrete: &'static str,
  slots: fn() -> Vec<Slot>,
  constructor: Constructor,
}

impl Registration {
  /// Registers `C` as the implementation of `I`.
  ///
  /// `upcast` is normally the identity closure `|it| it`; writing it at the
  /// call site is what proves `C` satisfies `I`.
  pub fn of<I, C>(upcast: fn(Arc<C>) -> Arc<I>) -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: Creatable,
  {
    Self::named::<I, C>(Contract::of::<I>(), upcast)
  }

  /// Like [`Registration::of`], under an explicitly named contract.
  pub fn named<I, C>(contract: Contract, upcast: fn(Arc<C>) -> Arc<I>) -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: Creatable,
  {
    let constructor: Constructor = Arc::new(
      move |resolver: &dyn Resolve, contract: &Contract| -> Result<Instance> {
        let mut value = C::default();
        for dependency in C::dependencies() {
          let slot = dependency.to_slot();
          let instance = resolver.resolve(contract, &slot)?;
          if !dependency.assign(&mut value, &instance) {
            return Err(Error::UnsatisfiedDependency {
              target: contract.name().to_string(),
              slot: slot.name.to_string(),
              contract: slot.contract.name().to_string(),
            });
          }
        }

        let concrete = Arc::new(value);
        let lifecycle = C::as_startable(concrete.clone());
        let instance = Instance::with_contract(*contract, upcast(concrete));
        Ok(match lifecycle {
          Some(startable) => instance.with_startable(startable),
          None => instance,
        })
      },
    );

    Self {
      contract,
      provides: TypeId::of::<I>(),
      concrete: std::any::type_name::<C>(),
      slots: slots_of::<C>,
      constructor,
    }
  }

  pub fn contract(&self) -> &Contract {
    &self.contract
  }

  /// Name of the concrete type, for diagnostics.
  pub fn concrete(&self) -> &'static str {
    self.concrete
  }

  pub fn slots(&self) -> Vec<Slot> {
    (self.slots)()
  }

  /// Rejects declarations the factory could never satisfy deterministically.
  pub(crate) fn validate(&self) -> Result<()> {
    let reject = |reason: String| Error::Registration {
      contract: self.contract.name().to_string(),
      reason,
    };
    if self.contract.type_id() != self.provides {
      return Err(reject(format!(
        "{} is not registered as an implementation of this contract",
        self.concrete
      )));
    }
    let mut seen = HashSet::new();
    for slot in self.slots() {
      if !seen.insert(slot.name) {
        return Err(reject(format!(
          "{} declares slot '{}' more than once",
          self.concrete, slot.name
        )));
      }
      if slot.contract.type_id() != slot.provides {
        return Err(reject(format!(
          "{} slot '{}' cannot accept values of contract '{}'",
          self.concrete, slot.name, slot.contract
        )));
      }
    }
    Ok(())
  }

  pub(crate) fn construct(&self, resolver: &dyn Resolve) -> Result<Instance> {
    (self.constructor)(resolver, &self.contract)
  }
}

fn slots_of<C: Creatable>() -> Vec<Slot> {
  C::dependencies().iter().map(Dependency::to_slot).collect()
}

impl fmt::Debug for Registration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registration")
      .field("contract", &self.contract)
      .field("concrete", &self.concrete)
      .finish()
  }
}
