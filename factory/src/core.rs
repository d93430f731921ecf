//! Contract identifiers and type-erased instances.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::registration::Startable;

/// Identifies an abstract capability, usually a `dyn Trait`.
///
/// A contract is the pair of the capability's `TypeId` and a name. The name
/// defaults to the type's `type_name` and is what providers are queried by.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Contract {
  type_id: TypeId,
  name: &'static str,
}

impl Contract {
  /// The contract for `I`, named after the type itself.
  pub fn of<I: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<I>(),
      name: std::any::type_name::<I>(),
    }
  }

  /// The contract for `I` under an explicit name.
  pub fn named<I: ?Sized + Any>(name: &'static str) -> Self {
    Self {
      type_id: TypeId::of::<I>(),
      name,
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  /// True when a value for `other` can stand in for this contract.
  pub fn accepts(&self, other: &Contract) -> bool {
    self.type_id == other.type_id
  }
}

impl fmt::Debug for Contract {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Contract({})", self.name)
  }
}

impl fmt::Display for Contract {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// A constructed object satisfying a contract.
///
/// The value is an `Arc<I>` boxed behind `dyn Any`, so it can be handed out
/// any number of times and downcast back to `Arc<I>` by whoever knows `I`.
#[derive(Clone)]
pub struct Instance {
  contract: Contract,
  value: Arc<dyn Any + Send + Sync>,
  startable: Option<Arc<dyn Startable>>,
}

impl Instance {
  /// Wraps `value` as the instance of `I`'s default contract.
  pub fn new<I: ?Sized + Send + Sync + 'static>(value: Arc<I>) -> Self {
    Self::with_contract(Contract::of::<I>(), value)
  }

  /// Wraps `value` under `contract`. The contract's type must be `I`.
  pub fn with_contract<I: ?Sized + Send + Sync + 'static>(contract: Contract, value: Arc<I>) -> Self {
    debug_assert_eq!(contract.type_id(), TypeId::of::<I>());
    Self {
      contract,
      value: Arc::new(value),
      startable: None,
    }
  }

  pub(crate) fn with_startable(mut self, startable: Arc<dyn Startable>) -> Self {
    self.startable = Some(startable);
    self
  }

  pub fn contract(&self) -> &Contract {
    &self.contract
  }

  /// Recovers the shared handle, or `None` if the instance is not an `I`.
  pub fn downcast<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
    self.value.downcast_ref::<Arc<I>>().cloned()
  }

  /// The lifecycle hooks, when the concrete type exposes any.
  pub fn startable(&self) -> Option<&Arc<dyn Startable>> {
    self.startable.as_ref()
  }

  /// True when both instances share the same underlying allocation.
  pub fn ptr_eq(&self, other: &Instance) -> bool {
    Arc::ptr_eq(&self.value, &other.value)
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Instance")
      .field("contract", &self.contract)
      .field("startable", &self.startable.is_some())
      .finish()
  }
}
