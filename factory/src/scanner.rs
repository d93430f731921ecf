//! Marker-driven type discovery.
//!
//! Types announce themselves with the [`creatable!`](crate::creatable) and
//! [`singleton!`](crate::singleton) macros, which submit a [`TypeMarker`] into
//! a process-wide `inventory` collection once, at start-up. A [`TypeScanner`]
//! walks those markers; the factory and the singleton scanner only ever see
//! the trait, so the discovery mechanism can be swapped.

use std::collections::HashMap;
use std::fmt;

use crate::core::Contract;
use crate::error::{Error, Result};
use crate::registration::Registration;

/// The role a marker declares for its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
  /// Built on demand by the [`Factory`](crate::Factory).
  Creatable,
  /// Built once and owned by the [`SingletonManager`](crate::SingletonManager).
  Singleton,
}

/// Metadata attached to a concrete type by a marker macro.
#[derive(Clone, Copy)]
pub struct TypeMarker {
  kind: MarkerKind,
  concrete: &'static str,
  registration: fn() -> Registration,
}

inventory::collect!(TypeMarker);

impl TypeMarker {
  pub const fn new(kind: MarkerKind, concrete: &'static str, registration: fn() -> Registration) -> Self {
    Self {
      kind,
      concrete,
      registration,
    }
  }

  pub fn kind(&self) -> MarkerKind {
    self.kind
  }

  /// The concrete type as written in the marker.
  pub fn concrete(&self) -> &'static str {
    self.concrete
  }

  /// The contract the marker declares the type satisfies.
  pub fn contract(&self) -> Contract {
    *self.registration().contract()
  }

  /// The declared contract name.
  pub fn name(&self) -> &'static str {
    self.contract().name()
  }

  pub fn registration(&self) -> Registration {
    (self.registration)()
  }
}

impl fmt::Debug for TypeMarker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TypeMarker")
      .field("kind", &self.kind)
      .field("concrete", &self.concrete)
      .finish()
  }
}

/// Enumerates marked types.
///
/// The returned sequence is lazy and finite, and calling the method again
/// restarts it. Order is unspecified but stable within one process run.
pub trait TypeScanner: Send + Sync {
  fn find_types_marked_with(&self, kind: MarkerKind) -> Box<dyn Iterator<Item = TypeMarker> + '_>;
}

/// Walks every marker submitted through `inventory` in this binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryScanner;

impl TypeScanner for InventoryScanner {
  fn find_types_marked_with(&self, kind: MarkerKind) -> Box<dyn Iterator<Item = TypeMarker> + '_> {
    Box::new(
      inventory::iter::<TypeMarker>
        .into_iter()
        .filter(move |marker| marker.kind == kind)
        .copied(),
    )
  }
}

/// Walks an explicit list of markers, in list order.
#[derive(Debug, Default, Clone)]
pub struct StaticScanner {
  markers: Vec<TypeMarker>,
}

impl StaticScanner {
  pub fn new(markers: impl IntoIterator<Item = TypeMarker>) -> Self {
    Self {
      markers: markers.into_iter().collect(),
    }
  }

  pub fn with(mut self, marker: TypeMarker) -> Self {
    self.markers.push(marker);
    self
  }
}

impl TypeScanner for StaticScanner {
  fn find_types_marked_with(&self, kind: MarkerKind) -> Box<dyn Iterator<Item = TypeMarker> + '_> {
    Box::new(self.markers.iter().filter(move |marker| marker.kind == kind).copied())
  }
}

/// Collects the registrations for `kind`, reporting every contract claimed by
/// more than one type.
///
/// Registrations come back in scan order. Under `replace`, later claims
/// overwrite earlier ones in place instead of being reported.
pub(crate) fn collect_marked(
  scanner: &dyn TypeScanner,
  kind: MarkerKind,
  replace: bool,
) -> Result<Vec<Registration>> {
  let mut found: Vec<Registration> = Vec::new();
  let mut index: HashMap<Contract, usize> = HashMap::new();
  let mut conflicts = Vec::new();

  for marker in scanner.find_types_marked_with(kind) {
    let registration = marker.registration();
    if let Err(err) = registration.validate() {
      conflicts.push(err.to_string());
      continue;
    }
    match index.get(registration.contract()) {
      Some(&at) if replace => found[at] = registration,
      Some(&at) => conflicts.push(format!(
        "'{}' is claimed by both {} and {}",
        registration.contract(),
        found[at].concrete(),
        registration.concrete()
      )),
      None => {
        index.insert(*registration.contract(), found.len());
        found.push(registration);
      }
    }
  }

  if conflicts.is_empty() {
    Ok(found)
  } else {
    Err(Error::RegistrationConflicts { conflicts })
  }
}
