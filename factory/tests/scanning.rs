#[macro_use]
mod common;

use common::Harness;
use fibre_factory::{
  creatable, singleton, Contract, Creatable, Dependency, InventoryScanner, MarkerKind, SingletonScanner,
  TypeScanner,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Marked types, collected at start-up ---

pub trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

#[derive(Default)]
struct EnglishGreeter;
impl Creatable for EnglishGreeter {}
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

#[derive(Default)]
struct PoliteGreeter;
impl Creatable for PoliteGreeter {}
impl Greeter for PoliteGreeter {
  fn greet(&self) -> String {
    "Good day to you.".to_string()
  }
}

creatable!(dyn Greeter => EnglishGreeter);
creatable!(dyn Greeter => PoliteGreeter, name = "polite");

journaled!(Pump, "pump");
singleton!(Pump => Pump);

pub trait Settings: Send + Sync {
  fn retries(&self) -> u32;
}

#[derive(Default)]
struct DefaultSettings;
impl Creatable for DefaultSettings {}
impl Settings for DefaultSettings {
  fn retries(&self) -> u32 {
    3
  }
}

singleton!(dyn Settings => DefaultSettings);

/// Built by the factory on demand, wired to both scanned singletons.
#[derive(Default)]
struct Worker {
  pump: Option<Arc<Pump>>,
  settings: Option<Arc<dyn Settings>>,
}

impl Creatable for Worker {
  fn dependencies() -> Vec<Dependency<Self>> {
    vec![
      Dependency::<Self>::on::<Pump>("pump", |this, pump| this.pump = Some(pump)),
      Dependency::<Self>::on::<dyn Settings>("settings", |this, settings| {
        this.settings = Some(settings)
      }),
    ]
  }
}

creatable!(Worker => Worker);

// --- Tests ---

#[test]
fn test_inventory_scanner_sees_markers_by_kind() {
  // Act
  let mut creatable: Vec<&str> = InventoryScanner
    .find_types_marked_with(MarkerKind::Creatable)
    .map(|marker| marker.name())
    .collect();
  let mut singletons: Vec<&str> = InventoryScanner
    .find_types_marked_with(MarkerKind::Singleton)
    .map(|marker| marker.concrete())
    .collect();
  creatable.sort_unstable();
  singletons.sort_unstable();

  // Assert: inventory gives no ordering guarantee, so compare sorted.
  let mut expected_creatable = vec![
    Contract::of::<dyn Greeter>().name(),
    "polite",
    Contract::of::<Worker>().name(),
  ];
  expected_creatable.sort_unstable();
  assert_eq!(creatable, expected_creatable);
  assert_eq!(singletons, vec!["DefaultSettings", "Pump"]);
}

#[test]
fn test_scanned_types_wire_together() {
  // Arrange
  let harness = Harness::new("scanning");
  let registered = harness.factory.auto_register_types().unwrap();
  let scanned = SingletonScanner::new(&InventoryScanner, &harness.singletons)
    .scan_singleton_types()
    .unwrap();

  // Act
  harness.singletons.instantiate_singletons(&harness.factory).unwrap();
  harness.singletons.start().unwrap();
  let worker = harness.factory.create_interface::<Worker>().unwrap();
  let greeter = harness.factory.create_interface::<dyn Greeter>().unwrap();
  let polite = harness.factory.create_named::<dyn Greeter>("polite").unwrap();

  // Assert
  assert_eq!(registered, 3);
  assert_eq!(scanned, 2);
  assert_eq!(greeter.greet(), "Hello!");
  assert_eq!(polite.greet(), "Good day to you.");
  assert_eq!(worker.settings.as_ref().unwrap().retries(), 3);
  assert!(Arc::ptr_eq(
    worker.pump.as_ref().unwrap(),
    &harness.singletons.get::<Pump>().unwrap()
  ));
  assert_eq!(harness.singletons.started_contracts(), vec![Contract::of::<Pump>()]);

  harness.singletons.shutdown().unwrap();
  assert_eq!(harness.journal.entries(), vec!["start:pump", "shutdown:pump"]);
}
