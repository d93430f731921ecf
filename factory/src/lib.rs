//! # Fibre Factory
//!
//! A small inversion-of-control core: a [`Factory`] that builds and wires
//! instances on demand, and a [`SingletonManager`] that owns process-lifetime
//! singletons and starts and shuts them down in order.
//!
//! ## Core Concepts
//!
//! - **Contract**: the capability a caller asks for, usually a `dyn Trait`.
//! - **Creatable**: a concrete type the factory can default-construct. It lists
//!   its injection slots through [`Creatable::dependencies`].
//! - **Provider**: anything implementing [`DependencyProvider`]. The factory
//!   fills slots by asking its providers in the order they were added.
//! - **Singleton**: built once by the [`SingletonManager`], which is itself a
//!   provider, so singletons can be injected into factory-built objects.
//! - **Markers**: [`creatable!`] and [`singleton!`] make types discoverable by
//!   a [`TypeScanner`] without explicit registration code.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_factory::{
//!   ContainerConfig, Creatable, Dependency, Factory, SingletonManager, Startable,
//! };
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!   fn now(&self) -> u64;
//! }
//!
//! #[derive(Default)]
//! struct FixedClock;
//! impl Creatable for FixedClock {
//!   fn as_startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
//!     Some(self)
//!   }
//! }
//! impl Clock for FixedClock {
//!   fn now(&self) -> u64 {
//!     42
//!   }
//! }
//! impl Startable for FixedClock {
//!   fn start(&self) -> anyhow::Result<()> {
//!     Ok(())
//!   }
//!   fn shutdown(&self) -> anyhow::Result<()> {
//!     Ok(())
//!   }
//! }
//!
//! trait Report: Send + Sync {
//!   fn stamp(&self) -> u64;
//! }
//!
//! #[derive(Default)]
//! struct DailyReport {
//!   clock: Option<Arc<dyn Clock>>,
//! }
//! impl Creatable for DailyReport {
//!   fn dependencies() -> Vec<Dependency<Self>> {
//!     vec![Dependency::<Self>::on::<dyn Clock>("clock", |this, clock| this.clock = Some(clock))]
//!   }
//! }
//! impl Report for DailyReport {
//!   fn stamp(&self) -> u64 {
//!     self.clock.as_ref().map_or(0, |clock| clock.now())
//!   }
//! }
//!
//! let config = ContainerConfig::new("quick_start");
//! let factory = Factory::new(&config);
//! let singletons = Arc::new(SingletonManager::new(&config));
//! factory.add_dependency_provider(singletons.clone());
//!
//! factory.register_type::<dyn Report, DailyReport>(|it| it).unwrap();
//! singletons.register_type::<dyn Clock, FixedClock>(|it| it).unwrap();
//!
//! singletons.instantiate_singletons(&factory).unwrap();
//! singletons.start().unwrap();
//! assert_eq!(singletons.started_contracts().len(), 1);
//!
//! let report = factory.create_interface::<dyn Report>().unwrap();
//! assert_eq!(report.stamp(), 42);
//!
//! singletons.shutdown().unwrap();
//! ```

mod config;
mod core;
mod error;
mod factory;
mod macros;
mod provider;
mod registration;
mod scanner;
mod singleton;
mod singleton_scanner;

pub use crate::core::{Contract, Instance};
pub use config::{ConflictPolicy, ContainerConfig};
pub use error::{Error, Result};
pub use factory::Factory;
pub use provider::{DependencyProvider, ValueProvider};
pub use registration::{Creatable, Dependency, Registration, Slot, Startable};
pub use scanner::{InventoryScanner, MarkerKind, StaticScanner, TypeMarker, TypeScanner};
pub use singleton::{Phase, SingletonManager};
pub use singleton_scanner::SingletonScanner;

#[doc(hidden)]
pub use inventory;
