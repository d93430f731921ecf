// Shared fixtures for the integration tests.
#![allow(dead_code, unused_macros)]

use fibre_factory::{ContainerConfig, Creatable, Dependency, Factory, SingletonManager, Startable, ValueProvider};
use std::sync::{Arc, Mutex};

/// Records lifecycle calls across singletons so tests can assert on order.
#[derive(Default)]
pub struct Journal {
  entries: Mutex<Vec<String>>,
}

impl Journal {
  pub fn record(&self, entry: impl Into<String>) {
    self.entries.lock().unwrap().push(entry.into());
  }

  pub fn entries(&self) -> Vec<String> {
    self.entries.lock().unwrap().clone()
  }
}

/// A factory with a journal provider first and a singleton manager second,
/// the way a host would bootstrap them.
pub struct Harness {
  pub factory: Factory,
  pub singletons: Arc<SingletonManager>,
  pub journal: Arc<Journal>,
}

impl Harness {
  pub fn new(name: &str) -> Self {
    Self::with_config(&ContainerConfig::new(name))
  }

  pub fn with_config(config: &ContainerConfig) -> Self {
    let factory = Factory::new(config);
    let singletons = Arc::new(SingletonManager::new(config));
    let journal = Arc::new(Journal::default());

    let values = Arc::new(ValueProvider::new());
    values.insert::<Journal>("journal", journal.clone());
    factory.add_dependency_provider(values);
    factory.add_dependency_provider(singletons.clone());

    Self {
      factory,
      singletons,
      journal,
    }
  }
}

// --- Startable fixtures ---

pub trait Named: Send + Sync {
  fn label(&self) -> &'static str;
}

/// Declares a startable singleton type that writes `start:<label>` and
/// `shutdown:<label>` into the injected journal.
macro_rules! journaled {
  ($ty:ident, $label:literal) => {
    #[derive(Default)]
    pub struct $ty {
      journal: Option<std::sync::Arc<$crate::common::Journal>>,
    }

    impl fibre_factory::Creatable for $ty {
      fn dependencies() -> Vec<fibre_factory::Dependency<Self>> {
        vec![fibre_factory::Dependency::<Self>::on::<$crate::common::Journal>(
          "journal",
          |this, journal| this.journal = Some(journal),
        )]
      }

      fn as_startable(
        self: std::sync::Arc<Self>,
      ) -> Option<std::sync::Arc<dyn fibre_factory::Startable>> {
        Some(self)
      }
    }

    impl fibre_factory::Startable for $ty {
      fn start(&self) -> anyhow::Result<()> {
        self.journal.as_ref().unwrap().record(concat!("start:", $label));
        Ok(())
      }

      fn shutdown(&self) -> anyhow::Result<()> {
        self.journal.as_ref().unwrap().record(concat!("shutdown:", $label));
        Ok(())
      }
    }

    impl $crate::common::Named for $ty {
      fn label(&self) -> &'static str {
        $label
      }
    }
  };
}

pub trait Flaky: Send + Sync {}

/// A startable singleton that refuses to start.
#[derive(Default)]
pub struct FailsToStart {
  journal: Option<Arc<Journal>>,
}

impl Flaky for FailsToStart {}

impl Creatable for FailsToStart {
  fn dependencies() -> Vec<Dependency<Self>> {
    vec![Dependency::<Self>::on::<Journal>("journal", |this, journal| {
      this.journal = Some(journal)
    })]
  }

  fn as_startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
    Some(self)
  }
}

impl Startable for FailsToStart {
  fn start(&self) -> anyhow::Result<()> {
    self.journal.as_ref().unwrap().record("start:fails_to_start");
    anyhow::bail!("port already in use")
  }

  fn shutdown(&self) -> anyhow::Result<()> {
    self.journal.as_ref().unwrap().record("shutdown:fails_to_start");
    Ok(())
  }
}

/// A startable singleton that starts fine but fails to shut down.
#[derive(Default)]
pub struct FailsToShutdown {
  journal: Option<Arc<Journal>>,
}

pub trait Sticky: Send + Sync {}
impl Sticky for FailsToShutdown {}

impl Creatable for FailsToShutdown {
  fn dependencies() -> Vec<Dependency<Self>> {
    vec![Dependency::<Self>::on::<Journal>("journal", |this, journal| {
      this.journal = Some(journal)
    })]
  }

  fn as_startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
    Some(self)
  }
}

impl Startable for FailsToShutdown {
  fn start(&self) -> anyhow::Result<()> {
    self.journal.as_ref().unwrap().record("start:fails_to_shutdown");
    Ok(())
  }

  fn shutdown(&self) -> anyhow::Result<()> {
    self.journal.as_ref().unwrap().record("shutdown:fails_to_shutdown");
    anyhow::bail!("socket already closed")
  }
}
