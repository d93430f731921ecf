use fibre_factory::{
  creatable, singleton, ContainerConfig, Creatable, Dependency, Factory, SingletonManager, SingletonScanner,
  Startable,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// A long-lived service with a start/shutdown lifecycle.
pub trait MessageBus: Send + Sync {
  fn publish(&self, topic: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
struct InMemoryBus {
  running: AtomicBool,
}

impl Creatable for InMemoryBus {
  fn as_startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
    Some(self)
  }
}

impl Startable for InMemoryBus {
  fn start(&self) -> anyhow::Result<()> {
    self.running.store(true, Ordering::SeqCst);
    println!("[bus] started");
    Ok(())
  }

  fn shutdown(&self) -> anyhow::Result<()> {
    self.running.store(false, Ordering::SeqCst);
    println!("[bus] stopped");
    Ok(())
  }
}

impl MessageBus for InMemoryBus {
  fn publish(&self, topic: &str, body: &str) -> anyhow::Result<()> {
    anyhow::ensure!(self.running.load(Ordering::SeqCst), "bus is not running");
    println!("[bus] {topic}: {body}");
    Ok(())
  }
}

singleton!(dyn MessageBus => InMemoryBus);

// A short-lived object built on demand, wired to the bus.
pub trait OrderService: Send + Sync {
  fn place(&self, item: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
struct Orders {
  bus: Option<Arc<dyn MessageBus>>,
}

impl Creatable for Orders {
  fn dependencies() -> Vec<Dependency<Self>> {
    vec![Dependency::<Self>::on::<dyn MessageBus>("bus", |this, bus| this.bus = Some(bus))]
  }
}

impl OrderService for Orders {
  fn place(&self, item: &str) -> anyhow::Result<()> {
    let bus = self
      .bus
      .as_ref()
      .ok_or_else(|| anyhow::anyhow!("no message bus injected"))?;
    bus.publish("orders", item)
  }
}

creatable!(dyn OrderService => Orders);

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let config = ContainerConfig::new("startable_singleton");
  let factory = Factory::new(&config);
  let singletons = Arc::new(SingletonManager::new(&config));
  factory.add_dependency_provider(singletons.clone());

  // Discover everything marked with `creatable!` and `singleton!`.
  factory.auto_register_types()?;
  SingletonScanner::new(&fibre_factory::InventoryScanner, &singletons).scan_singleton_types()?;

  singletons.instantiate_singletons(&factory)?;
  singletons.start()?;

  let orders = factory.create_interface::<dyn OrderService>()?;
  orders.place("1 x coffee")?;
  orders.place("2 x croissant")?;

  singletons.shutdown()?;
  println!("Phase after shutdown: {}", singletons.phase());
  Ok(())
}
