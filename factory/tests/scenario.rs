use fibre_factory::{ContainerConfig, Creatable, Dependency, Factory, Phase, SingletonManager, Startable};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait IMySingleton: Send + Sync {
  fn starts(&self) -> usize;
  fn shutdowns(&self) -> usize;
  /// Sequence number of the last start and shutdown call, 0 if never called.
  fn sequence(&self) -> (usize, usize);
}

#[derive(Default)]
struct MySingleton {
  clock: AtomicUsize,
  starts: AtomicUsize,
  shutdowns: AtomicUsize,
  started_at: AtomicUsize,
  shut_down_at: AtomicUsize,
}

impl Creatable for MySingleton {
  fn as_startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
    Some(self)
  }
}

impl Startable for MySingleton {
  fn start(&self) -> anyhow::Result<()> {
    self.starts.fetch_add(1, Ordering::SeqCst);
    let tick = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
    self.started_at.store(tick, Ordering::SeqCst);
    Ok(())
  }

  fn shutdown(&self) -> anyhow::Result<()> {
    self.shutdowns.fetch_add(1, Ordering::SeqCst);
    let tick = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
    self.shut_down_at.store(tick, Ordering::SeqCst);
    Ok(())
  }
}

impl IMySingleton for MySingleton {
  fn starts(&self) -> usize {
    self.starts.load(Ordering::SeqCst)
  }

  fn shutdowns(&self) -> usize {
    self.shutdowns.load(Ordering::SeqCst)
  }

  fn sequence(&self) -> (usize, usize) {
    (self.started_at.load(Ordering::SeqCst), self.shut_down_at.load(Ordering::SeqCst))
  }
}

trait IMyType: Send + Sync {
  fn singleton(&self) -> Option<Arc<dyn IMySingleton>>;
}

#[derive(Default)]
struct MyType {
  my_singleton: Option<Arc<dyn IMySingleton>>,
}

impl Creatable for MyType {
  fn dependencies() -> Vec<Dependency<Self>> {
    vec![Dependency::<Self>::on::<dyn IMySingleton>("my_singleton", |this, singleton| {
      this.my_singleton = Some(singleton)
    })]
  }
}

impl IMyType for MyType {
  fn singleton(&self) -> Option<Arc<dyn IMySingleton>> {
    self.my_singleton.clone()
  }
}

#[test]
fn test_created_type_receives_the_managed_singleton() {
  // Arrange
  let config = ContainerConfig::new("scenario");
  let factory = Factory::new(&config);
  let manager = Arc::new(SingletonManager::new(&config));
  factory.add_dependency_provider(manager.clone());

  manager
    .register_type::<dyn IMySingleton, MySingleton>(|it| it)
    .unwrap();
  factory.register_type::<dyn IMyType, MyType>(|it| it).unwrap();

  // Act
  manager.instantiate_singletons(&factory).unwrap();
  manager.start().unwrap();
  let my_type = factory.create_interface::<dyn IMyType>().unwrap();

  // Assert
  let managed = manager.get::<dyn IMySingleton>().unwrap();
  let injected = my_type.singleton().unwrap();
  assert!(Arc::ptr_eq(&managed, &injected));
  assert_eq!(managed.starts(), 1);
  assert_eq!(managed.shutdowns(), 0);

  manager.shutdown().unwrap();

  assert_eq!(manager.phase(), Phase::Shutdown);
  assert_eq!(managed.starts(), 1);
  assert_eq!(managed.shutdowns(), 1);
  let (started_at, shut_down_at) = managed.sequence();
  assert!(started_at > 0 && shut_down_at > started_at, "start {started_at}, shutdown {shut_down_at}");
}
