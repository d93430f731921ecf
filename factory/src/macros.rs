//! Marker macros that make types discoverable by a [`TypeScanner`](crate::TypeScanner).

/// Marks a type as creatable by the [`Factory`](crate::Factory).
///
/// The marker is collected at start-up and picked up by
/// [`Factory::auto_register_types`](crate::Factory::auto_register_types).
///
/// ```
/// use fibre_factory::{creatable, Creatable, Factory};
///
/// pub trait Greeter: Send + Sync {
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
/// creatable!(dyn Greeter => EnglishGreeter);
///
/// let factory = Factory::default();
/// factory.auto_register_types().unwrap();
/// assert_eq!(factory.create_interface::<dyn Greeter>().unwrap().greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! creatable {
  // creatable!(dyn Contract => Concrete, name = "contract_name")
  ($contract:ty => $concrete:ty, name = $name:expr) => {
    $crate::__submit_marker!(
      $crate::MarkerKind::Creatable,
      $concrete,
      $crate::Registration::named::<$contract, $concrete>(
        $crate::Contract::named::<$contract>($name),
        |it| it,
      )
    );
  };

  // creatable!(dyn Contract => Concrete)
  ($contract:ty => $concrete:ty) => {
    $crate::__submit_marker!(
      $crate::MarkerKind::Creatable,
      $concrete,
      $crate::Registration::of::<$contract, $concrete>(|it| it)
    );
  };
}

/// Marks a type as a singleton owned by the [`SingletonManager`](crate::SingletonManager).
///
/// Types that expose [`Startable`](crate::Startable) hooks through
/// [`Creatable::as_startable`](crate::Creatable::as_startable) are started and
/// shut down with the other singletons.
///
/// ```ignore
/// singleton!(dyn Clock => SystemClock);
/// singleton!(dyn Database => Pool, name = "primary");
/// ```
#[macro_export]
macro_rules! singleton {
  // singleton!(dyn Contract => Concrete, name = "contract_name")
  ($contract:ty => $concrete:ty, name = $name:expr) => {
    $crate::__submit_marker!(
      $crate::MarkerKind::Singleton,
      $concrete,
      $crate::Registration::named::<$contract, $concrete>(
        $crate::Contract::named::<$contract>($name),
        |it| it,
      )
    );
  };

  // singleton!(dyn Contract => Concrete)
  ($contract:ty => $concrete:ty) => {
    $crate::__submit_marker!(
      $crate::MarkerKind::Singleton,
      $concrete,
      $crate::Registration::of::<$contract, $concrete>(|it| it)
    );
  };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __submit_marker {
  ($kind:expr, $concrete:ty, $registration:expr) => {
    const _: () = {
      fn registration() -> $crate::Registration {
        $registration
      }

      $crate::inventory::submit! {
        $crate::TypeMarker::new($kind, stringify!($concrete), registration)
      }
    };
  };
}
