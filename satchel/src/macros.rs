//! Public macros for ergonomic resolution and binding.

/// Resolves a typed dependency, from the default stack or from an explicit
/// source.
///
/// Expands to a `satchel::Result<Arc<T>>`; nothing panics on a missing key.
///
/// # Examples
///
/// ```
/// use satchel::{resolve, Container, Injector};
///
/// let container = Container::new();
/// container.put_value("message", String::from("hello")).unwrap();
///
/// // From an explicit container.
/// let message = resolve!(String, "message", in container).unwrap();
/// assert_eq!(*message, "hello");
///
/// // From whatever is on top of the default stack.
/// let _guard = satchel::scoped(&container, false);
/// assert_eq!(*resolve!(String, "message").unwrap(), "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  ($type:ty, $key:expr) => {
    $crate::Injector::get::<$type>($crate::global(), $key)
  };

  ($type:ty, $key:expr, in $source:expr) => {
    $crate::Injector::get::<$type>(&$source, $key)
  };
}

/// Binds keys to a callable's parameters against the default stack.
///
/// Each key is passed as the parameter of the same name, or as the parameter
/// named after `=>`.
///
/// # Examples
///
/// ```
/// use satchel::{bind, Args, Container, Injector};
///
/// let add = bind!(
///   |args: Args| -> satchel::Result<i32> {
///     Ok(*args.get::<i32>("foo")? + *args.get::<i32>("b")?)
///   },
///   "foo",
///   "bar" => "b",
/// );
///
/// let container = Container::new();
/// container.put_value("foo", 1_i32).unwrap();
/// container.put_value("bar", 2_i32).unwrap();
/// let _guard = satchel::scoped(&container, false);
///
/// assert_eq!(add.call(Args::new()).unwrap(), 3);
/// assert_eq!(add.call(Args::new().with("b", 40_i32)).unwrap(), 41);
/// ```
#[macro_export]
macro_rules! bind {
  ($target:expr $(, $key:expr $(=> $param:expr)?)* $(,)?) => {{
    let bound = $crate::bind($target);
    $( let bound = $crate::__pass!(bound, $key $(, $param)?); )*
    bound
  }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __pass {
  ($bound:expr, $key:expr) => {
    $bound.pass($key)
  };

  ($bound:expr, $key:expr, $param:expr) => {
    $bound.pass_as($key, $param)
  };
}
