//! The default stack instance and the free functions working on it.

use std::any::Any;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::binder::{Bound, Pass};
use crate::core::{Factory, Key, Value};
use crate::error::Result;
use crate::injector::Injector;
use crate::scope::ScopeRef;
use crate::stack::{Active, Mode, PushGuard, Stack};

// The one and only default stack, created on first access.
// Context-local, so threads and tasks pushing different containers never
// see each other's entries.
static GLOBAL_STACK: Lazy<Stack> = Lazy::new(|| Stack::named("shared", Mode::Local));

/// Provides a reference to the default stack.
///
/// # Examples
///
/// ```
/// use satchel::{global, Container, Injector};
///
/// let container = Container::new();
/// container.put_value("greeting", String::from("Hello from global!")).unwrap();
///
/// let _guard = global().scoped(&container, false);
/// assert_eq!(*global().get::<String>("greeting").unwrap(), "Hello from global!");
/// ```
pub fn global() -> &'static Stack {
  &GLOBAL_STACK
}

/// [`Stack::push`] on the default stack.
pub fn push(container: impl Into<Active>, chain: bool) -> Active {
  global().push(container, chain)
}

/// [`Stack::pop`] on the default stack.
pub fn pop() -> Result<Active> {
  global().pop()
}

/// [`Stack::scoped`] on the default stack.
pub fn scoped(container: impl Into<Active>, chain: bool) -> PushGuard {
  global().scoped(container, chain)
}

/// [`Injector::get`] on the default stack.
pub fn get<T: Any + Send + Sync>(key: impl Into<Key>) -> Result<Arc<T>> {
  global().get(key)
}

/// [`Injector::get_or`] on the default stack.
pub fn get_or<T: Any + Send + Sync>(key: impl Into<Key>, default: Arc<T>) -> Result<Arc<T>> {
  global().get_or(key, default)
}

/// [`Injector::put`] on the default stack.
pub fn put(
  key: impl Into<Key>,
  value: Option<Value>,
  factory: Option<Factory>,
  scope: Option<ScopeRef>,
) -> Result<()> {
  global().put(key, value, factory, scope)
}

/// [`Injector::put_value`] on the default stack.
pub fn put_value<T: Any + Send + Sync>(key: impl Into<Key>, value: T) -> Result<()> {
  global().put_value(key, value)
}

/// [`Injector::put_factory`] on the default stack.
pub fn put_factory<T, F>(key: impl Into<Key>, factory: F) -> Result<()>
where
  T: Any + Send + Sync,
  F: Fn() -> T + Send + Sync + 'static,
{
  global().put_factory(key, factory)
}

/// [`Injector::put_scoped`] on the default stack.
pub fn put_scoped<T, F>(key: impl Into<Key>, factory: F, scope: ScopeRef) -> Result<()>
where
  T: Any + Send + Sync,
  F: Fn() -> T + Send + Sync + 'static,
{
  global().put_scoped(key, factory, scope)
}

/// Wraps `target` so its bound parameters resolve from the default stack.
pub fn bind<F>(target: F) -> Bound<F, Stack> {
  global().bind(target)
}

/// A detached binding of `key`, resolved from the default stack at call time.
pub fn pass(key: impl Into<Key>) -> Pass<Stack> {
  global().pass(key)
}
