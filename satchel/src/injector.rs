//! The contract shared by everything that can hand out dependencies.

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::binder::Bound;
use crate::core::{self, Definition, Factory, Key, Value};
use crate::error::{Error, Result};
use crate::scope::ScopeRef;

/// Something dependencies can be registered in and resolved from.
///
/// Implemented by [`Container`](crate::Container), [`Chain`](crate::Chain),
/// stack entries ([`Active`](crate::Active)) and [`Stack`](crate::Stack).
/// Only [`resolve`](Injector::resolve) and [`define`](Injector::define) are
/// required; the typed helpers are built on top of them.
pub trait Injector: Send + Sync {
  /// Produces the type-erased dependency registered under `key`.
  fn resolve(&self, key: &Key) -> Result<Value>;

  /// Registers `definition` under `key`, replacing any previous one.
  fn define(&self, key: Key, definition: Definition) -> Result<()>;

  /// Resolves `key` and downcasts the dependency to `T`.
  fn get<T>(&self, key: impl Into<Key>) -> Result<Arc<T>>
  where
    Self: Sized,
    T: Any + Send + Sync,
  {
    let key = key.into();
    self
      .resolve(&key)?
      .downcast::<T>()
      .map_err(|_| Error::TypeMismatch {
        name: key.to_string(),
        expected: type_name::<T>(),
      })
  }

  /// Like [`get`](Injector::get), but returns `default` when nothing is
  /// registered under `key`. Every other error still propagates.
  fn get_or<T>(&self, key: impl Into<Key>, default: Arc<T>) -> Result<Arc<T>>
  where
    Self: Sized,
    T: Any + Send + Sync,
  {
    match self.get(key) {
      Err(Error::KeyNotFound(_)) => Ok(default),
      other => other,
    }
  }

  /// Registers a dependency from raw parts.
  ///
  /// Exactly one of `value` and `factory` must be given, and `scope` only
  /// together with a factory; otherwise this fails with
  /// [`Error::InvalidDefinition`]. A factory without a scope is never cached.
  fn put(
    &self,
    key: impl Into<Key>,
    value: Option<Value>,
    factory: Option<Factory>,
    scope: Option<ScopeRef>,
  ) -> Result<()>
  where
    Self: Sized,
  {
    let key = key.into();
    match Definition::new(value, factory, scope) {
      Ok(definition) => self.define(key, definition),
      Err(reason) => Err(Error::InvalidDefinition { key, reason }),
    }
  }

  /// Registers a literal value, returned as-is on every lookup.
  fn put_value<T>(&self, key: impl Into<Key>, value: T) -> Result<()>
  where
    Self: Sized,
    T: Any + Send + Sync,
  {
    self.define(key.into(), Definition::Value(core::value(value)))
  }

  /// Registers a factory that runs on every lookup.
  fn put_factory<T, F>(&self, key: impl Into<Key>, factory: F) -> Result<()>
  where
    Self: Sized,
    T: Any + Send + Sync,
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.put_scoped(key, factory, crate::scope::noscope())
  }

  /// Registers a factory whose results are cached by `scope`.
  fn put_scoped<T, F>(&self, key: impl Into<Key>, factory: F, scope: ScopeRef) -> Result<()>
  where
    Self: Sized,
    T: Any + Send + Sync,
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.define(
      key.into(),
      Definition::Factory {
        factory: core::factory(factory),
        scope,
      },
    )
  }

  /// Wraps `target` so that its bound parameters are resolved from this
  /// injector when it is called.
  fn bind<F>(&self, target: F) -> Bound<F, Self>
  where
    Self: Sized + Clone,
  {
    Bound::new(self.clone(), target)
  }
}
