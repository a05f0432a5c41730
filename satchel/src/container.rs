//! The main `Container` struct and its associated methods.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::context::next_id;
use crate::core::{Definition, Key, Value};
use crate::error::{Error, Result};
use crate::injector::Injector;

/// A dependency container mapping keys to definitions.
///
/// `Container` is a cheap handle: clones share the same registrations, so
/// setup code can keep registering into a container after pushing it onto a
/// [`Stack`](crate::Stack). It is thread-safe and allows registration and
/// resolution at any point during the application's lifecycle.
///
/// No lock is held while a factory runs, so factories are free to resolve
/// other dependencies through the same container or through a stack.
#[derive(Clone)]
pub struct Container {
  inner: Arc<Inner>,
}

struct Inner {
  name: String,
  definitions: DashMap<Key, Definition>,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::named(format!("0x{:x}", next_id()))
  }

  /// Creates a new, empty `Container` identified by `name` in logs.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      inner: Arc::new(Inner {
        name: name.into(),
        definitions: DashMap::new(),
      }),
    }
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn contains(&self, key: &Key) -> bool {
    self.inner.definitions.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.inner.definitions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.definitions.is_empty()
  }

  /// Whether both handles point at the same container.
  pub fn ptr_eq(&self, other: &Container) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Injector for Container {
  fn resolve(&self, key: &Key) -> Result<Value> {
    // Clone the definition out so the map shard is unlocked before the
    // factory runs; factories may register or resolve through `self`.
    let definition = self
      .inner
      .definitions
      .get(key)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| Error::KeyNotFound(key.clone()))?;

    tracing::trace!(container = %self.inner.name, %key, "resolving");
    Ok(definition.produce(key))
  }

  fn define(&self, key: Key, definition: Definition) -> Result<()> {
    tracing::debug!(container = %self.inner.name, %key, ?definition, "defining");
    self.inner.definitions.insert(key, definition);
    Ok(())
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("name", &self.inner.name)
      .field("definitions", &self.inner.definitions.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_definitions() {
    let container = Container::named("setup");
    let handle = container.clone();

    handle.put_value("magic", 42_u32).unwrap();

    assert!(container.contains(&Key::from("magic")));
    assert!(container.ptr_eq(&handle));
    assert_eq!(*container.get::<u32>("magic").unwrap(), 42);
  }

  #[test]
  fn factory_may_resolve_through_its_own_container() {
    let container = Container::new();
    container.put_value("base", 2_u32).unwrap();

    let inner = container.clone();
    container
      .put_factory("derived", move || *inner.get::<u32>("base").unwrap() * 10)
      .unwrap();

    assert_eq!(*container.get::<u32>("derived").unwrap(), 20);
  }
}
