use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::core::{Key, Value};

use super::Scope;

/// Shares one instance per key across the whole process.
///
/// Each key owns a `OnceCell`, so concurrent first lookups of the same key
/// block on a single factory invocation and all observe its result. Lookups
/// of different keys never wait on each other, which lets a factory resolve
/// other singleton keys while it runs. A factory that resolves its own key
/// deadlocks.
#[derive(Default)]
pub struct Singleton {
  slots: DashMap<Key, Arc<OnceCell<Value>>>,
}

impl Singleton {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drops every cached instance.
  pub fn clear(&self) {
    self.slots.clear();
  }

  pub fn len(&self) -> usize {
    self.slots.iter().filter(|slot| slot.value().get().is_some()).count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn slot(&self, key: &Key) -> Arc<OnceCell<Value>> {
    // The map guard must be gone before the cell runs a factory.
    self.slots.entry(key.clone()).or_default().clone()
  }
}

impl Scope for Singleton {
  fn cached(&self, key: &Key) -> Option<Value> {
    self.slots.get(key).and_then(|slot| slot.value().get().cloned())
  }

  fn set(&self, key: &Key, value: Value) {
    self.slots.insert(key.clone(), Arc::new(OnceCell::with_value(value)));
  }

  fn get(&self, key: &Key, factory: &dyn Fn() -> Value) -> Value {
    self.slot(key).get_or_init(factory).clone()
  }
}

impl fmt::Debug for Singleton {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Singleton")
      .field("cached", &self.len())
      .finish()
  }
}
