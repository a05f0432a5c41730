use std::fmt;
use std::thread::{self, ThreadId};

use dashmap::DashMap;

use crate::core::{Key, Value};

use super::Scope;

/// Shares instances within one OS thread.
///
/// Slots live in the scope itself and are released when the scope is
/// dropped. Slots of threads that have exited are not reclaimed before then;
/// long-running pools that churn threads can call
/// [`forget_current_thread`](ThreadLocal::forget_current_thread) on the way
/// out of a worker.
#[derive(Default)]
pub struct ThreadLocal {
  slots: DashMap<(ThreadId, Key), Value>,
}

impl ThreadLocal {
  pub fn new() -> Self {
    Self::default()
  }

  /// Releases every value cached for the calling thread.
  pub fn forget_current_thread(&self) {
    let me = thread::current().id();
    self.slots.retain(|(owner, _), _| *owner != me);
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }
}

impl Scope for ThreadLocal {
  fn cached(&self, key: &Key) -> Option<Value> {
    self
      .slots
      .get(&(thread::current().id(), key.clone()))
      .map(|value| value.value().clone())
  }

  fn set(&self, key: &Key, value: Value) {
    self.slots.insert((thread::current().id(), key.clone()), value);
  }
}

impl fmt::Debug for ThreadLocal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ThreadLocal")
      .field("cached", &self.slots.len())
      .finish()
  }
}
