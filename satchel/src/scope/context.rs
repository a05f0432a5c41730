use crate::context::{self, next_id};
use crate::core::{Key, Value};

use super::Scope;

/// Shares instances within one execution context frame.
///
/// Values are stored in the current [`context`](crate::context) frame, so a
/// task started with `context::spawn` sees what its parent cached until it
/// caches its own, and sibling tasks never see each other's values even when
/// they share a worker thread. A task started with plain `tokio::spawn` has a
/// root frame of its own; outside any task, each thread's root frame acts as
/// the context. Values go away with the frame that holds them (for a plain
/// task, when it calls [`context::release_task`](crate::context::release_task)).
#[derive(Debug)]
pub struct Context {
  id: u64,
}

impl Context {
  pub fn new() -> Self {
    Self { id: next_id() }
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::new()
  }
}

impl Scope for Context {
  fn cached(&self, key: &Key) -> Option<Value> {
    context::current().lookup(self.id, key)
  }

  fn set(&self, key: &Key, value: Value) {
    context::current_mut().store(self.id, key, value);
  }
}
