//! The activation stack: which container is "current" for ambient lookups.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::binder::Pass;
use crate::chain::Chain;
use crate::container::Container;
use crate::context::{self, next_id};
use crate::core::{Definition, Key, Value};
use crate::error::{Error, Result};
use crate::injector::Injector;

/// An entry on a [`Stack`]: either a pushed container or the chain built by
/// a chained push.
#[derive(Clone, Debug)]
pub enum Active {
  Container(Container),
  Chain(Chain),
}

impl Active {
  /// The container that receives definitions made through this entry.
  pub fn primary(&self) -> &Container {
    match self {
      Active::Container(container) => container,
      Active::Chain(chain) => chain.primary(),
    }
  }

  pub fn as_chain(&self) -> Option<&Chain> {
    match self {
      Active::Chain(chain) => Some(chain),
      Active::Container(_) => None,
    }
  }

  pub fn ptr_eq(&self, other: &Active) -> bool {
    match (self, other) {
      (Active::Container(a), Active::Container(b)) => a.ptr_eq(b),
      (Active::Chain(a), Active::Chain(b)) => a.ptr_eq(b),
      _ => false,
    }
  }
}

impl From<Container> for Active {
  fn from(container: Container) -> Self {
    Active::Container(container)
  }
}

impl From<&Container> for Active {
  fn from(container: &Container) -> Self {
    Active::Container(container.clone())
  }
}

impl From<Chain> for Active {
  fn from(chain: Chain) -> Self {
    Active::Chain(chain)
  }
}

impl Injector for Active {
  fn resolve(&self, key: &Key) -> Result<Value> {
    match self {
      Active::Container(container) => container.resolve(key),
      Active::Chain(chain) => chain.resolve(key),
    }
  }

  fn define(&self, key: Key, definition: Definition) -> Result<()> {
    match self {
      Active::Container(container) => container.define(key, definition),
      Active::Chain(chain) => chain.define(key, definition),
    }
  }
}

/// Whether a stack's push/pop sequence is per execution context or global.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
  /// Each thread and each [`context`](crate::context) frame has its own
  /// sequence. A child frame sees its parent's top until it pushes its own.
  #[default]
  Local,
  /// One sequence shared by every thread and task, guarded by a mutex.
  Shared,
}

enum Storage {
  Local,
  Shared(Mutex<Vec<Active>>),
}

struct Inner {
  id: u64,
  name: String,
  storage: Storage,
}

/// A LIFO stack of containers, proxying lookups and definitions to the entry
/// on top.
///
/// Injection points can be declared once against a stack while the
/// containers behind them change on the fly, which is how tests override
/// dependencies. `Stack` is a cheap handle; clones address the same stack.
#[derive(Clone)]
pub struct Stack {
  inner: Arc<Inner>,
}

impl Stack {
  pub fn new(mode: Mode) -> Self {
    let id = next_id();
    Self::with_id(id, format!("0x{:x}", id), mode)
  }

  pub fn named(name: impl Into<String>, mode: Mode) -> Self {
    Self::with_id(next_id(), name.into(), mode)
  }

  fn with_id(id: u64, name: String, mode: Mode) -> Self {
    let storage = match mode {
      Mode::Local => Storage::Local,
      Mode::Shared => Storage::Shared(Mutex::new(Vec::new())),
    };
    Self {
      inner: Arc::new(Inner { id, name, storage }),
    }
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn mode(&self) -> Mode {
    match self.inner.storage {
      Storage::Local => Mode::Local,
      Storage::Shared(_) => Mode::Shared,
    }
  }

  /// Pushes `container` on top of the stack and returns the entry that was
  /// actually pushed.
  ///
  /// With `chain` set and a non-empty stack, the entry is a [`Chain`] of
  /// `container` over the previous top, so keys missing from `container`
  /// fall through one level down. Each level must be pushed with `chain` for
  /// lookups to cascade further.
  ///
  /// This is the raw half of a push/pop pair: the caller owns the matching
  /// [`pop`](Stack::pop). Prefer [`scoped`](Stack::scoped) unless enter and
  /// exit happen in separate callbacks.
  pub fn push(&self, container: impl Into<Active>, chain: bool) -> Active {
    let pushed = container.into();
    let entry = match &self.inner.storage {
      Storage::Local => {
        let frame = context::current_mut();
        let entry = stack_entry(frame.stack_top(self.inner.id), pushed, chain);
        frame.stack_push(self.inner.id, entry.clone());
        entry
      }
      Storage::Shared(entries) => {
        let mut entries = entries.lock();
        let entry = stack_entry(entries.last().cloned(), pushed, chain);
        entries.push(entry.clone());
        entry
      }
    };
    tracing::debug!(stack = %self.inner.name, depth = self.depth(), chain, "pushed");
    entry
  }

  /// Removes and returns the entry on top.
  ///
  /// On a local stack only entries pushed from the calling context can be
  /// popped. When the calling context pushed nothing but an enclosing one
  /// did, the visible top is not this context's to remove and the pop fails
  /// with [`Error::InheritedEntry`]; [`Error::StackUnderflow`] means nothing
  /// is visible at all.
  pub fn pop(&self) -> Result<Active> {
    let popped = match &self.inner.storage {
      Storage::Local => {
        let frame = context::current();
        let popped = frame.stack_pop(self.inner.id);
        if popped.is_none() && frame.stack_depth(self.inner.id) > 0 {
          return Err(Error::InheritedEntry {
            stack: self.inner.name.clone(),
          });
        }
        drop(frame);
        context::release_idle();
        popped
      }
      Storage::Shared(entries) => entries.lock().pop(),
    };
    match popped {
      Some(entry) => {
        tracing::debug!(stack = %self.inner.name, depth = self.depth(), "popped");
        Ok(entry)
      }
      None => Err(Error::StackUnderflow {
        stack: self.inner.name.clone(),
      }),
    }
  }

  /// Pushes `container` and returns a guard that pops it again when dropped,
  /// whether the enclosing code returns, fails with `?`, panics or (for a
  /// future) is cancelled.
  pub fn scoped(&self, container: impl Into<Active>, chain: bool) -> PushGuard {
    let active = self.push(container, chain);
    PushGuard {
      stack: self.clone(),
      active,
    }
  }

  /// The entry on top, or [`Error::NoActiveContainer`] when empty.
  pub fn top(&self) -> Result<Active> {
    let top = match &self.inner.storage {
      Storage::Local => context::current().stack_top(self.inner.id),
      Storage::Shared(entries) => entries.lock().last().cloned(),
    };
    top.ok_or_else(|| Error::NoActiveContainer {
      stack: self.inner.name.clone(),
    })
  }

  /// How many entries are visible from the calling context.
  pub fn depth(&self) -> usize {
    match &self.inner.storage {
      Storage::Local => context::current().stack_depth(self.inner.id),
      Storage::Shared(entries) => entries.lock().len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.depth() == 0
  }

  /// A detached binding of `key` to be resolved from this stack at call time.
  pub fn pass(&self, key: impl Into<Key>) -> Pass<Stack> {
    Pass::new(self.clone(), key)
  }
}

fn stack_entry(previous: Option<Active>, pushed: Active, chain: bool) -> Active {
  match previous {
    Some(previous) if chain => Active::Chain(Chain::new([pushed, previous])),
    _ => pushed,
  }
}

impl Injector for Stack {
  fn resolve(&self, key: &Key) -> Result<Value> {
    self.top()?.resolve(key)
  }

  fn define(&self, key: Key, definition: Definition) -> Result<()> {
    self.top()?.define(key, definition)
  }
}

impl fmt::Debug for Stack {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Stack")
      .field("name", &self.inner.name)
      .field("mode", &self.mode())
      .finish()
  }
}

/// Guard returned by [`Stack::scoped`]; pops its entry on drop.
#[must_use = "the container is popped as soon as the guard is dropped"]
pub struct PushGuard {
  stack: Stack,
  active: Active,
}

impl PushGuard {
  /// The pushed entry; definitions made through it land in the pushed
  /// container even when the push was chained.
  pub fn active(&self) -> &Active {
    &self.active
  }
}

impl Deref for PushGuard {
  type Target = Active;

  fn deref(&self) -> &Active {
    &self.active
  }
}

impl Drop for PushGuard {
  fn drop(&mut self) {
    match self.stack.pop() {
      Ok(popped) if popped.ptr_eq(&self.active) => {}
      Ok(popped) => tracing::error!(
        stack = %self.stack.name(),
        expected = ?self.active,
        found = ?popped,
        "push guard popped a different entry than it pushed; the stack was manipulated outside the guard"
      ),
      Err(err) => tracing::error!(%err, "push guard found nothing to pop"),
    }
  }
}

impl fmt::Debug for PushGuard {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PushGuard")
      .field("stack", &self.stack.name())
      .field("active", &self.active)
      .finish()
  }
}
