//! Execution contexts: the unit of "logical task" identity.
//!
//! Every OS thread starts out in its own root frame. With the `tokio`
//! feature, [`scope`] and [`spawn`] run a future inside a fresh child frame of
//! the frame that was current when they were called. A runtime task started
//! any other way (plain `tokio::spawn`) gets a root frame of its own, keyed by
//! its task id, so it neither shares the worker thread's frame nor loses its
//! state when it migrates between workers. [`enter`] (or the raw
//! [`push_frame`] / [`pop_frame`] pair) opens a nested frame on the current
//! thread or task, which is what lifecycle hooks use to isolate a request.
//!
//! A child frame reads through to its ancestors and writes only to itself, so
//! siblings never observe each other's state. Everything a frame stores is
//! released when the last handle to the frame is dropped. The root frame of
//! a plain task is dropped as soon as it holds nothing; values a `Context`
//! scope cached in it stay until [`release_task`] is called from the task.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::core::{Key, Value};
use crate::error::{Error, Result};
use crate::stack::Active;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique identifier for frames, scopes and stacks.
pub(crate) fn next_id() -> u64 {
  NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) struct Frame {
  id: u64,
  parent: Option<Arc<Frame>>,
  // (scope id, key) -> cached value of a `Context` scope
  values: DashMap<(u64, Key), Value>,
  // stack id -> entries pushed onto a local stack from this frame
  stacks: DashMap<u64, Vec<Active>>,
}

impl Frame {
  fn new(parent: Option<Arc<Frame>>) -> Self {
    Self {
      id: next_id(),
      parent,
      values: DashMap::new(),
      stacks: DashMap::new(),
    }
  }

  pub(crate) fn id(&self) -> u64 {
    self.id
  }

  fn ancestry(&self) -> impl Iterator<Item = &Frame> {
    std::iter::successors(Some(self), |frame| frame.parent.as_deref())
  }

  pub(crate) fn lookup(&self, scope: u64, key: &Key) -> Option<Value> {
    let slot = (scope, key.clone());
    self
      .ancestry()
      .find_map(|frame| frame.values.get(&slot).map(|value| value.value().clone()))
  }

  pub(crate) fn store(&self, scope: u64, key: &Key, value: Value) {
    self.values.insert((scope, key.clone()), value);
  }

  pub(crate) fn stack_top(&self, stack: u64) -> Option<Active> {
    self.ancestry().find_map(|frame| {
      frame
        .stacks
        .get(&stack)
        .and_then(|entries| entries.last().cloned())
    })
  }

  pub(crate) fn stack_depth(&self, stack: u64) -> usize {
    self
      .ancestry()
      .map(|frame| frame.stacks.get(&stack).map_or(0, |entries| entries.len()))
      .sum()
  }

  pub(crate) fn stack_push(&self, stack: u64, active: Active) {
    self.stacks.entry(stack).or_default().push(active);
  }

  /// Whether the frame holds no cached values and no stack entries.
  fn is_idle(&self) -> bool {
    self.values.is_empty() && self.stacks.is_empty()
  }

  pub(crate) fn stack_pop(&self, stack: u64) -> Option<Active> {
    let popped = self.stacks.get_mut(&stack)?.pop();
    // Drop exhausted sequences so long-lived frames don't accumulate them.
    self.stacks.remove_if(&stack, |_, entries| entries.is_empty());
    popped
  }
}

impl fmt::Debug for Frame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Frame")
      .field("id", &self.id)
      .field("parent", &self.parent.as_ref().map(|parent| parent.id))
      .finish()
  }
}

/// The frame a thread or task runs in, plus the frames entered on top of it.
struct Slot {
  base: Arc<Frame>,
  entered: Mutex<Vec<Arc<Frame>>>,
}

impl Slot {
  fn new(parent: Option<Arc<Frame>>) -> Self {
    Self {
      base: Arc::new(Frame::new(parent)),
      entered: Mutex::new(Vec::new()),
    }
  }

  fn current(&self) -> Arc<Frame> {
    self
      .entered
      .lock()
      .last()
      .cloned()
      .unwrap_or_else(|| self.base.clone())
  }

  fn is_idle(&self) -> bool {
    self.entered.lock().is_empty() && self.base.is_idle()
  }
}

thread_local! {
  static THREAD: Slot = Slot::new(None);
}

#[cfg(feature = "tokio")]
tokio::task_local! {
  static TASK: Slot;
}

// Root slots of runtime tasks that were not started through `scope`/`spawn`.
#[cfg(feature = "tokio")]
static UNSCOPED: once_cell::sync::Lazy<DashMap<tokio::task::Id, Arc<Slot>>> =
  once_cell::sync::Lazy::new(DashMap::new);

#[cfg(feature = "tokio")]
fn unscoped_slot(id: tokio::task::Id, register: bool) -> Option<Arc<Slot>> {
  if let Some(slot) = UNSCOPED.get(&id) {
    return Some(slot.value().clone());
  }
  if !register {
    return None;
  }
  let slot = UNSCOPED
    .entry(id)
    .or_insert_with(|| {
      tracing::trace!(task = %id, "opened root frame for unscoped task");
      Arc::new(Slot::new(None))
    })
    .value()
    .clone();
  Some(slot)
}

/// Runs `f` on the calling thread's or task's slot.
///
/// Without `register`, an unscoped task that never stored anything has no
/// slot yet and `f` is not called; it is then looking at an empty root frame.
fn with_slot<R>(register: bool, f: impl FnOnce(&Slot) -> R) -> Option<R> {
  #[cfg(feature = "tokio")]
  {
    if TASK.try_with(|_| ()).is_ok() {
      return TASK.try_with(f).ok();
    }
    if let Some(id) = tokio::task::try_id() {
      return unscoped_slot(id, register).map(|slot| f(&slot));
    }
  }
  let _ = register;
  THREAD.try_with(f).ok()
}

/// The innermost frame of the calling task or thread, for reading.
///
/// An unscoped task that has not stored anything gets a detached empty
/// frame; anything written to it is lost. Use [`current_mut`] to write.
pub(crate) fn current() -> Arc<Frame> {
  with_slot(false, Slot::current).unwrap_or_else(|| Arc::new(Frame::new(None)))
}

/// The innermost frame of the calling task or thread, registering a root
/// frame for an unscoped task first.
pub(crate) fn current_mut() -> Arc<Frame> {
  // Only without a slot while thread-locals are being torn down.
  with_slot(true, Slot::current).unwrap_or_else(|| Arc::new(Frame::new(None)))
}

/// Drops the root frame of an unscoped task once it holds nothing.
pub(crate) fn release_idle() {
  #[cfg(feature = "tokio")]
  {
    if TASK.try_with(|_| ()).is_ok() {
      return;
    }
    if let Some(id) = tokio::task::try_id() {
      if UNSCOPED.remove_if(&id, |_, slot| slot.is_idle()).is_some() {
        tracing::trace!(task = %id, "released root frame of unscoped task");
      }
    }
  }
}

/// Releases everything the calling task's root frame holds, if the task was
/// started without [`scope`] or [`spawn`]. Such frames cannot be released
/// automatically when the task ends.
///
/// Returns whether a frame was released. Outside an unscoped runtime task
/// this does nothing.
pub fn release_task() -> bool {
  #[cfg(feature = "tokio")]
  {
    if TASK.try_with(|_| ()).is_err() {
      if let Some(id) = tokio::task::try_id() {
        return UNSCOPED.remove(&id).is_some();
      }
    }
  }
  false
}

/// Identifies the calling execution context.
///
/// Two calls return the same id exactly when they run in the same frame.
pub fn current_id() -> u64 {
  current_mut().id()
}

/// Opens a child frame of the current one and makes it current, returning
/// its id. Must be balanced by a [`pop_frame`] from the same thread or task.
pub fn push_frame() -> u64 {
  let frame = Arc::new(Frame::new(Some(current_mut())));
  let id = frame.id();
  with_slot(true, |slot| slot.entered.lock().push(frame));
  tracing::trace!(frame = id, "entered context frame");
  id
}

/// Closes the innermost frame opened with [`push_frame`], releasing every
/// value cached in it.
pub fn pop_frame() -> Result<()> {
  let popped = with_slot(false, |slot| slot.entered.lock().pop()).flatten();
  match popped {
    Some(frame) => {
      tracing::trace!(frame = frame.id(), "left context frame");
      release_idle();
      Ok(())
    }
    None => Err(Error::StackUnderflow {
      stack: String::from("context"),
    }),
  }
}

/// Runs in a fresh child frame until the guard is dropped.
pub fn enter() -> ContextGuard {
  ContextGuard {
    id: push_frame(),
  }
}

/// Guard returned by [`enter`]; closes its frame on drop.
#[derive(Debug)]
#[must_use = "the frame is closed as soon as the guard is dropped"]
pub struct ContextGuard {
  id: u64,
}

impl ContextGuard {
  pub fn id(&self) -> u64 {
    self.id
  }
}

impl Drop for ContextGuard {
  fn drop(&mut self) {
    let innermost = current().id();
    if innermost != self.id {
      tracing::error!(
        expected = self.id,
        found = innermost,
        "context guard dropped out of order"
      );
    }
    if let Err(err) = pop_frame() {
      tracing::error!(%err, "context guard found no frame to close");
    }
  }
}

/// Runs `future` in a fresh child frame of the caller's current frame.
///
/// The parent is captured now, not when the future is first polled.
#[cfg(feature = "tokio")]
pub fn scope<F>(future: F) -> impl std::future::Future<Output = F::Output>
where
  F: std::future::Future,
{
  TASK.scope(Slot::new(Some(current_mut())), future)
}

/// Spawns `future` onto the tokio runtime inside a child frame of the
/// caller's current frame.
#[cfg(feature = "tokio")]
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
  F: std::future::Future + Send + 'static,
  F::Output: Send + 'static,
{
  tokio::spawn(scope(future))
}
