//! Enter/exit hooks for host lifecycles.
//!
//! Request/response middleware and application start/stop callbacks usually
//! see "enter" and "exit" as two separate calls, which rules out a guard
//! living on one call stack. [`Hooks`] packages the raw push/pop pair for
//! that case and optionally gives every lifecycle its own context frame, so
//! values cached by a [`Context`](crate::scope::Context) scope live exactly
//! as long as the request. It makes no assumption about who calls it.

use crate::context;
use crate::error::Result;
use crate::stack::{Active, Stack};

#[derive(Debug, Clone)]
pub struct Hooks {
  stack: Stack,
  chain: bool,
  isolate: bool,
}

impl Hooks {
  pub fn new(stack: Stack) -> Self {
    Self {
      stack,
      chain: false,
      isolate: false,
    }
  }

  /// Chain each entered container over whatever was active before it.
  pub fn chain(mut self, chain: bool) -> Self {
    self.chain = chain;
    self
  }

  /// Open a fresh context frame for each lifecycle.
  pub fn isolate(mut self, isolate: bool) -> Self {
    self.isolate = isolate;
    self
  }

  pub fn stack(&self) -> &Stack {
    &self.stack
  }

  /// Starts a lifecycle with `container` active. Must be balanced by
  /// [`exit`](Hooks::exit) on the same thread or task.
  pub fn enter(&self, container: impl Into<Active>) -> Active {
    if self.isolate {
      context::push_frame();
    }
    self.stack.push(container, self.chain)
  }

  /// Ends the innermost lifecycle, returning the entry that was active.
  ///
  /// The result is the stack pop's. When isolating, a frame that cannot be
  /// closed is logged rather than hiding the popped entry.
  pub fn exit(&self) -> Result<Active> {
    let popped = self.stack.pop();
    if self.isolate {
      if let Err(err) = context::pop_frame() {
        tracing::error!(stack = %self.stack.name(), %err, "lifecycle exit found no context frame to close");
      }
    }
    popped
  }

  /// Runs `f` inside a lifecycle, exiting it on every path out of `f`.
  pub fn run<R>(&self, container: impl Into<Active>, f: impl FnOnce() -> R) -> R {
    let _frame = self.isolate.then(context::enter);
    let _guard = self.stack.scoped(container, self.chain);
    f()
  }
}
