//! Caching strategies deciding when a factory runs again.
//!
//! A scope owns the cached values of every definition it is attached to,
//! keyed by the definition's [`Key`] and, for the isolating scopes, by the
//! calling thread or execution context. Scopes do not know which container a
//! definition belongs to: two containers handing the same scope object the
//! same key share one cache slot.

mod context;
mod noscope;
mod singleton;
mod thread;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::core::{Key, Value};

pub use context::Context;
pub use noscope::NoScope;
pub use singleton::Singleton;
pub use thread::ThreadLocal;

/// A shared handle to a scope, as attached to definitions.
pub type ScopeRef = Arc<dyn Scope>;

/// A cache of produced dependencies for the current execution context.
pub trait Scope: Send + Sync + fmt::Debug {
  /// The value cached for `key` in the current context, if any.
  fn cached(&self, key: &Key) -> Option<Value>;

  /// Unconditionally binds `value` to `key` in the current context.
  fn set(&self, key: &Key, value: Value);

  /// Returns the cached value for `key`, or produces one with `factory`,
  /// caches it and returns it.
  ///
  /// The provided implementation is check-then-write without a lock: two
  /// callers missing the same slot at once may both run the factory and the
  /// later `set` wins. Scopes whose slots are reachable from several threads
  /// at once override this.
  fn get(&self, key: &Key, factory: &dyn Fn() -> Value) -> Value {
    if let Some(value) = self.cached(key) {
      tracing::trace!(%key, scope = ?self, "scope hit");
      return value;
    }
    let value = factory();
    self.set(key, value.clone());
    value
  }
}

static NOSCOPE: Lazy<ScopeRef> = Lazy::new(|| Arc::new(NoScope));
static SINGLETON: Lazy<ScopeRef> = Lazy::new(|| Arc::new(Singleton::new()));
static THREADLOCAL: Lazy<ScopeRef> = Lazy::new(|| Arc::new(ThreadLocal::new()));
static CONTEXT: Lazy<ScopeRef> = Lazy::new(|| Arc::new(Context::new()));

/// The process-wide scope that never caches.
pub fn noscope() -> ScopeRef {
  NOSCOPE.clone()
}

/// The process-wide singleton scope.
///
/// Every definition using it shares one cache, whatever container it was
/// registered in. Build a [`Singleton`] directly for an independent cache.
pub fn singleton() -> ScopeRef {
  SINGLETON.clone()
}

/// The process-wide thread-isolated scope.
pub fn threadlocal() -> ScopeRef {
  THREADLOCAL.clone()
}

/// The process-wide context-isolated scope.
pub fn context() -> ScopeRef {
  CONTEXT.clone()
}
