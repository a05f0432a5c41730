//! Keys, values and definitions: the data the containers are made of.

use std::any::Any;
use std::borrow::{Borrow, Cow};
use std::fmt;
use std::sync::Arc;

use crate::scope::ScopeRef;

/// A type-erased, shareable dependency.
pub type Value = Arc<dyn Any + Send + Sync>;

/// A zero-argument producer of a dependency.
pub type Factory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Wraps a concrete value into a [`Value`].
pub fn value<T: Any + Send + Sync>(value: T) -> Value {
  Arc::new(value)
}

/// Wraps a typed closure into a [`Factory`].
///
/// The closure's result is boxed into an `Arc` on every invocation, so a
/// dependency registered with `factory(|| 42_u32)` resolves as `Arc<u32>`.
pub fn factory<T, F>(factory: F) -> Factory
where
  T: Any + Send + Sync,
  F: Fn() -> T + Send + Sync + 'static,
{
  Arc::new(move || Arc::new(factory()) as Value)
}

/// The name a dependency is registered and looked up under.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
  pub const fn from_static(name: &'static str) -> Self {
    Self(Cow::Borrowed(name))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&'static str> for Key {
  fn from(name: &'static str) -> Self {
    Self(Cow::Borrowed(name))
  }
}

impl From<String> for Key {
  fn from(name: String) -> Self {
    Self(Cow::Owned(name))
  }
}

impl From<&Key> for Key {
  fn from(key: &Key) -> Self {
    key.clone()
  }
}

impl Borrow<str> for Key {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({:?})", self.0)
  }
}

/// A registered producer of a dependency.
///
/// A definition is immutable once built. Registering the same key again
/// replaces the whole definition.
#[derive(Clone)]
pub enum Definition {
  /// A precomputed value, returned as-is on every lookup.
  Value(Value),
  /// A factory whose results are cached according to `scope`.
  Factory { factory: Factory, scope: ScopeRef },
}

impl Definition {
  /// Builds a definition from optional parts, enforcing that exactly one of
  /// `value` and `factory` is present. A factory without a scope is never
  /// cached. On failure the reason is returned for the caller to attach a key.
  pub fn new(
    value: Option<Value>,
    factory: Option<Factory>,
    scope: Option<ScopeRef>,
  ) -> Result<Self, &'static str> {
    match (value, factory) {
      (Some(_), Some(_)) => Err("takes either a value or a factory, not both"),
      (None, None) => Err("missing a value or a factory"),
      (Some(_), None) if scope.is_some() => Err("a scope can only be given with a factory"),
      (Some(value), None) => Ok(Self::Value(value)),
      (None, Some(factory)) => Ok(Self::Factory {
        factory,
        scope: scope.unwrap_or_else(crate::scope::noscope),
      }),
    }
  }

  /// Produces the dependency for `key`, consulting the scope cache first.
  pub(crate) fn produce(&self, key: &Key) -> Value {
    match self {
      Definition::Value(value) => value.clone(),
      Definition::Factory { factory, scope } => scope.get(key, &|| {
        tracing::trace!(%key, ?scope, "invoking factory");
        factory()
      }),
    }
  }
}

impl fmt::Debug for Definition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Definition::Value(_) => f.write_str("Definition::Value"),
      Definition::Factory { scope, .. } => f
        .debug_struct("Definition::Factory")
        .field("scope", scope)
        .finish_non_exhaustive(),
    }
  }
}
