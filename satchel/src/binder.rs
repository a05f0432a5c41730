//! Late-binding injection of dependencies into callables.
//!
//! A [`Bound`] callable records which parameters are supplied from which
//! keys. Nothing is resolved when the binding is made: lookups happen each
//! time the callable is invoked, against whatever its source (typically a
//! [`Stack`](crate::Stack)) holds at that moment, and only for parameters the
//! caller did not pass explicitly.

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::core::{Key, Value};
use crate::error::{Error, Result};
use crate::injector::Injector;

/// Explicit arguments of a call to a [`Bound`] callable, by parameter name.
#[derive(Clone, Default)]
pub struct Args {
  values: HashMap<Cow<'static, str>, Value>,
}

impl Args {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds an explicit argument, builder style.
  pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<Cow<'static, str>>, value: T) -> Self {
    self.insert(name, Arc::new(value));
    self
  }

  pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: Value) {
    self.values.insert(name.into(), value);
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn value(&self, name: &str) -> Option<&Value> {
    self.values.get(name)
  }

  /// The argument `name` downcast to `T`.
  pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let value = self
      .values
      .get(name)
      .ok_or_else(|| Error::MissingArgument(name.to_owned()))?;
    value.clone().downcast::<T>().map_err(|_| Error::TypeMismatch {
      name: name.to_owned(),
      expected: type_name::<T>(),
    })
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl fmt::Debug for Args {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.values.keys()).finish()
  }
}

/// One `key -> parameter` binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
  pub key: Key,
  pub param: Cow<'static, str>,
}

impl Binding {
  /// Binds `key` to the parameter of the same name.
  pub fn new(key: impl Into<Key>) -> Self {
    let key = key.into();
    let param = Cow::Owned(key.as_str().to_owned());
    Self { key, param }
  }

  pub fn with_param(key: impl Into<Key>, param: impl Into<Cow<'static, str>>) -> Self {
    Self {
      key: key.into(),
      param: param.into(),
    }
  }
}

/// A callable whose unset parameters are resolved from `S` on every call.
///
/// Adding bindings never nests wrappers: every [`pass`](Bound::pass) appends
/// to the same list, so a call costs one pass over the bindings however many
/// were made.
#[derive(Clone)]
pub struct Bound<F, S> {
  target: F,
  source: S,
  bindings: Vec<Binding>,
}

impl<F, S: Injector> Bound<F, S> {
  pub fn new(source: S, target: F) -> Self {
    Self {
      target,
      source,
      bindings: Vec::new(),
    }
  }

  /// Binds `key` to the parameter of the same name.
  pub fn pass(self, key: impl Into<Key>) -> Self {
    self.with_binding(Binding::new(key))
  }

  /// Binds `key` to the parameter `param`.
  pub fn pass_as(self, key: impl Into<Key>, param: impl Into<Cow<'static, str>>) -> Self {
    self.with_binding(Binding::with_param(key, param))
  }

  pub fn with_binding(mut self, binding: Binding) -> Self {
    self.bindings.push(binding);
    self
  }

  /// Bindings in the order they were made.
  pub fn bindings(&self) -> &[Binding] {
    &self.bindings
  }

  pub fn target(&self) -> &F {
    &self.target
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  pub fn into_inner(self) -> F {
    self.target
  }

  /// Fills every bound parameter missing from `args` from the source.
  ///
  /// Explicit arguments always win. The first failing lookup aborts the
  /// call; no partial or default substitution happens.
  pub fn prepare(&self, mut args: Args) -> Result<Args> {
    for binding in &self.bindings {
      if args.contains(&binding.param) {
        continue;
      }
      let value = self.source.resolve(&binding.key)?;
      args.insert(binding.param.clone(), value);
    }
    Ok(args)
  }

  /// Resolves missing parameters, then invokes the target.
  pub fn call<R>(&self, args: Args) -> Result<R>
  where
    F: Fn(Args) -> Result<R>,
  {
    let args = self.prepare(args)?;
    (self.target)(args)
  }

  /// Resolves missing parameters now and returns the target's future.
  ///
  /// Lookups happen when `call_async` is called, not when the returned
  /// future is first polled.
  pub fn call_async<R, Fut>(&self, args: Args) -> impl Future<Output = Result<R>>
  where
    F: Fn(Args) -> Fut,
    Fut: Future<Output = Result<R>>,
  {
    let future = self.prepare(args).map(|args| (self.target)(args));
    async move { future?.await }
  }
}

impl<F, S: fmt::Debug> fmt::Debug for Bound<F, S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Bound")
      .field("target", &type_name::<F>())
      .field("source", &self.source)
      .field("bindings", &self.bindings)
      .finish()
  }
}

/// A detached binding, applied to callables like a decorator.
///
/// Wrapping a plain callable starts a [`Bound`]; extending an existing one
/// appends to its bindings, so stacking several `Pass`es on one callable
/// still yields a single wrapper.
#[derive(Clone, Debug)]
pub struct Pass<S> {
  source: S,
  binding: Binding,
}

impl<S: Injector> Pass<S> {
  pub fn new(source: S, key: impl Into<Key>) -> Self {
    Self {
      source,
      binding: Binding::new(key),
    }
  }

  /// Names the parameter the dependency is passed as; defaults to the key.
  pub fn as_(mut self, param: impl Into<Cow<'static, str>>) -> Self {
    self.binding.param = param.into();
    self
  }

  pub fn binding(&self) -> &Binding {
    &self.binding
  }

  pub fn wrap<F>(self, target: F) -> Bound<F, S> {
    Bound::new(self.source, target).with_binding(self.binding)
  }

  /// Adds this binding to `bound`, keeping `bound`'s own source.
  pub fn extend<F, T: Injector>(self, bound: Bound<F, T>) -> Bound<F, T> {
    bound.with_binding(self.binding)
  }
}
