use crate::core::{Key, Value};

use super::Scope;

/// Never shares instances; the factory runs on every lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScope;

impl Scope for NoScope {
  fn cached(&self, _key: &Key) -> Option<Value> {
    None
  }

  fn set(&self, _key: &Key, _value: Value) {}

  fn get(&self, _key: &Key, factory: &dyn Fn() -> Value) -> Value {
    factory()
  }
}
