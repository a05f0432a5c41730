//! Read-through composition of several containers.

use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::core::{Definition, Key, Value};
use crate::error::{Error, Result};
use crate::injector::Injector;
use crate::stack::Active;

/// Groups several containers into a single view, the way a chained map
/// groups mappings.
///
/// Lookups try each member in order and return the first hit. Definitions
/// always go to the first member; the rest are read-only fallbacks from the
/// chain's point of view. A member may itself be a chain.
#[derive(Clone)]
pub struct Chain {
  members: Arc<[Active]>,
}

impl Chain {
  /// Chains `members` in lookup order. With no members, a fresh empty
  /// container is used so the chain still has somewhere to write.
  pub fn new<I>(members: I) -> Self
  where
    I: IntoIterator,
    I::Item: Into<Active>,
  {
    let mut members: Vec<Active> = members.into_iter().map(Into::into).collect();
    if members.is_empty() {
      members.push(Active::Container(Container::new()));
    }
    Self {
      members: members.into(),
    }
  }

  pub fn members(&self) -> &[Active] {
    &self.members
  }

  /// The container that receives every definition made through the chain.
  pub fn primary(&self) -> &Container {
    self.members[0].primary()
  }

  pub fn ptr_eq(&self, other: &Chain) -> bool {
    Arc::ptr_eq(&self.members, &other.members)
  }
}

impl Injector for Chain {
  fn resolve(&self, key: &Key) -> Result<Value> {
    for member in self.members.iter() {
      match member.resolve(key) {
        Err(Error::KeyNotFound(_)) => continue,
        found => return found,
      }
    }
    Err(Error::KeyNotFound(key.clone()))
  }

  fn define(&self, key: Key, definition: Definition) -> Result<()> {
    self.members[0].define(key, definition)
  }
}

impl fmt::Debug for Chain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.members.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_chain_writes_into_a_fresh_container() {
    let chain = Chain::new(Vec::<Container>::new());
    chain.put_value("k", 1_u8).unwrap();
    assert_eq!(chain.members().len(), 1);
    assert!(chain.primary().contains(&Key::from("k")));
  }
}
