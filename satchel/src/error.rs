use thiserror::Error;

use crate::core::Key;

/// The error type for every fallible `satchel` operation.
///
/// Errors are always surfaced to the caller of the operation that triggered
/// them. Nothing inside the crate retries, swallows or substitutes a default
/// on failure (the only substitution is the explicit `get_or`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A definition was given both a value and a factory, neither of them, or a
  /// scope alongside a literal value.
  #[error("invalid definition for '{key}': {reason}")]
  InvalidDefinition { key: Key, reason: &'static str },

  /// Nothing is registered under the key, in a container or in any member of
  /// a chain.
  #[error("no dependency registered under '{0}'")]
  KeyNotFound(Key),

  /// A stack-level lookup or definition was attempted while the stack is empty.
  #[error("no containers found on stack '{stack}', push a container first")]
  NoActiveContainer { stack: String },

  /// A pop was attempted on an empty stack (or an empty context frame list).
  #[error("cannot pop from empty stack '{stack}'")]
  StackUnderflow { stack: String },

  /// A pop was attempted from a context whose visible top entry was pushed
  /// by an enclosing context; only that context can pop it.
  #[error("top of stack '{stack}' belongs to an enclosing context and cannot be popped here")]
  InheritedEntry { stack: String },
  /// A resolved value (or explicit argument) is not of the requested type.
  #[error("'{name}' does not hold a value of type {expected}")]
  TypeMismatch { name: String, expected: &'static str },

  /// A bound callable read an argument that was neither passed explicitly
  /// nor bound to a key.
  #[error("missing argument '{0}'")]
  MissingArgument(String),
}

/// A specialized `Result` type for `satchel` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
