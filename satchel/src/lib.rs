//! # Satchel
//!
//! A dependency container with pluggable caching scopes, a context-local
//! activation stack and late-binding injection.
//!
//! Setup code registers named producers of values in a [`Container`]. Code
//! that needs those values declares which keys it wants, independently of
//! where the container is built; resolution happens when that code actually
//! runs, against whichever container is active at that moment.
//!
//! ## Core Concepts
//!
//! - **Container**: a mapping of keys to definitions, each a literal value or
//!   a factory plus a [`scope`] deciding when the factory runs again.
//! - **Scopes**: [`scope::NoScope`], [`scope::Singleton`],
//!   [`scope::ThreadLocal`] and [`scope::Context`] (per logical task).
//! - **Chain**: a read-through view over several containers.
//! - **Stack**: a LIFO of active containers. The default one, reachable via
//!   [`global()`], is context-local: threads and tasks never see each
//!   other's entries.
//! - **Binding**: [`Bound`] callables get their unset parameters resolved
//!   from a stack (or any [`Injector`]) on every call.
//!
//! ## Quick Start
//!
//! ```
//! use satchel::{scope, Args, Container, Injector};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! static CONNECTIONS: AtomicUsize = AtomicUsize::new(0);
//!
//! // Declare the injection point before anything is registered.
//! let describe = satchel::bind(|args: Args| -> satchel::Result<String> {
//!   let url = args.get::<String>("url")?;
//!   let conn = args.get::<usize>("conn")?;
//!   Ok(format!("connection #{} to {}", conn, url))
//! })
//! .pass("url")
//! .pass_as("connection", "conn");
//!
//! let container = Container::new();
//! container.put_value("url", String::from("postgres://localhost/app")).unwrap();
//! container
//!   .put_scoped(
//!     "connection",
//!     || CONNECTIONS.fetch_add(1, Ordering::SeqCst),
//!     scope::singleton(),
//!   )
//!   .unwrap();
//!
//! let _guard = satchel::scoped(&container, false);
//! assert_eq!(describe.call(Args::new()).unwrap(), "connection #0 to postgres://localhost/app");
//! assert_eq!(describe.call(Args::new()).unwrap(), "connection #0 to postgres://localhost/app");
//! ```

mod binder;
mod chain;
mod container;
pub mod context;
mod core;
mod error;
mod global;
pub mod hooks;
mod injector;
mod macros;
pub mod scope;
mod stack;

pub use crate::core::{factory, value, Definition, Factory, Key, Value};
pub use binder::{Args, Binding, Bound, Pass};
pub use chain::Chain;
pub use container::Container;
pub use error::{Error, Result};
pub use global::{
  bind, get, get_or, global, pass, pop, push, put, put_factory, put_scoped, put_value, scoped,
};
pub use hooks::Hooks;
pub use injector::Injector;
pub use scope::{Scope, ScopeRef};
pub use stack::{Active, Mode, PushGuard, Stack};
