use satchel::{context, scope, Container, Error, Hooks, Injector, Mode, Stack};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// --- Test Fixtures ---

fn app_container() -> Container {
  let container = Container::new();
  container.put_value("app_name", String::from("demo")).unwrap();
  container
}

// --- Hooks Tests ---

#[test]
fn test_enter_and_exit_bracket_a_lifecycle() {
  // Arrange
  let stack = Stack::new(Mode::Local);
  let hooks = Hooks::new(stack.clone());
  let container = app_container();

  // Act: enter and exit arrive as separate callbacks.
  let entered = hooks.enter(&container);
  let during = stack.get::<String>("app_name").map(|name| (*name).clone());
  let exited = hooks.exit().unwrap();

  // Assert
  assert_eq!(during.unwrap(), "demo");
  assert!(entered.ptr_eq(&exited));
  assert!(stack.is_empty());
}

#[test]
fn test_exit_without_enter_underflows() {
  let hooks = Hooks::new(Stack::new(Mode::Local));
  assert!(matches!(hooks.exit(), Err(Error::StackUnderflow { .. })));
}

#[test]
fn test_isolated_exit_returns_the_entry_even_without_a_frame() {
  // The entry was pushed outside the hooks, so no frame was entered; the
  // popped entry is still handed back.
  let stack = Stack::new(Mode::Local);
  let container = app_container();
  stack.push(&container, false);
  let hooks = Hooks::new(stack.clone()).isolate(true);

  let exited = hooks.exit().unwrap();

  assert!(exited.primary().ptr_eq(&container));
  assert!(stack.is_empty());
}

#[test]
fn test_chained_hooks_fall_back_to_the_application_container() {
  // Arrange
  let stack = Stack::new(Mode::Local);
  let _app = stack.scoped(app_container(), false);
  let hooks = Hooks::new(stack.clone()).chain(true);

  let request = Container::new();
  request.put_value("user", String::from("alice")).unwrap();

  // Act
  let (user, app) = hooks.run(&request, || {
    (
      (*stack.get::<String>("user").unwrap()).clone(),
      (*stack.get::<String>("app_name").unwrap()).clone(),
    )
  });

  // Assert
  assert_eq!(user, "alice");
  assert_eq!(app, "demo");
  assert_eq!(stack.depth(), 1);
}

#[test]
fn test_isolated_lifecycles_get_fresh_context_values() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = calls.clone();
  let container = Container::new();
  container
    .put_scoped(
      "request_id",
      move || counter.fetch_add(1, Ordering::SeqCst),
      Arc::new(scope::Context::new()),
    )
    .unwrap();

  let stack = Stack::new(Mode::Local);
  let hooks = Hooks::new(stack.clone()).isolate(true);
  let lookup = || {
    let a = *stack.get::<usize>("request_id").unwrap();
    let b = *stack.get::<usize>("request_id").unwrap();
    assert_eq!(a, b);
    a
  };

  // Act
  let first = hooks.run(&container, lookup);
  let second = hooks.run(&container, lookup);

  // Assert
  assert_ne!(first, second);
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert!(stack.is_empty());
}

#[test]
fn test_isolated_enter_and_exit_restore_the_frame() {
  let outer = context::current_id();
  let hooks = Hooks::new(Stack::new(Mode::Local)).isolate(true);

  hooks.enter(app_container());
  assert_ne!(context::current_id(), outer);
  hooks.exit().unwrap();

  assert_eq!(context::current_id(), outer);
}

#[test]
fn test_run_exits_when_the_body_panics() {
  let stack = Stack::new(Mode::Local);
  let hooks = Hooks::new(stack.clone()).isolate(true);
  let outer = context::current_id();

  let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    hooks.run(app_container(), || panic!("request failed"))
  }));

  assert!(result.is_err());
  assert!(stack.is_empty());
  assert_eq!(context::current_id(), outer);
}
