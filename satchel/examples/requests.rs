use satchel::{global, scope, Container, Hooks, Injector};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

static REQUEST_IDS: AtomicUsize = AtomicUsize::new(1);

// Stand-in for a framework's middleware: "before" and "after" arrive as
// separate callbacks.
struct Middleware {
  hooks: Hooks,
  container: Container,
}

impl Middleware {
  fn before_request(&self) {
    self.hooks.enter(&self.container);
  }

  fn after_request(&self) -> satchel::Result<()> {
    self.hooks.exit().map(|_| ())
  }
}

fn handle(path: &str) -> satchel::Result<String> {
  let app = global().get::<String>("app_name")?;
  let first = global().get::<usize>("request_id")?;
  let again = global().get::<usize>("request_id")?;
  assert_eq!(first, again);
  Ok(format!("[{}] request #{} for {}", app, first, path))
}

fn main() -> satchel::Result<()> {
  let app = Container::named("app");
  app.put_value("app_name", String::from("inventory"))?;
  let _app = satchel::scoped(&app, false);

  // Per-request values live in the request's context frame.
  let per_request = Container::named("request");
  per_request.put_scoped(
    "request_id",
    || REQUEST_IDS.fetch_add(1, Ordering::SeqCst),
    Arc::new(scope::Context::new()),
  )?;

  let middleware = Middleware {
    hooks: Hooks::new(global().clone()).chain(true).isolate(true),
    container: per_request,
  };

  for path in ["/items", "/items/7", "/health"] {
    middleware.before_request();
    let response = handle(path);
    middleware.after_request()?;
    println!("{}", response?);
  }

  // The same lifecycle, bracketed by a closure instead.
  let response = middleware.hooks.run(&middleware.container, || handle("/metrics"))?;
  println!("{}", response);

  assert_eq!(global().depth(), 1);
  Ok(())
}
