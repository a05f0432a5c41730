use satchel::{scope, Container, Injector};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::thread;

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn tracker() -> RequestTracker {
  RequestTracker {
    id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
  }
}

fn main() -> satchel::Result<()> {
  let container = Container::new();

  // Built once, shared by everyone.
  container.put_scoped("singleton_tracker", tracker, Arc::new(scope::Singleton::new()))?;
  // Built on every lookup.
  container.put_factory("transient_tracker", tracker)?;
  // Built once per thread.
  container.put_scoped("thread_tracker", tracker, Arc::new(scope::ThreadLocal::new()))?;

  println!("--- Resolving Singletons ---");
  let s1 = container.get::<RequestTracker>("singleton_tracker")?;
  let s2 = container.get::<RequestTracker>("singleton_tracker")?;
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2));

  println!("\n--- Resolving Transients ---");
  let t1 = container.get::<RequestTracker>("transient_tracker")?;
  let t2 = container.get::<RequestTracker>("transient_tracker")?;
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert_ne!(t1.id, t2.id);

  println!("\n--- Resolving Per-Thread ---");
  let here = container.get::<RequestTracker>("thread_tracker")?.id;
  let there = thread::scope(|s| {
    s.spawn(|| container.get::<RequestTracker>("thread_tracker").map(|t| t.id))
      .join()
      .expect("worker thread panicked")
  })?;
  println!("Main thread ID: {}, Worker thread ID: {}", here, there);
  assert_eq!(here, container.get::<RequestTracker>("thread_tracker")?.id);
  assert_ne!(here, there);

  println!("\nScopes behave as expected.");
  Ok(())
}
