use satchel::{context, global, scope, Container, Injector};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;

static SESSIONS: AtomicUsize = AtomicUsize::new(0);

struct Session {
  id: usize,
}

async fn work(name: &'static str) -> satchel::Result<usize> {
  let session = global().get::<Session>("session")?;
  tokio::time::sleep(Duration::from_millis(10)).await;
  // Same task, same session, even if the task moved to another worker.
  let again = global().get::<Session>("session")?;
  assert!(Arc::ptr_eq(&session, &again));
  println!("{} runs with session #{}", name, session.id);
  Ok(session.id)
}

#[tokio::main]
async fn main() -> satchel::Result<()> {
  let container = Container::new();
  container.put_scoped(
    "session",
    || Session {
      id: SESSIONS.fetch_add(1, Ordering::SeqCst),
    },
    Arc::new(scope::Context::new()),
  )?;

  let handles: Vec<_> = ["alpha", "beta", "gamma"]
    .into_iter()
    .map(|name| {
      let container = container.clone();
      // Each task gets its own frame, and with it its own stack and session.
      context::spawn(async move {
        let _guard = satchel::scoped(&container, false);
        work(name).await
      })
    })
    .collect();

  let mut ids = Vec::new();
  for handle in handles {
    match handle.await {
      Ok(id) => ids.push(id?),
      Err(err) => panic!("task failed: {}", err),
    }
  }

  ids.sort_unstable();
  ids.dedup();
  assert_eq!(ids.len(), 3);

  // Nothing leaked back into the main task.
  assert!(global().is_empty());
  println!("\nEvery task saw its own session.");
  Ok(())
}
