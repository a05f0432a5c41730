use satchel::{context, scope, Container, Error, Injector, Mode, Stack};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;

// --- Test Fixtures ---

fn counting_container(scope: satchel::ScopeRef) -> (Container, Arc<AtomicUsize>) {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = calls.clone();
  let container = Container::new();
  container
    .put_scoped("request_id", move || counter.fetch_add(1, Ordering::SeqCst), scope)
    .unwrap();
  (container, calls)
}

// --- Context Tests ---

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sibling_tasks_are_isolated() {
  // Arrange
  let (container, calls) = counting_container(Arc::new(scope::Context::new()));

  // Act
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let container = container.clone();
      context::spawn(async move {
        let first = *container.get::<usize>("request_id").unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = *container.get::<usize>("request_id").unwrap();
        (first, second)
      })
    })
    .collect();

  let mut seen = Vec::new();
  for handle in handles {
    let (first, second) = handle.await.unwrap();
    // Stable within a task, across await points and worker threads.
    assert_eq!(first, second);
    seen.push(first);
  }

  // Assert
  seen.sort_unstable();
  seen.dedup();
  assert_eq!(seen.len(), 8);
  assert_eq!(calls.load(Ordering::SeqCst), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_child_task_inherits_values_cached_by_its_parent() {
  let (container, calls) = counting_container(Arc::new(scope::Context::new()));

  let outcome = context::scope(async move {
    let parent = *container.get::<usize>("request_id").unwrap();

    let child = context::spawn({
      let container = container.clone();
      async move { *container.get::<usize>("request_id").unwrap() }
    })
    .await
    .unwrap();

    (parent, child)
  })
  .await;

  assert_eq!(outcome.0, outcome.1);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_child_writes_stay_in_the_child() {
  let (container, calls) = counting_container(Arc::new(scope::Context::new()));

  let (child, parent) = context::scope(async move {
    let child = context::spawn({
      let container = container.clone();
      async move { *container.get::<usize>("request_id").unwrap() }
    })
    .await
    .unwrap();

    let parent = *container.get::<usize>("request_id").unwrap();
    (child, parent)
  })
  .await;

  assert_ne!(child, parent);
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_context_values_are_released_with_their_task() {
  static DROPS: AtomicUsize = AtomicUsize::new(0);

  struct Connection;
  impl Drop for Connection {
    fn drop(&mut self) {
      DROPS.fetch_add(1, Ordering::SeqCst);
    }
  }

  let container = Container::new();
  container
    .put_scoped("conn", || Connection, Arc::new(scope::Context::new()))
    .unwrap();

  let task_container = container.clone();
  context::spawn(async move {
    let _conn = task_container.get::<Connection>("conn").unwrap();
  })
  .await
  .unwrap();

  assert_eq!(DROPS.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_local_stack_is_inherited_but_not_shared_back() {
  // Arrange
  let stack = Stack::new(Mode::Local);
  let outer = Container::new();
  outer.put_value("who", String::from("outer")).unwrap();

  let result = context::scope({
    let stack = stack.clone();
    async move {
      let _guard = stack.scoped(&outer, false);

      // Act
      let child = context::spawn({
        let stack = stack.clone();
        async move {
          let inherited = (*stack.get::<String>("who").unwrap()).clone();
          let inner = Container::new();
          inner.put_value("who", String::from("inner")).unwrap();
          let _guard = stack.scoped(&inner, false);
          let own = (*stack.get::<String>("who").unwrap()).clone();
          (inherited, own)
        }
      });
      let (inherited, own) = child.await.unwrap();

      // The child's push never reached the parent.
      let after = (*stack.get::<String>("who").unwrap()).clone();
      (inherited, own, after)
    }
  })
  .await;

  // Assert
  assert_eq!(result.0, "outer");
  assert_eq!(result.1, "inner");
  assert_eq!(result.2, "outer");
  assert!(stack.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_push_without_interference() {
  let stack = Stack::new(Mode::Local);

  let handles: Vec<_> = (0..16_i32)
    .map(|n| {
      let stack = stack.clone();
      context::spawn(async move {
        let container = Container::new();
        container.put_value("n", n).unwrap();
        let _guard = stack.scoped(&container, false);
        tokio::task::yield_now().await;
        *stack.get::<i32>("n").unwrap()
      })
    })
    .collect();

  for (n, handle) in (0..16_i32).zip(handles) {
    assert_eq!(handle.await.unwrap(), n);
  }
}

#[tokio::test]
async fn test_task_without_pushes_has_no_active_container() {
  let stack = Stack::new(Mode::Local);

  let result = context::spawn({
    let stack = stack.clone();
    async move { stack.get::<i32>("k").map(|v| *v) }
  })
  .await
  .unwrap();

  assert!(matches!(result, Err(Error::NoActiveContainer { .. })));
}

#[tokio::test]
async fn test_scoped_task_has_its_own_frame() {
  let outer = context::current_id();
  let inner = context::scope(async { context::current_id() }).await;
  assert_ne!(outer, inner);
}

// --- Plain `tokio::spawn` Tests ---

#[tokio::test(flavor = "current_thread")]
async fn test_plain_spawned_tasks_keep_their_own_stack_entries() {
  // Arrange
  let stack = Stack::new(Mode::Local);
  let a = Container::new();
  a.put_value("who", String::from("a")).unwrap();
  let b = Container::new();
  b.put_value("who", String::from("b")).unwrap();

  let run = |container: Container| {
    let stack = stack.clone();
    tokio::spawn(async move {
      let _guard = stack.scoped(&container, false);
      tokio::task::yield_now().await;
      tokio::task::yield_now().await;
      (*stack.get::<String>("who").unwrap()).clone()
    })
  };

  // Act: both tasks interleave on the same thread.
  let first = run(a);
  let second = run(b);
  let (first, second) = (first.await.unwrap(), second.await.unwrap());

  // Assert
  assert_eq!(first, "a");
  assert_eq!(second, "b");
  assert!(stack.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_plain_spawned_siblings_do_not_share_context_values() {
  let (container, calls) = counting_container(Arc::new(scope::Context::new()));

  let lookup = |container: Container| {
    tokio::spawn(async move {
      let first = *container.get::<usize>("request_id").unwrap();
      tokio::task::yield_now().await;
      let second = *container.get::<usize>("request_id").unwrap();
      assert_eq!(first, second);
      first
    })
  };

  let left = lookup(container.clone());
  let right = lookup(container.clone());
  let (left, right) = (left.await.unwrap(), right.await.unwrap());

  assert_ne!(left, right);
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_plain_spawned_task_keeps_its_frame_across_workers() {
  let stack = Stack::new(Mode::Local);

  let handles: Vec<_> = (0..16_i32)
    .map(|n| {
      let stack = stack.clone();
      tokio::spawn(async move {
        let container = Container::new();
        container.put_value("n", n).unwrap();
        let _guard = stack.scoped(&container, false);
        let id = context::current_id();
        for _ in 0..4 {
          tokio::time::sleep(Duration::from_millis(1)).await;
          assert_eq!(context::current_id(), id);
          assert_eq!(*stack.get::<i32>("n").unwrap(), n);
        }
        stack.depth()
      })
    })
    .collect();

  for handle in handles {
    assert_eq!(handle.await.unwrap(), 1);
  }
}

#[tokio::test(flavor = "current_thread")]
async fn test_plain_task_frame_is_released_once_idle() {
  let (container, calls) = counting_container(Arc::new(scope::Context::new()));
  let stack = Stack::new(Mode::Local);

  let released = tokio::spawn(async move {
    // Balanced pushes leave nothing behind to release.
    {
      let _guard = stack.scoped(&container, false);
    }
    let nothing_held = !context::release_task();

    // Cached context values stay until released explicitly.
    let before = *container.get::<usize>("request_id").unwrap();
    let released = context::release_task();
    let after = *container.get::<usize>("request_id").unwrap();
    (nothing_held, released, before != after)
  })
  .await
  .unwrap();

  assert_eq!(released, (true, true, true));
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}
