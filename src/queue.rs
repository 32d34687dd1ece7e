//! Admission-controlled FIFO task queue.
//!
//! Every outbound call goes through a `TaskQueue`. At most `concurrency` tasks run
//! at once, and at most `capacity` tasks may wait in the backlog. With the default
//! concurrency of 1 tasks run strictly one after another in submission order.
//!
//! # Example
//!
//! ```ignore
//! let queue = TaskQueue::new(Some(10), 1);
//!
//! // Both are admitted in this order, the second starts once the first settles.
//! let login = queue.submit(|| async { Ok::<_, SdkError>(login().await?) });
//! let profile = queue.submit(|| async { Ok::<_, SdkError>(fetch_profile().await?) });
//!
//! login.await?;
//! profile.await?;
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{Result, SdkError};

/// Delivers a settled outcome to the submitter.
type Continuation = Box<dyn FnOnce() + Send>;

/// A deferred operation; calling it starts the work and yields its continuation.
type Job = Box<dyn FnOnce() -> BoxFuture<'static, Continuation> + Send>;

/// One pending unit of work in the backlog.
struct QueueTask {
  id: u64,
  job: Job,
}

#[derive(Default)]
struct QueueState {
  backlog: VecDeque<QueueTask>,
  in_flight: usize,
  next_id: u64,
}

/// Bounded, concurrency-limited task queue.
///
/// Cloning is cheap and clones share the same backlog and slots.
#[derive(Clone)]
pub struct TaskQueue {
  state: Arc<Mutex<QueueState>>,
  capacity: Option<usize>,
  concurrency: usize,
}

impl TaskQueue {
  /// Create a queue. `None` capacity means unbounded; a concurrency of 0 is treated as 1.
  pub fn new(capacity: Option<usize>, concurrency: usize) -> Self {
    Self {
      state: Arc::new(Mutex::new(QueueState::default())),
      capacity,
      concurrency: concurrency.max(1),
    }
  }

  pub fn capacity(&self) -> Option<usize> {
    self.capacity
  }

  pub fn concurrency(&self) -> usize {
    self.concurrency
  }

  /// Number of tasks currently executing.
  pub fn in_flight(&self) -> usize {
    self.lock().in_flight
  }

  /// Number of tasks waiting for a slot.
  pub fn backlog_len(&self) -> usize {
    self.lock().backlog.len()
  }

  /// Submit an operation.
  ///
  /// Admission happens before this returns: the task is either rejected with
  /// `SdkError::QueueFull` or appended to the backlog and possibly started. The
  /// returned handle settles with the operation's own outcome.
  pub fn submit<T, F, Fut>(&self, operation: F) -> TaskHandle<T>
  where
    T: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    if tokio::runtime::Handle::try_current().is_err() {
      return TaskHandle::rejected(SdkError::NoRuntime);
    }

    let (tx, rx) = oneshot::channel();
    let job: Job = Box::new(move || {
      async move {
        // A panic while building or polling the operation is a rejection like any other.
        let outcome = match AssertUnwindSafe(async move { operation().await })
          .catch_unwind()
          .await
        {
          Ok(outcome) => outcome,
          Err(panic) => Err(SdkError::OperationPanicked(panic_message(panic))),
        };
        Box::new(move || {
          // The submitter may have dropped its handle.
          let _ = tx.send(outcome);
        }) as Continuation
      }
      .boxed()
    });

    {
      let mut state = self.lock();
      if let Some(capacity) = self.capacity {
        if state.backlog.len() >= capacity {
          warn!(capacity, "Queue limit reached, rejecting task");
          return TaskHandle::rejected(SdkError::QueueFull { capacity });
        }
      }
      let id = state.next_id;
      state.next_id += 1;
      state.backlog.push_back(QueueTask { id, job });
      debug!(task = id, backlog = state.backlog.len(), "Task queued");
    }

    self.dispatch();
    TaskHandle::pending(rx)
  }

  /// Start the backlog head if a slot is free.
  fn dispatch(&self) {
    let task = {
      let mut state = self.lock();
      if state.in_flight >= self.concurrency {
        return;
      }
      let Some(task) = state.backlog.pop_front() else {
        return;
      };
      state.in_flight += 1;
      task
    };

    debug!(task = task.id, "Task admitted");
    let queue = self.clone();
    tokio::spawn(async move {
      let settle = (task.job)().await;
      queue.lock().in_flight -= 1;
      settle();
      debug!(task = task.id, "Task settled");
      queue.dispatch();
    });
  }

  fn lock(&self) -> MutexGuard<'_, QueueState> {
    // Nothing panics while holding the lock, but don't wedge the queue if it ever does.
    self
      .state
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl std::fmt::Debug for TaskQueue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.lock();
    f.debug_struct("TaskQueue")
      .field("capacity", &self.capacity)
      .field("concurrency", &self.concurrency)
      .field("in_flight", &state.in_flight)
      .field("backlog", &state.backlog.len())
      .finish()
  }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
  if let Some(s) = panic.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}

enum HandleState<T> {
  Pending(oneshot::Receiver<Result<T>>),
  Rejected(Option<SdkError>),
}

/// Future resolving to the outcome of a submitted task.
pub struct TaskHandle<T> {
  state: HandleState<T>,
}

impl<T> TaskHandle<T> {
  fn pending(rx: oneshot::Receiver<Result<T>>) -> Self {
    Self {
      state: HandleState::Pending(rx),
    }
  }

  pub(crate) fn rejected(err: SdkError) -> Self {
    Self {
      state: HandleState::Rejected(Some(err)),
    }
  }
}

impl<T> Future for TaskHandle<T> {
  type Output = Result<T>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    match &mut self.get_mut().state {
      HandleState::Pending(rx) => Pin::new(rx).poll(cx).map(|received| match received {
        Ok(outcome) => outcome,
        // The runtime shut down before the task settled.
        Err(_) => Err(SdkError::OperationPanicked(
          "task dropped before settling".to_string(),
        )),
      }),
      HandleState::Rejected(err) => Poll::Ready(Err(
        err
          .take()
          .unwrap_or_else(|| SdkError::OperationPanicked("handle polled after completion".into())),
      )),
    }
  }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = match &self.state {
      HandleState::Pending(_) => "pending",
      HandleState::Rejected(_) => "rejected",
    };
    f.debug_struct("TaskHandle").field("state", &state).finish()
  }
}
