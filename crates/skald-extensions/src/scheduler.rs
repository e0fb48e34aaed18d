//! Coalescing throttled delayer
//!
//! At most one run of a task is pending and at most one is executing.
//! Triggering while a run is pending replaces its task and deadline;
//! triggering while a run executes queues exactly one follow-up. Every
//! caller's returned future resolves once the run that covers its
//! trigger has finished.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

type Task = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct DelayerState {
    deadline: Option<Instant>,
    task: Option<Task>,
    running: bool,
    driver_active: bool,
    driver: Option<JoinHandle<()>>,
    disposed: bool,
}

struct Shared {
    name: &'static str,
    state: Mutex<DelayerState>,
    wake: Notify,
    /// Number of completed runs; `u64::MAX` once disposed
    completed: watch::Sender<u64>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DelayerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Throttled, coalescing single-slot scheduler
pub struct ThrottledDelayer {
    shared: Arc<Shared>,
}

impl ThrottledDelayer {
    pub fn new(name: &'static str) -> Self {
        let (completed, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                name,
                state: Mutex::new(DelayerState::default()),
                wake: Notify::new(),
                completed,
            }),
        }
    }

    /// Schedule `task` to run after `delay`, coalescing with any pending run.
    ///
    /// Scheduling happens immediately; the returned future only waits for
    /// completion and may be dropped.
    pub fn trigger<F, Fut>(&self, delay: Duration, run: F) -> impl Future<Output = ()> + Send + 'static
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule(delay, run, false)
    }

    /// Like [`trigger`](Self::trigger), but an earlier pending deadline is
    /// kept instead of being pushed back to `now + delay`.
    pub fn trigger_no_later_than<F, Fut>(
        &self,
        delay: Duration,
        run: F,
    ) -> impl Future<Output = ()> + Send + 'static
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule(delay, run, true)
    }

    fn schedule<F, Fut>(
        &self,
        delay: Duration,
        run: F,
        keep_earlier: bool,
    ) -> impl Future<Output = ()> + Send + 'static
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task: Task = Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(run()) });
        let mut completed = self.shared.completed.subscribe();

        let target = {
            let mut state = self.shared.lock();
            if state.disposed {
                None
            } else {
                let done = *self.shared.completed.borrow();
                state.task = Some(task);
                let requested = Instant::now() + delay;
                state.deadline = match state.deadline {
                    Some(pending) if keep_earlier && pending < requested => Some(pending),
                    _ => Some(requested),
                };
                let target = if state.running { done + 2 } else { done + 1 };

                if state.driver_active {
                    self.shared.wake.notify_one();
                } else {
                    state.driver_active = true;
                    state.driver = Some(tokio::spawn(drive(Arc::clone(&self.shared))));
                }
                Some(target)
            }
        };

        async move {
            if let Some(target) = target {
                let _ = completed.wait_for(|runs| *runs >= target).await;
            }
        }
    }

    /// Whether a run is scheduled but not yet started
    pub fn is_scheduled(&self) -> bool {
        self.shared.lock().deadline.is_some()
    }

    /// Drop any pending run, abort the driver and release all waiters
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        state.disposed = true;
        state.deadline = None;
        state.task = None;
        state.running = false;
        state.driver_active = false;
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        self.shared.completed.send_replace(u64::MAX);
        debug!("{} delayer canceled", self.shared.name);
    }
}

impl Drop for ThrottledDelayer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn drive(shared: Arc<Shared>) {
    loop {
        let deadline = {
            let mut state = shared.lock();
            match state.deadline {
                Some(deadline) => deadline,
                None => {
                    state.driver_active = false;
                    return;
                }
            }
        };

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {}
            _ = shared.wake.notified() => continue,
        }

        let task = {
            let mut state = shared.lock();
            match state.deadline {
                Some(current) if current <= Instant::now() => {}
                _ => continue,
            }
            state.deadline = None;
            state.running = true;
            state.task.take()
        };

        if let Some(task) = task {
            debug!("{} delayer running", shared.name);
            task().await;
        }

        {
            let mut state = shared.lock();
            state.running = false;
            shared.completed.send_modify(|runs| *runs += 1);
        }
    }
}
