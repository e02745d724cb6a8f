use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::Result;
use crate::sync::lock;

use super::{CancelToken, CoalescentTask};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Cancel the running task's token whenever a new task is submitted.
    pub cancel_in_flight: bool,
}

struct Queue<T> {
    pending: VecDeque<T>,
    running: bool,
    shutdown: bool,
}

struct Shared<T> {
    name: String,
    options: ExecutorOptions,
    queue: Mutex<Queue<T>>,
    wake: Condvar,
    idle: Condvar,
    generation: Arc<AtomicU64>,
    submitted: AtomicU64,
}

impl<T: CoalescentTask> Shared<T> {
    fn submit(&self, task: T) -> bool {
        let mut queue = lock(&self.queue);
        if queue.shutdown {
            debug!(executor = %self.name, "Submission after shutdown ignored");
            return false;
        }

        let class = task.class();
        let slot = queue.pending.iter().position(|p| p.class() == class);
        match slot.and_then(|i| queue.pending.remove(i).map(|earlier| (i, earlier))) {
            Some((i, earlier)) => queue.pending.insert(i, earlier.coalesce(task)),
            None => queue.pending.push_back(task),
        }

        self.submitted.fetch_add(1, Ordering::AcqRel);
        if self.options.cancel_in_flight && queue.running {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        self.wake.notify_one();
        true
    }

    /// Block until a task is available. `None` once shut down.
    fn next(&self) -> Option<(T, CancelToken)> {
        let mut queue = lock(&self.queue);
        loop {
            if queue.shutdown {
                queue.running = false;
                self.idle.notify_all();
                return None;
            }
            if let Some(task) = queue.pending.pop_front() {
                queue.running = true;
                let issued = self.generation.load(Ordering::Acquire);
                return Some((task, CancelToken::new(Arc::clone(&self.generation), issued)));
            }
            queue.running = false;
            self.idle.notify_all();
            queue = self.wake.wait(queue).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// One worker thread draining a coalescing queue.
///
/// Tasks submitted before [`start`](Self::start) wait in the queue and are
/// merged like any others.
pub struct CoalescingExecutor<T: CoalescentTask> {
    shared: Arc<Shared<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: CoalescentTask> CoalescingExecutor<T> {
    pub fn new(name: impl Into<String>, options: ExecutorOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                options,
                queue: Mutex::new(Queue {
                    pending: VecDeque::new(),
                    running: false,
                    shutdown: false,
                }),
                wake: Condvar::new(),
                idle: Condvar::new(),
                generation: Arc::new(AtomicU64::new(0)),
                submitted: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the worker thread running `handler` for each task. A second call
    /// is a no-op.
    pub fn start<F>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut(T, &CancelToken) + Send + 'static,
    {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(shared.name.clone())
            .spawn(move || {
                while let Some((task, token)) = shared.next() {
                    let outcome = catch_unwind(AssertUnwindSafe(|| handler(task, &token)));
                    if outcome.is_err() {
                        error!(executor = %shared.name, "Task panicked; worker continues");
                    }
                }
                debug!(executor = %shared.name, "Worker exited");
            })?;
        info!(executor = %self.shared.name, "Executor started");
        *worker = Some(handle);
        Ok(())
    }

    /// Queue `task`, merging it with a pending task of the same class.
    /// Returns `false` after shutdown.
    pub fn submit(&self, task: T) -> bool {
        self.shared.submit(task)
    }

    /// Cloneable handle for submitting from other threads.
    pub fn submitter(&self) -> Submitter<T> {
        Submitter {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of accepted submissions so far, merged or not.
    pub fn submitted_count(&self) -> u64 {
        self.shared.submitted.load(Ordering::Acquire)
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.shared.queue).pending.len()
    }

    pub fn is_shutdown(&self) -> bool {
        lock(&self.shared.queue).shutdown
    }

    /// Wait until nothing is queued or running. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut queue = lock(&self.shared.queue);
        loop {
            if !queue.running && (queue.pending.is_empty() || queue.shutdown) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            queue = self
                .shared
                .idle
                .wait_timeout(queue, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Cancel the running task, drop queued tasks and stop the worker.
    /// Returns the number of discarded tasks. Idempotent.
    pub fn shutdown_now(&self) -> usize {
        let discarded: Vec<T> = {
            let mut queue = lock(&self.shared.queue);
            if queue.shutdown {
                return 0;
            }
            queue.shutdown = true;
            self.shared.generation.fetch_add(1, Ordering::AcqRel);
            self.shared.wake.notify_all();
            queue.pending.drain(..).collect()
        };

        if let Some(handle) = lock(&self.worker).take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        info!(
            executor = %self.shared.name,
            discarded = discarded.len(),
            "Executor shut down"
        );
        discarded.len()
    }
}

impl<T: CoalescentTask> Drop for CoalescingExecutor<T> {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}

/// Submission handle to a [`CoalescingExecutor`].
pub struct Submitter<T: CoalescentTask> {
    shared: Arc<Shared<T>>,
}

impl<T: CoalescentTask> Submitter<T> {
    pub fn submit(&self, task: T) -> bool {
        self.shared.submit(task)
    }
}

impl<T: CoalescentTask> Clone for Submitter<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Job(&'static str, u32);

    impl CoalescentTask for Job {
        type Class = &'static str;

        fn class(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_merge_keeps_queue_slot() {
        let exec = CoalescingExecutor::new("test", ExecutorOptions::default());
        exec.submit(Job("a", 1));
        exec.submit(Job("b", 1));
        exec.submit(Job("a", 2));
        let queue = lock(&exec.shared.queue);
        let order: Vec<_> = queue.pending.iter().collect();
        assert_eq!(order, vec![&Job("a", 2), &Job("b", 1)]);
    }

    #[test]
    fn test_shutdown_discards_and_rejects() {
        let exec = CoalescingExecutor::new("test", ExecutorOptions::default());
        exec.submit(Job("a", 1));
        exec.submit(Job("b", 1));
        assert_eq!(exec.shutdown_now(), 2);
        assert!(!exec.submit(Job("a", 3)));
        assert_eq!(exec.shutdown_now(), 0);
    }
}
