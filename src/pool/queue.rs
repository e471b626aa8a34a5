use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::{PoolError, Result};

/// A unit of work accepted by the pool.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// Everything guarded by the pool mutex.
struct State {
    queue: VecDeque<Task>,
    running: bool,
    /// Bumped by every `start`, so workers left over from an earlier run
    /// never pick up work after a restart.
    generation: u64,
    /// Tasks dequeued but not yet finished.
    active: usize,
    /// Executing tasks that are themselves inside `drain`.
    draining: usize,
}

impl State {
    fn is_current(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}

/// State shared between the pool handle and its workers.
pub(crate) struct Shared {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    idle: Condvar,
    max_queue_size: usize,
    panicked: AtomicUsize,
}

impl Shared {
    pub(crate) fn new(max_queue_size: usize) -> Self {
        Shared {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                running: false,
                generation: 0,
                active: 0,
                draining: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            idle: Condvar::new(),
            max_queue_size,
            panicked: AtomicUsize::new(0),
        }
    }

    // Tasks never run under the lock, so a poisoned mutex still guards
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_full(&self, len: usize) -> bool {
        self.max_queue_size > 0 && len >= self.max_queue_size
    }

    /// Marks the pool running and returns the generation new workers
    /// belong to.
    pub(crate) fn begin(&self) -> Result<u64> {
        let mut state = self.lock();
        if state.running {
            return Err(PoolError::AlreadyRunning);
        }
        state.running = true;
        state.generation += 1;
        Ok(state.generation)
    }

    /// Clears the running flag and wakes every waiter.
    pub(crate) fn shut_down(&self) {
        let mut state = self.lock();
        state.running = false;
        self.not_empty.notify_all();
        self.not_full.notify_all();
        self.idle.notify_all();
    }

    /// Appends a task at the tail, blocking while the queue is full.
    pub(crate) fn push(&self, task: Task) -> Result<()> {
        let state = self.lock();
        let mut state = self
            .not_full
            .wait_while(state, |s| s.running && self.is_full(s.queue.len()))
            .unwrap_or_else(PoisonError::into_inner);
        if !state.running {
            return Err(PoolError::NotRunning);
        }
        state.queue.push_back(task);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the head task, blocking while the queue is empty.
    ///
    /// Returns `None` once the worker's generation is no longer running.
    /// Every task returned must be followed by a call to [`Shared::finish`].
    pub(crate) fn take(&self, generation: u64) -> Option<Task> {
        let state = self.lock();
        let mut state = self
            .not_empty
            .wait_while(state, |s| s.is_current(generation) && s.queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        if !state.is_current(generation) {
            return None;
        }
        let task = state.queue.pop_front()?;
        state.active += 1;
        if self.max_queue_size > 0 {
            self.not_full.notify_one();
        }
        Some(task)
    }

    /// Records that a task returned by [`Shared::take`] has completed.
    pub(crate) fn finish(&self, panicked: bool) {
        if panicked {
            self.panicked.fetch_add(1, Ordering::Relaxed);
        }
        let mut state = self.lock();
        state.active -= 1;
        // Draining workers wait for `active` to drop to their own count.
        self.idle.notify_all();
    }

    /// Blocks until nothing is queued or executing, or the pool stops.
    pub(crate) fn wait_idle(&self) {
        let state = self.lock();
        let _state = self
            .idle
            .wait_while(state, |s| {
                s.running && (!s.queue.is_empty() || s.active > 0)
            })
            .unwrap_or_else(PoisonError::into_inner);
    }

    pub(crate) fn enter_drain(&self) {
        self.lock().draining += 1;
        self.idle.notify_all();
    }

    pub(crate) fn leave_drain(&self) {
        self.lock().draining -= 1;
    }

    /// Next task for a draining worker to run itself.
    ///
    /// Returns `None` once the queue is empty and every executing task is
    /// draining, or the pool stops.
    pub(crate) fn take_while_draining(&self) -> Option<Task> {
        let mut state = self.lock();
        loop {
            if !state.running {
                return None;
            }
            if let Some(task) = state.queue.pop_front() {
                state.active += 1;
                if self.max_queue_size > 0 {
                    self.not_full.notify_one();
                }
                return Some(task);
            }
            if state.active <= state.draining {
                return None;
            }
            state = self.idle.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.lock().running
    }

    pub(crate) fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    pub(crate) fn active(&self) -> usize {
        self.lock().active
    }

    pub(crate) fn panicked(&self) -> usize {
        self.panicked.load(Ordering::Relaxed)
    }
}
