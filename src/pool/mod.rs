use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, error, info};

use self::queue::Shared;
use self::worker::{help_drain, is_worker_of, run_task, spawn_worker};
use crate::{PoolConfig, PoolError, Result};

mod queue;
mod worker;

/// A fixed-size pool of worker threads fed from a bounded FIFO queue.
///
/// The pool is created stopped. [`Pool::start`] spawns the workers,
/// [`Pool::submit`] hands them work and [`Pool::stop`] joins them again.
/// Every operation takes `&self`, so a pool can be shared between producer
/// threads by reference or through an `Arc`.
///
/// A pool configured with zero workers never spawns a thread: each submitted
/// task runs on the caller's thread before `submit` returns.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use taskpool::Pool;
///
/// let pool = Pool::new(4, 8);
/// pool.start().unwrap();
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..20 {
///     let counter = Arc::clone(&counter);
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
/// }
///
/// pool.drain();
/// pool.stop();
/// assert_eq!(counter.load(Ordering::SeqCst), 20);
/// ```
pub struct Pool {
    config: PoolConfig,
    strategy: Strategy,
}

/// How submitted tasks are executed, fixed at construction.
enum Strategy {
    /// Zero workers: run on the submitting thread.
    Inline(Inline),
    /// Queue tasks for worker threads.
    Pooled(Pooled),
}

struct Inline {
    running: AtomicBool,
    panicked: AtomicUsize,
}

struct Pooled {
    shared: Arc<Shared>,
    workers: Mutex<Workers>,
    /// Signalled when a `stop` finishes joining.
    joined: Condvar,
    #[cfg(test)]
    fail_spawn_at: Option<usize>,
}

struct Workers {
    /// Handles of the workers spawned by the last `start`.
    handles: Vec<JoinHandle<()>>,
    /// Set while a `stop` joins handles it has taken out of `handles`.
    joining: bool,
}

impl Pool {
    /// Creates a stopped pool with `workers` threads and a queue holding at
    /// most `max_queue_size` tasks (zero for unbounded).
    pub fn new(workers: usize, max_queue_size: usize) -> Self {
        Pool::with_config(PoolConfig {
            workers,
            max_queue_size,
            ..PoolConfig::default()
        })
    }

    /// Creates a stopped pool from explicit settings.
    pub fn with_config(config: PoolConfig) -> Self {
        let strategy = if config.workers == 0 {
            Strategy::Inline(Inline {
                running: AtomicBool::new(false),
                panicked: AtomicUsize::new(0),
            })
        } else {
            Strategy::Pooled(Pooled {
                shared: Arc::new(Shared::new(config.max_queue_size)),
                workers: Mutex::new(Workers {
                    handles: Vec::with_capacity(config.workers),
                    joining: false,
                }),
                joined: Condvar::new(),
                #[cfg(test)]
                fail_spawn_at: None,
            })
        };
        Pool { config, strategy }
    }

    /// Starts the pool, spawning every worker.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyRunning`] if the pool is running, or
    /// [`PoolError::Spawn`] if a worker thread cannot be created. In the
    /// latter case the workers spawned so far are stopped and joined first,
    /// so the pool is left stopped and may be started again.
    pub fn start(&self) -> Result<()> {
        match &self.strategy {
            Strategy::Inline(inline) => {
                if inline.running.swap(true, Ordering::SeqCst) {
                    return Err(PoolError::AlreadyRunning);
                }
                info!("Pool started in inline mode");
                Ok(())
            }
            Strategy::Pooled(pooled) => pooled.start(&self.config),
        }
    }

    /// Stops the pool and joins every worker.
    ///
    /// Tasks already executing run to completion. Tasks still queued are
    /// not guaranteed to run; they stay queued and are picked up if the pool
    /// is started again. Stopping a stopped pool does nothing.
    ///
    /// When several threads stop the pool at once, each returns only after
    /// the workers have been joined. A task that stops its own pool returns
    /// without waiting for its own worker.
    pub fn stop(&self) {
        match &self.strategy {
            Strategy::Inline(inline) => {
                if inline.running.swap(false, Ordering::SeqCst) {
                    info!("Pool stopped");
                }
            }
            Strategy::Pooled(pooled) => pooled.stop(),
        }
    }

    /// Submits a task for execution.
    ///
    /// With workers, the task is appended to the queue, blocking while the
    /// queue is full. Without workers, the task runs on the calling thread
    /// before this returns. A task that panics is logged and counted in
    /// [`Pool::panicked`]; the panic does not reach the caller or kill a
    /// worker.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotRunning`] if the pool has workers and is not
    /// running, including when it is stopped while this call waits for
    /// space. The task is dropped without running.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.strategy {
            Strategy::Inline(inline) => {
                if !run_task(task) {
                    error!("Inline task panicked, continuing");
                    inline.panicked.fetch_add(1, Ordering::Relaxed);
                }
                Ok(())
            }
            Strategy::Pooled(pooled) => pooled.shared.push(Box::new(task)),
        }
    }

    /// Returns whether any submitted task is still waiting in the queue.
    ///
    /// This is a snapshot and may be stale by the time it is read. Prefer
    /// [`Pool::drain`] to wait for the queue to empty.
    pub fn has_remaining_work(&self) -> bool {
        self.queued() > 0
    }

    /// Blocks until no task is queued or executing.
    ///
    /// Returns immediately if the pool is not running, since a stopped pool
    /// makes no progress on its queue.
    ///
    /// Called from a task running on this pool, the calling worker runs
    /// queued tasks itself and returns once every other executing task has
    /// finished or is draining as well.
    pub fn drain(&self) {
        if let Strategy::Pooled(pooled) = &self.strategy {
            if is_worker_of(&pooled.shared) {
                help_drain(&pooled.shared);
            } else {
                pooled.shared.wait_idle();
            }
        }
    }

    /// Returns whether the pool has been started and not stopped since.
    pub fn is_running(&self) -> bool {
        match &self.strategy {
            Strategy::Inline(inline) => inline.running.load(Ordering::SeqCst),
            Strategy::Pooled(pooled) => pooled.shared.is_running(),
        }
    }

    /// Number of worker threads spawned by `start`.
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Queue capacity, zero meaning unbounded.
    pub fn max_queue_size(&self) -> usize {
        self.config.max_queue_size
    }

    /// Number of tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        match &self.strategy {
            Strategy::Inline(_) => 0,
            Strategy::Pooled(pooled) => pooled.shared.queued(),
        }
    }

    /// Number of tasks currently executing on workers.
    pub fn active(&self) -> usize {
        match &self.strategy {
            Strategy::Inline(_) => 0,
            Strategy::Pooled(pooled) => pooled.shared.active(),
        }
    }

    /// Number of tasks that panicked since the pool was created.
    pub fn panicked(&self) -> usize {
        match &self.strategy {
            Strategy::Inline(inline) => inline.panicked.load(Ordering::Relaxed),
            Strategy::Pooled(pooled) => pooled.shared.panicked(),
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Pool::with_config(PoolConfig::default())
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Pooled {
    fn start(&self, config: &PoolConfig) -> Result<()> {
        let mut workers = self.lock_workers();
        let generation = self.shared.begin()?;

        for id in 0..config.workers {
            match self.spawn(id, generation, config) {
                Ok(handle) => workers.handles.push(handle),
                Err(source) => {
                    error!("Failed to spawn worker {id}, stopping pool");
                    drop(workers);
                    self.stop();
                    return Err(PoolError::Spawn { worker: id, source });
                }
            }
        }

        info!("Pool started with {} workers", config.workers);
        Ok(())
    }

    fn spawn(
        &self,
        id: usize,
        generation: u64,
        config: &PoolConfig,
    ) -> std::io::Result<JoinHandle<()>> {
        #[cfg(test)]
        if self.fail_spawn_at == Some(id) {
            return Err(std::io::Error::other("injected spawn failure"));
        }
        spawn_worker(id, generation, Arc::clone(&self.shared), config)
    }

    fn lock_workers(&self) -> MutexGuard<'_, Workers> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self) {
        let own_worker = is_worker_of(&self.shared);
        let mut workers = self.lock_workers();
        while workers.joining {
            // The stop in progress may be joining this very thread.
            if own_worker {
                return;
            }
            workers = self
                .joined
                .wait(workers)
                .unwrap_or_else(PoisonError::into_inner);
        }
        self.shared.shut_down();
        if workers.handles.is_empty() {
            return;
        }
        let handles = mem::take(&mut workers.handles);
        workers.joining = true;
        drop(workers);

        let current = thread::current().id();
        for handle in handles {
            // A task may stop its own pool; its worker exits once the task
            // returns and cannot join itself.
            if handle.thread().id() == current {
                debug!("Stop called from worker thread, not joining it");
                continue;
            }
            if handle.join().is_err() {
                error!("Worker thread panicked outside of a task");
            }
        }

        self.lock_workers().joining = false;
        self.joined.notify_all();
        info!("Pool stopped");
    }
}
