use std::cell::Cell;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error};

use super::queue::Shared;
use crate::PoolConfig;

thread_local! {
    /// Address of the `Shared` this thread works for, zero on other threads.
    static OWNER: Cell<usize> = const { Cell::new(0) };
}

fn address(shared: &Shared) -> usize {
    shared as *const Shared as usize
}

/// Returns whether the calling thread is one of `shared`'s workers.
pub(crate) fn is_worker_of(shared: &Shared) -> bool {
    OWNER.with(|owner| owner.get() == address(shared))
}

/// Spawns worker `id` of the given generation.
pub(crate) fn spawn_worker(
    id: usize,
    generation: u64,
    shared: Arc<Shared>,
    config: &PoolConfig,
) -> io::Result<JoinHandle<()>> {
    let mut builder = thread::Builder::new().name(format!("{}-{id}", config.thread_name));
    if let Some(size) = config.stack_size {
        builder = builder.stack_size(size);
    }
    builder.spawn(move || dispatch(id, generation, &shared))
}

/// Worker loop: takes tasks until the pool stops or is restarted.
fn dispatch(id: usize, generation: u64, shared: &Shared) {
    OWNER.with(|owner| owner.set(address(shared)));
    debug!("Worker {id} waiting for tasks");
    while let Some(task) = shared.take(generation) {
        let panicked = !run_task(task);
        if panicked {
            error!("Worker {id} task panicked, continuing");
        }
        shared.finish(panicked);
    }
    debug!("Worker {id}: pool stopped, shutting down");
}

/// Drains on behalf of a task running on one of the pool's workers.
///
/// The worker cannot wait for its own task, so it runs queued tasks itself
/// and returns once every other executing task is finished or draining too.
pub(crate) fn help_drain(shared: &Shared) {
    shared.enter_drain();
    while let Some(task) = shared.take_while_draining() {
        let panicked = !run_task(task);
        if panicked {
            error!("Task run while draining panicked, continuing");
        }
        shared.finish(panicked);
    }
    shared.leave_drain();
}

/// Runs a task to completion, returning `false` if it panicked.
pub(crate) fn run_task(task: impl FnOnce()) -> bool {
    panic::catch_unwind(AssertUnwindSafe(task)).is_ok()
}
