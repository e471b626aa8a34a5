#![deny(missing_docs)]

//! A fixed-size worker thread pool with a bounded task queue.
//!
//! Producers hand zero-argument tasks to a [`Pool`]; a fixed set of worker
//! threads takes them off a FIFO queue and runs them. When the queue is full
//! `submit` blocks the producer instead of dropping work or growing without
//! bound. A pool configured with zero workers runs each task inline on the
//! submitting thread.

mod config;
mod error;
mod pool;

pub use config::{Burden, PoolBuilder, PoolConfig, DEFAULT_THREAD_NAME};
pub use error::{PoolError, Result};
pub use pool::Pool;
