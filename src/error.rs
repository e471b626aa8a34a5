use std::io;
use thiserror::Error;

/// Error type for pool operations.
#[derive(Error, Debug)]
pub enum PoolError {
    /// A worker thread could not be spawned during `start`.
    ///
    /// The pool has already been rolled back to a stopped state when this
    /// is returned.
    #[error("Failed to spawn worker {worker}: {source}")]
    Spawn {
        /// Index of the worker that failed to start.
        worker: usize,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// `start` was called on a pool that is already running.
    #[error("Pool is already running")]
    AlreadyRunning,

    /// A task was submitted to a pooled pool that is not running.
    #[error("Pool is not running")]
    NotRunning,
}

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
