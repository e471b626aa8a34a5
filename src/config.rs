use crate::pool::Pool;

/// Prefix used for worker thread names unless configured otherwise.
pub const DEFAULT_THREAD_NAME: &str = "pool-worker";

/// Preset sizes for common workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Burden {
    /// 16 workers, at most 64 queued tasks.
    #[default]
    Light,
    /// 64 workers, at most 256 queued tasks.
    Default,
    /// 256 workers, at most 768 queued tasks.
    Heavy,
}

impl Burden {
    /// Number of worker threads for this preset.
    pub fn workers(self) -> usize {
        match self {
            Burden::Light => 16,
            Burden::Default => 64,
            Burden::Heavy => 256,
        }
    }

    /// Queue capacity for this preset.
    pub fn max_queue_size(self) -> usize {
        match self {
            Burden::Light => 64,
            Burden::Default => 256,
            Burden::Heavy => 768,
        }
    }
}

/// Construction-time settings of a [`Pool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads spawned by `start`. Zero selects inline
    /// execution on the submitting thread.
    pub workers: usize,
    /// Maximum number of queued tasks. Zero means unbounded.
    pub max_queue_size: usize,
    /// Prefix for worker thread names, suffixed with `-{id}`.
    pub thread_name: String,
    /// Stack size for worker threads, or the platform default.
    pub stack_size: Option<usize>,
}

impl PoolConfig {
    /// Settings taken from a [`Burden`] preset.
    pub fn from_burden(burden: Burden) -> Self {
        PoolConfig {
            workers: burden.workers(),
            max_queue_size: burden.max_queue_size(),
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig::from_burden(Burden::default())
    }
}

/// Builder for a [`Pool`].
///
/// ```
/// use taskpool::PoolBuilder;
///
/// let pool = PoolBuilder::new()
///     .workers(2)
///     .max_queue_size(8)
///     .thread_name("demo")
///     .build();
/// assert_eq!(pool.workers(), 2);
/// assert!(!pool.is_running());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PoolBuilder {
    config: PoolConfig,
}

impl PoolBuilder {
    /// Creates a builder with the light burden defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets worker count and queue capacity to a preset.
    pub fn burden(mut self, burden: Burden) -> Self {
        self.config.workers = burden.workers();
        self.config.max_queue_size = burden.max_queue_size();
        self
    }

    /// Sets the number of worker threads.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Sets the queue capacity; zero means unbounded.
    pub fn max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.config.max_queue_size = max_queue_size;
        self
    }

    /// Sets the worker thread name prefix.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Sets the worker stack size in bytes.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = Some(bytes);
        self
    }

    /// Returns the accumulated settings.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Builds a stopped pool.
    pub fn build(self) -> Pool {
        Pool::with_config(self.config)
    }
}
