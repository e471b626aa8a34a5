use std::process::exit;
use std::thread;

use clap::Parser;
use crossbeam::channel;
use log::{debug, error, info};

use taskpool::{Burden, Pool, PoolConfig, Result};

const DEFAULT_WORKERS: usize = 16;
const DEFAULT_TASKS: usize = 10;
const DEFAULT_MAX_QUEUE: usize = 64;

#[derive(Parser)]
#[command(name = "taskpool-demo", version, about = "Runs a batch of tasks on a worker pool")]
struct Cli {
    /// Number of worker threads; 0 runs every task inline
    #[arg(default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Number of tasks to submit
    #[arg(default_value_t = DEFAULT_TASKS)]
    tasks: usize,

    /// Queue capacity; 0 means unbounded
    #[arg(long, default_value_t = DEFAULT_MAX_QUEUE, value_name = "N")]
    max_queue: usize,

    /// Size preset, overriding the worker count and queue capacity
    #[arg(long, value_enum, value_name = "BURDEN")]
    burden: Option<Burden>,

    /// Log pool internals at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run(cli) {
        error!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.burden {
        Some(burden) => PoolConfig::from_burden(burden),
        None => PoolConfig {
            workers: cli.workers,
            max_queue_size: cli.max_queue,
            ..PoolConfig::default()
        },
    };
    info!(
        "taskpool-demo {}: {} workers, queue capacity {}, {} tasks",
        env!("CARGO_PKG_VERSION"),
        config.workers,
        config.max_queue_size,
        cli.tasks
    );

    let pool = Pool::with_config(config);
    pool.start()?;

    // Each task reports back to this thread instead of sharing a counter.
    let (tx, rx) = channel::unbounded();
    for i in 0..cli.tasks {
        let tx = tx.clone();
        debug!("Submitting task {i}");
        pool.submit(move || {
            let name = thread::current().name().unwrap_or("unnamed").to_owned();
            if tx.send((i, name)).is_err() {
                debug!("Report of task {i} dropped");
            }
        })?;
    }
    drop(tx);

    pool.drain();
    pool.stop();

    let mut completed = 0;
    for (i, name) in rx.iter() {
        println!("[{completed}, {i}] In thread: {name}");
        completed += 1;
    }
    info!("Completed {completed} of {} tasks", cli.tasks);

    Ok(())
}
