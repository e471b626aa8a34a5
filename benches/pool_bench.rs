use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use crossbeam_utils::sync::WaitGroup;
use taskpool::Pool;

const TASKS: usize = 1000;

fn run_batch(pool: &Pool) {
    let wg = WaitGroup::new();
    for i in 0..TASKS {
        let wg = wg.clone();
        pool.submit(move || {
            std::hint::black_box(i * i);
            drop(wg);
        })
        .unwrap();
    }
    wg.wait();
}

fn bounded_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_queue");
    for queue in [1, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(queue), &queue, |b, &queue| {
            let pool = Pool::new(4, queue);
            pool.start().unwrap();
            b.iter(|| run_batch(&pool));
            pool.stop();
        });
    }
    group.finish();
}

fn workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("workers");
    for workers in [0, 1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, &workers| {
                let pool = Pool::new(workers, 0);
                pool.start().unwrap();
                b.iter(|| run_batch(&pool));
                pool.stop();
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bounded_queue, workers);
criterion_main!(benches);
