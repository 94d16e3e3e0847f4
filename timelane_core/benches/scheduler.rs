use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use timelane_core::{ConfigPatch, Scheduler, Step, Work};

fn bench_single_shot_throughput(c: &mut Criterion) {
    c.bench_function("submit_and_drain_1000_single_shot", |b| {
        let scheduler = Scheduler::new();
        b.iter(|| {
            let handles: Vec<_> = (0..1000)
                .map(|i: u64| scheduler.submit(Work::new(move || black_box(i * 2))))
                .collect();
            scheduler.run_until_idle();
            assert!(handles.iter().all(|h| h.is_settled()));
        });
    });
}

fn bench_multi_lane_round_robin(c: &mut Criterion) {
    c.bench_function("drain_100_jobs_across_4_lanes", |b| {
        let scheduler = Scheduler::new();
        scheduler
            .configure(
                ConfigPatch::default()
                    .lane("a", 10)
                    .lane("b", 10)
                    .lane("c", 100)
                    .lane("d", 100),
                false,
            )
            .unwrap();
        let lanes = ["a", "b", "c", "d"];
        b.iter(|| {
            let handles: Vec<_> = (0..100)
                .map(|i: usize| scheduler.submit_in(lanes[i % 4], Work::new(move || black_box(i))))
                .collect();
            scheduler.run_until_idle();
            assert!(handles.iter().all(|h| h.is_settled()));
        });
    });
}

fn bench_resumable_steps(c: &mut Criterion) {
    c.bench_function("resumable_job_100_steps", |b| {
        let scheduler = Scheduler::new();
        b.iter(|| {
            let mut left = 100u32;
            let handle = scheduler.submit(Work::resumable(move |_cx| {
                left -= 1;
                if left == 0 {
                    Ok(Step::Done(()))
                } else {
                    Ok(Step::Yield)
                }
            }));
            scheduler.run_until_idle();
            assert!(handle.is_settled());
        });
    });
}

criterion_group!(
    benches,
    bench_single_shot_throughput,
    bench_multi_lane_round_robin,
    bench_resumable_steps
);
criterion_main!(benches);
