// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use perf_bench::{noisy_steps, series_from_values};
use perf_stats::{cumulative_moving_average, exponential_moving_average, simple_moving_average};
use perf_trendline::{LocalSegmentation, TrendLineKind, execute};

const N: usize = 100_000;

fn benchmark_moving_averages(c: &mut Criterion) {
    let values = noisy_steps(N, 10);
    let series = series_from_values(&values);

    let mut group = c.benchmark_group("moving_averages");

    group.bench_function("sma_n1e5_w8_4", |b| {
        b.iter(|| simple_moving_average(black_box(&values), 8, 4))
    });

    group.bench_function("cma_n1e5", |b| {
        b.iter(|| cumulative_moving_average(black_box(&values)))
    });

    group.bench_function("ema_n1e5", |b| {
        b.iter(|| exponential_moving_average(black_box(&values), 0.01))
    });

    group.bench_function("engine_sma_n1e5", |b| {
        b.iter(|| {
            execute(
                TrendLineKind::SimpleMovingAverage,
                black_box(&series),
                &[8.0, 4.0],
                &LocalSegmentation,
            )
            .expect("moving average should succeed")
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_moving_averages);
criterion_main!(benches);
