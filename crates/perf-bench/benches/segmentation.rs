// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use perf_bench::noisy_steps;
use perf_stats::{SegmentationConfig, segment_by_schwarz_criterion};

fn bench_segmentation(c: &mut Criterion, case_id: &str, n: usize, steps: usize, grid_size: usize) {
    let values = noisy_steps(n, steps);
    let config = SegmentationConfig {
        grid_size,
        ..SegmentationConfig::default()
    };
    config.validate().expect("benchmark config should be valid");

    c.bench_function(case_id, |b| {
        b.iter(|| {
            segment_by_schwarz_criterion(black_box(&values), black_box(&config))
                .expect("segmentation should succeed")
        })
    });
}

fn benchmark_segmentation_n500_one_grid(c: &mut Criterion) {
    bench_segmentation(c, "segmentation_n500_one_grid", 500, 5, 500);
}

fn benchmark_segmentation_n5000_grid500(c: &mut Criterion) {
    bench_segmentation(c, "segmentation_n5000_grid500", 5_000, 20, 500);
}

criterion_group!(
    benches,
    benchmark_segmentation_n500_one_grid,
    benchmark_segmentation_n5000_grid500
);
criterion_main!(benches);
