// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use perf_pane::{ChartPaneState, PaneStateRecord};
use serde_json::json;

fn benchmark_pane_state(c: &mut Criterion) {
    let link = json!([12, 345, [1_500_000_000_000.0, 1_500_086_400_000.0], ["noSampling", "showOutliers"], [5, 2.5, 500]]);
    let raw = link.to_string();
    let state = ChartPaneState::from_positional(&link).expect("benchmark link should decode");

    let mut group = c.benchmark_group("pane_state");

    group.bench_function("decode_positional", |b| {
        b.iter(|| ChartPaneState::from_json_str(black_box(&raw)).expect("decodes"))
    });

    group.bench_function("encode_positional", |b| {
        b.iter(|| black_box(&state).to_json_string())
    });

    group.bench_function("record_round_trip", |b| {
        b.iter(|| {
            PaneStateRecord::from_state(black_box(&state))
                .into_state()
                .expect("record should convert back")
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_pane_state);
criterion_main!(benches);
