// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Deterministic inputs shared by the benchmarks.

use perf_core::{MeasurementPoint, TimeSeries};

pub fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

/// Piecewise-constant values with `steps` equal-length levels plus bounded
/// noise.
pub fn noisy_steps(n: usize, steps: usize) -> Vec<f64> {
    let mut state = 0xfeed_f00d_dead_beef_u64;
    let segment = (n / steps.max(1)).max(1);
    (0..n)
        .map(|idx| {
            let level = (idx / segment) as f64 * 3.0;
            let noise = (lcg_next(&mut state) >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            level + noise
        })
        .collect()
}

/// One point per value, a minute apart.
pub fn series_from_values(values: &[f64]) -> TimeSeries {
    let points = values
        .iter()
        .enumerate()
        .map(|(idx, value)| MeasurementPoint::new(idx as u64, idx as i64 * 60_000, *value))
        .collect::<Vec<_>>();
    TimeSeries::from_points(points).unwrap_or_default()
}
