// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use perf_stats::{
    SegmentationConfig, cumulative_moving_average, exponential_moving_average,
    segment_by_schwarz_criterion, simple_moving_average, summarize_segments,
};
use proptest::prelude::*;

fn values_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1_000.0f64..1_000.0, 0..160)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn averages_preserve_length_and_stay_within_bounds(
        values in values_strategy(),
        backward in 0usize..12,
        forward in 0usize..12,
        smoothing in 0.001f64..0.9,
    ) {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let outputs = [
            simple_moving_average(&values, backward, forward),
            cumulative_moving_average(&values),
            exponential_moving_average(&values, smoothing),
        ];
        for averages in outputs {
            prop_assert_eq!(averages.len(), values.len());
            for avg in averages {
                prop_assert!(avg >= min - 1e-9 && avg <= max + 1e-9);
            }
        }
    }

    #[test]
    fn segmentation_breakpoints_partition_the_series(
        values in values_strategy(),
        grid_size in 1usize..80,
        weight in 0.01f64..10.0,
    ) {
        let config = SegmentationConfig {
            segment_count_weight: weight,
            grid_size,
            ..SegmentationConfig::default()
        };
        let breakpoints = segment_by_schwarz_criterion(&values, &config)
            .expect("finite inputs must segment");

        prop_assert_eq!(breakpoints.first().copied(), Some(0));
        if values.is_empty() {
            prop_assert_eq!(breakpoints.len(), 1);
        } else {
            prop_assert_eq!(breakpoints.last().copied(), Some(values.len()));
            prop_assert!(breakpoints.windows(2).all(|w| w[0] < w[1]));
            let summaries = summarize_segments(&values, &breakpoints)
                .expect("valid breakpoints summarize");
            prop_assert_eq!(summaries.len(), breakpoints.len() - 1);
        }
    }
}
