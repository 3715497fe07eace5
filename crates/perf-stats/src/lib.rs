// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Numeric kernels behind trend lines: moving averages, exact L2
//! segmentation and measurement confidence intervals.

pub mod confidence;
pub mod l2;
pub mod moving_average;
pub mod segmentation;

pub use confidence::{confidence_interval_delta, student_t_975};
pub use l2::L2Prefix;
pub use moving_average::{
    cumulative_moving_average, exponential_moving_average, simple_moving_average,
};
pub use segmentation::{
    DEFAULT_GRID_SIZE, DEFAULT_SEGMENT_COUNT_WEIGHT, SegmentSummary, SegmentationConfig,
    segment_by_schwarz_criterion, summarize_segments,
};
