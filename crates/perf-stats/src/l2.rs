// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Prefix sums for O(1) squared-error cost of any segment.
#[derive(Clone, Debug, PartialEq)]
pub struct L2Prefix {
    prefix_sum: Vec<f64>,
    prefix_sum_sq: Vec<f64>,
}

impl L2Prefix {
    pub fn new(values: &[f64]) -> Self {
        let mut prefix_sum = Vec::with_capacity(values.len() + 1);
        let mut prefix_sum_sq = Vec::with_capacity(values.len() + 1);
        prefix_sum.push(0.0);
        prefix_sum_sq.push(0.0);

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for &value in values {
            sum += value;
            sum_sq += value * value;
            prefix_sum.push(sum);
            prefix_sum_sq.push(sum_sq);
        }

        Self {
            prefix_sum,
            prefix_sum_sq,
        }
    }

    /// Number of samples covered.
    pub fn len(&self) -> usize {
        self.prefix_sum.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mean over `[start, end)`; `NaN` for an empty segment.
    pub fn segment_mean(&self, start: usize, end: usize) -> f64 {
        debug_assert!(start <= end && end <= self.len());
        let len = end - start;
        if len == 0 {
            return f64::NAN;
        }
        (self.prefix_sum[end] - self.prefix_sum[start]) / len as f64
    }

    /// Sum of squared deviations from the segment mean over `[start, end)`.
    ///
    /// Clamped at zero: cancellation in the prefix sums can leave a tiny
    /// negative residue for near-constant segments.
    pub fn segment_cost(&self, start: usize, end: usize) -> f64 {
        debug_assert!(start <= end && end <= self.len());
        let len = end - start;
        if len == 0 {
            return 0.0;
        }
        let sum = self.prefix_sum[end] - self.prefix_sum[start];
        let sum_sq = self.prefix_sum_sq[end] - self.prefix_sum_sq[start];
        (sum_sq - sum * sum / len as f64).max(0.0)
    }
}
