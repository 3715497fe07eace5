// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::l2::L2Prefix;
use perf_core::PerfError;

pub const DEFAULT_SEGMENT_COUNT_WEIGHT: f64 = 2.5;
pub const DEFAULT_GRID_SIZE: usize = 500;
const DEFAULT_MAX_SEGMENTS: usize = 50;
const DEFAULT_PATIENCE: usize = 3;

/// Configuration for [`segment_by_schwarz_criterion`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationConfig {
    /// Birgé–Massart constant; larger values favour fewer segments.
    pub segment_count_weight: f64,
    /// Points per independently segmented grid. Exact segmentation is
    /// quadratic in the grid length.
    pub grid_size: usize,
    /// Upper bound on segments per grid (also capped by the grid length).
    pub max_segments: usize,
    /// Segment counts explored past the last improving one.
    pub patience: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            segment_count_weight: DEFAULT_SEGMENT_COUNT_WEIGHT,
            grid_size: DEFAULT_GRID_SIZE,
            max_segments: DEFAULT_MAX_SEGMENTS,
            patience: DEFAULT_PATIENCE,
        }
    }
}

impl SegmentationConfig {
    /// Builds a config from raw trend-line parameters.
    ///
    /// A zero or non-finite weight and a grid size below one fall back to the
    /// defaults; other values are used unchanged.
    pub fn from_parameters(segment_count_weight: f64, grid_size: f64) -> Self {
        let segment_count_weight = if segment_count_weight.is_finite() && segment_count_weight != 0.0
        {
            segment_count_weight
        } else {
            DEFAULT_SEGMENT_COUNT_WEIGHT
        };
        let grid = grid_size.floor();
        let grid_size = if grid.is_finite() && grid >= 1.0 {
            grid.min(usize::MAX as f64) as usize
        } else {
            DEFAULT_GRID_SIZE
        };

        Self {
            segment_count_weight,
            grid_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), PerfError> {
        if !self.segment_count_weight.is_finite() {
            return Err(PerfError::invalid_input(format!(
                "segment_count_weight must be finite; got {}",
                self.segment_count_weight
            )));
        }
        if self.grid_size == 0 {
            return Err(PerfError::invalid_input("grid_size must be >= 1"));
        }
        if self.max_segments == 0 {
            return Err(PerfError::invalid_input("max_segments must be >= 1"));
        }
        Ok(())
    }
}

/// One segment of a segmentation with its mean.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentSummary {
    pub start: usize,
    pub end: usize,
    pub mean: f64,
}

/// Splits `values` into piecewise-constant segments.
///
/// Returns breakpoints `[0, b1, ..., n]`: segment `i` covers
/// `[breakpoints[i], breakpoints[i + 1])`. An empty input yields `[0]`.
pub fn segment_by_schwarz_criterion(
    values: &[f64],
    config: &SegmentationConfig,
) -> Result<Vec<usize>, PerfError> {
    config.validate()?;
    if let Some((idx, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PerfError::numerical_issue(format!(
            "segmentation input has non-finite value {value} at index {idx}"
        )));
    }

    let n = values.len();
    let mut breakpoints = vec![0];
    if n == 0 {
        return Ok(breakpoints);
    }

    for (grid_index, grid) in values.chunks(config.grid_size).enumerate() {
        let offset = grid_index * config.grid_size;
        let local = split_until_good_enough(grid, config)?;
        breakpoints.extend(local[1..local.len() - 1].iter().map(|split| offset + split));
    }
    breakpoints.push(n);

    Ok(breakpoints)
}

/// Means of the segments delimited by `breakpoints`.
pub fn summarize_segments(
    values: &[f64],
    breakpoints: &[usize],
) -> Result<Vec<SegmentSummary>, PerfError> {
    if breakpoints.first().copied() != Some(0) {
        return Err(PerfError::invalid_input(
            "breakpoints must start at 0",
        ));
    }
    if breakpoints.last().copied() != Some(values.len()) {
        return Err(PerfError::invalid_input(format!(
            "breakpoints must end at n={}; got {:?}",
            values.len(),
            breakpoints.last()
        )));
    }

    let prefix = L2Prefix::new(values);
    breakpoints
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            if start >= end {
                return Err(PerfError::invalid_input(format!(
                    "breakpoints must be strictly increasing; got {start} then {end}"
                )));
            }
            Ok(SegmentSummary {
                start,
                end,
                mean: prefix.segment_mean(start, end),
            })
        })
        .collect()
}

/// Penalized segment-count search over one grid.
///
/// The objective for `k` segments is the optimal L2 cost per sample plus a
/// Schwarz-criterion weight `ln(n)/n` times the Birgé–Massart penalization
/// `k * (1 + C * ln(n / k))`.
fn split_until_good_enough(
    values: &[f64],
    config: &SegmentationConfig,
) -> Result<Vec<usize>, PerfError> {
    let n = values.len();
    if n < 2 {
        return Ok(vec![0, n]);
    }

    let prefix = L2Prefix::new(values);
    let n_f = n as f64;
    let schwarz_beta = n_f.ln() / n_f;
    let weight = config.segment_count_weight;
    let penalization = |segment_count: usize| {
        let k = segment_count as f64;
        k * (1.0 + weight * (n_f / k).ln())
    };

    let mut sweep = SegmentationSweep::new(&prefix);
    let mut max_k = config.max_segments.min(n);
    let mut best: Option<(f64, usize)> = None;
    let mut k = 1;
    while k < max_k {
        let cost = sweep.next_layer();
        let total = cost / n_f + schwarz_beta * penalization(k);
        if !total.is_finite() {
            return Err(PerfError::numerical_issue(format!(
                "non-finite segmentation objective for k={k}: {total}"
            )));
        }
        match best {
            Some((best_total, _)) if total >= best_total => {
                max_k = max_k.min(k + config.patience);
            }
            _ => best = Some((total, k)),
        }
        k += 1;
    }

    match best {
        Some((_, segment_count)) => sweep.breakpoints(segment_count),
        None => Ok(vec![0, n]),
    }
}

/// Exact optimal partitioning, one segment count at a time.
struct SegmentationSweep<'a> {
    prefix: &'a L2Prefix,
    /// `dp[j]`: optimal cost of `[0, j)` split into the current number of segments.
    dp: Vec<f64>,
    /// `backpointers[k - 1][j]`: start of the last segment when `[0, j)` is
    /// split into `k` segments.
    backpointers: Vec<Vec<usize>>,
}

impl<'a> SegmentationSweep<'a> {
    fn new(prefix: &'a L2Prefix) -> Self {
        Self {
            prefix,
            dp: Vec::new(),
            backpointers: Vec::new(),
        }
    }

    /// Extends the sweep by one segment and returns the optimal total cost
    /// for the whole grid at the new segment count.
    fn next_layer(&mut self) -> f64 {
        let n = self.prefix.len();
        let segment_count = self.backpointers.len() + 1;
        let mut next = vec![f64::INFINITY; n + 1];
        let mut back = vec![usize::MAX; n + 1];

        if segment_count == 1 {
            for end in 1..=n {
                next[end] = self.prefix.segment_cost(0, end);
                back[end] = 0;
            }
        } else {
            for end in segment_count..=n {
                let mut best_objective = f64::INFINITY;
                let mut best_start = usize::MAX;
                for start in (segment_count - 1)..end {
                    let prev = self.dp[start];
                    if !prev.is_finite() {
                        continue;
                    }
                    let objective = prev + self.prefix.segment_cost(start, end);
                    // Strict comparison keeps the leftmost split on ties.
                    if objective < best_objective {
                        best_objective = objective;
                        best_start = start;
                    }
                }
                next[end] = best_objective;
                back[end] = best_start;
            }
        }

        self.dp = next;
        self.backpointers.push(back);
        self.dp[n]
    }

    fn breakpoints(&self, segment_count: usize) -> Result<Vec<usize>, PerfError> {
        if segment_count == 0 || segment_count > self.backpointers.len() {
            return Err(PerfError::invalid_input(format!(
                "invalid segment_count={segment_count} for backtracking; swept {}",
                self.backpointers.len()
            )));
        }

        let n = self.prefix.len();
        let mut splits = Vec::with_capacity(segment_count + 1);
        splits.push(n);
        let mut cursor = n;
        for layer in (1..segment_count).rev() {
            let start = self.backpointers[layer][cursor];
            if start == usize::MAX || start == 0 || start >= cursor {
                return Err(PerfError::invalid_input(format!(
                    "backtracking failed at segment_count={}, endpoint={cursor}",
                    layer + 1
                )));
            }
            splits.push(start);
            cursor = start;
        }
        splits.push(0);
        splits.reverse();
        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_GRID_SIZE, DEFAULT_SEGMENT_COUNT_WEIGHT, SegmentationConfig,
        segment_by_schwarz_criterion, summarize_segments,
    };
    use crate::l2::L2Prefix;

    fn step_series(levels: &[(f64, usize)]) -> Vec<f64> {
        let mut values = Vec::new();
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        for &(level, len) in levels {
            for _ in 0..len {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let noise = ((state % 1000) as f64 / 1000.0 - 0.5) * 0.02;
                values.push(level + noise);
            }
        }
        values
    }

    #[test]
    fn from_parameters_falls_back_on_falsy_values() {
        let config = SegmentationConfig::from_parameters(0.0, f64::NAN);
        assert_eq!(config.segment_count_weight, DEFAULT_SEGMENT_COUNT_WEIGHT);
        assert_eq!(config.grid_size, DEFAULT_GRID_SIZE);

        let config = SegmentationConfig::from_parameters(4.0, 120.7);
        assert_eq!(config.segment_count_weight, 4.0);
        assert_eq!(config.grid_size, 120);
    }

    #[test]
    fn validate_rejects_degenerate_configs() {
        let zero_grid = SegmentationConfig {
            grid_size: 0,
            ..SegmentationConfig::default()
        };
        assert!(zero_grid.validate().is_err());

        let nan_weight = SegmentationConfig {
            segment_count_weight: f64::NAN,
            ..SegmentationConfig::default()
        };
        assert!(nan_weight.validate().is_err());
    }

    #[test]
    fn empty_and_tiny_inputs_have_trivial_segmentations() {
        let config = SegmentationConfig::default();
        assert_eq!(segment_by_schwarz_criterion(&[], &config).unwrap(), vec![0]);
        assert_eq!(
            segment_by_schwarz_criterion(&[3.0], &config).unwrap(),
            vec![0, 1]
        );
        assert_eq!(
            segment_by_schwarz_criterion(&[3.0, 9.0], &config).unwrap(),
            vec![0, 2]
        );
    }

    #[test]
    fn constant_series_stays_one_segment() {
        let values = vec![5.0; 80];
        let breakpoints =
            segment_by_schwarz_criterion(&values, &SegmentationConfig::default()).unwrap();
        assert_eq!(breakpoints, vec![0, 80]);
    }

    #[test]
    fn detects_a_single_level_shift() {
        let values = step_series(&[(1.0, 40), (10.0, 40)]);
        let breakpoints =
            segment_by_schwarz_criterion(&values, &SegmentationConfig::default()).unwrap();
        assert_eq!(breakpoints, vec![0, 40, 80]);
    }

    #[test]
    fn detects_two_level_shifts() {
        let values = step_series(&[(0.0, 30), (5.0, 30), (-3.0, 30)]);
        let breakpoints =
            segment_by_schwarz_criterion(&values, &SegmentationConfig::default()).unwrap();
        assert_eq!(breakpoints, vec![0, 30, 60, 90]);
    }

    #[test]
    fn grids_are_segmented_independently_and_offset() {
        let values = step_series(&[(0.0, 20), (8.0, 30), (8.0, 10)]);
        let config = SegmentationConfig {
            grid_size: 30,
            ..SegmentationConfig::default()
        };
        let breakpoints = segment_by_schwarz_criterion(&values, &config).unwrap();
        assert_eq!(breakpoints.first(), Some(&0));
        assert_eq!(breakpoints.last(), Some(&60));
        assert!(breakpoints.contains(&20));
        assert!(breakpoints.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = segment_by_schwarz_criterion(&[1.0, f64::INFINITY], &SegmentationConfig::default())
            .expect_err("infinite value must fail");
        assert!(err.to_string().contains("non-finite value"));
    }

    #[test]
    fn summaries_report_segment_means() {
        let values = [1.0, 1.0, 4.0, 6.0];
        let summaries = summarize_segments(&values, &[0, 2, 4]).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].mean, 1.0);
        assert_eq!(summaries[1].mean, 5.0);
        assert_eq!((summaries[1].start, summaries[1].end), (2, 4));
    }

    #[test]
    fn summaries_reject_malformed_breakpoints() {
        let values = [1.0, 2.0, 3.0];
        assert!(summarize_segments(&values, &[1, 3]).is_err());
        assert!(summarize_segments(&values, &[0, 2]).is_err());
        assert!(summarize_segments(&values, &[0, 2, 2, 3]).is_err());
    }

    #[test]
    fn sweep_costs_never_increase_with_more_segments() {
        let values = step_series(&[(0.0, 10), (3.0, 7), (1.0, 12)]);
        let prefix = L2Prefix::new(&values);
        let mut sweep = super::SegmentationSweep::new(&prefix);
        let mut previous = f64::INFINITY;
        for k in 1..8 {
            let cost = sweep.next_layer();
            assert!(cost <= previous + 1e-12, "k={k}: {cost} > {previous}");
            previous = cost;
            let breakpoints = sweep.breakpoints(k).unwrap();
            assert_eq!(breakpoints.len(), k + 1);
        }
    }
}
