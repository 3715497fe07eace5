// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Centered moving average over `[i - backward, i + forward]`, clipped to the
/// series at both ends.
///
/// Each output is computed from the raw window rather than a running sum so
/// rounding error does not accumulate along long series.
pub fn simple_moving_average(values: &[f64], backward: usize, forward: usize) -> Vec<f64> {
    let n = values.len();
    let mut averages = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(backward);
        let end = i.saturating_add(forward).saturating_add(1).min(n);
        let window = &values[start..end];
        averages.push(window.iter().sum::<f64>() / window.len() as f64);
    }
    averages
}

/// Mean of every value up to and including `i`.
pub fn cumulative_moving_average(values: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            sum += value;
            sum / (i + 1) as f64
        })
        .collect()
}

/// `avg[0] = v[0]`, `avg[i] = a * v[i] + (1 - a) * avg[i - 1]`.
///
/// The smoothing factor is used as given.
pub fn exponential_moving_average(values: &[f64], smoothing_factor: f64) -> Vec<f64> {
    let mut averages = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;
    for &value in values {
        let next = match previous {
            None => value,
            Some(prev) => smoothing_factor * value + (1.0 - smoothing_factor) * prev,
        };
        averages.push(next);
        previous = Some(next);
    }
    averages
}

#[cfg(test)]
mod tests {
    use super::{cumulative_moving_average, exponential_moving_average, simple_moving_average};

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "length mismatch");
        for (idx, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-12, "index {idx}: {a} != {e}");
        }
    }

    #[test]
    fn simple_average_clips_windows_at_edges() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let averages = simple_moving_average(&values, 1, 1);
        assert_close(&averages, &[1.5, 2.0, 3.0, 4.0, 4.5]);
    }

    #[test]
    fn simple_average_with_zero_windows_is_identity() {
        let values = [3.0, -1.0, 7.5];
        assert_close(&simple_moving_average(&values, 0, 0), &values);
    }

    #[test]
    fn simple_average_backward_only() {
        let values = [2.0, 4.0, 6.0, 8.0];
        assert_close(&simple_moving_average(&values, 2, 0), &[2.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn simple_average_tolerates_huge_windows() {
        let values = [1.0, 3.0];
        assert_close(
            &simple_moving_average(&values, usize::MAX, usize::MAX),
            &[2.0, 2.0],
        );
    }

    #[test]
    fn cumulative_average_is_running_mean() {
        assert_close(
            &cumulative_moving_average(&[2.0, 4.0, 9.0]),
            &[2.0, 3.0, 5.0],
        );
    }

    #[test]
    fn exponential_average_seeds_with_first_value() {
        let averages = exponential_moving_average(&[10.0, 20.0, 20.0], 0.5);
        assert_close(&averages, &[10.0, 15.0, 17.5]);
    }

    #[test]
    fn empty_inputs_produce_empty_outputs() {
        assert!(simple_moving_average(&[], 8, 4).is_empty());
        assert!(cumulative_moving_average(&[]).is_empty());
        assert!(exponential_moving_average(&[], 0.01).is_empty());
    }
}
