// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Two-sided 95% Student-t quantiles for 1..=30 degrees of freedom.
const STUDENT_T_975: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

const NORMAL_975: f64 = 1.959_963_984_540_054;

/// 0.975 quantile of Student's t distribution.
///
/// Tabulated up to 30 degrees of freedom, Cornish-Fisher expansion beyond.
pub fn student_t_975(degrees_of_freedom: usize) -> Option<f64> {
    match degrees_of_freedom {
        0 => None,
        1..=30 => Some(STUDENT_T_975[degrees_of_freedom - 1]),
        _ => {
            let df = degrees_of_freedom as f64;
            let z = NORMAL_975;
            let z3 = z * z * z;
            let z5 = z3 * z * z;
            Some(z + (z3 + z) / (4.0 * df) + (5.0 * z5 + 16.0 * z3 + 3.0 * z) / (96.0 * df * df))
        }
    }
}

/// Half-width of the 95% confidence interval of a mean, from the iteration
/// count and the running sum and sum of squares.
///
/// `None` when fewer than two iterations were recorded or the inputs are not
/// finite.
pub fn confidence_interval_delta(iteration_count: usize, sum: f64, square_sum: f64) -> Option<f64> {
    if iteration_count < 2 || !sum.is_finite() || !square_sum.is_finite() {
        return None;
    }
    let n = iteration_count as f64;
    let variance = ((square_sum - sum * sum / n) / (n - 1.0)).max(0.0);
    let t = student_t_975(iteration_count - 1)?;
    let delta = t * (variance / n).sqrt();
    delta.is_finite().then_some(delta)
}
