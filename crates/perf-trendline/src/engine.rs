// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::kind::TrendLineKind;
use perf_core::{PerfError, TimeSeries};
use perf_stats::{
    SegmentationConfig, cumulative_moving_average, exponential_moving_average,
    segment_by_schwarz_criterion, simple_moving_average, summarize_segments,
};
use tracing::debug;

/// One point of a trend-line overlay.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendPoint {
    pub time: i64,
    pub value: f64,
}

/// Statistics backend that segments a value sequence.
pub trait SegmentationService {
    /// Returns breakpoints `[0, ..., n]`, or `[0]` for an empty input.
    fn segment(&self, values: &[f64], config: &SegmentationConfig) -> Result<Vec<usize>, PerfError>;
}

/// In-process segmentation backed by `perf-stats`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalSegmentation;

impl SegmentationService for LocalSegmentation {
    fn segment(&self, values: &[f64], config: &SegmentationConfig) -> Result<Vec<usize>, PerfError> {
        segment_by_schwarz_criterion(values, config)
    }
}

/// Computes the overlay of `kind` over `series`.
///
/// `Ok(None)` means no trend line is defined: the `None` type, or an empty
/// series. Parameters are used as given; missing or non-finite entries take
/// their declared defaults.
pub fn execute(
    kind: TrendLineKind,
    series: &TimeSeries,
    parameters: &[f64],
    segmentation: &dyn SegmentationService,
) -> Result<Option<Vec<TrendPoint>>, PerfError> {
    if kind == TrendLineKind::None || series.is_empty() {
        return Ok(None);
    }

    let values = series.values();
    let overlay = match kind {
        TrendLineKind::None => return Ok(None),
        TrendLineKind::SimpleMovingAverage => {
            let backward = window_size(kind.parameter_or_default(parameters, 0));
            let forward = window_size(kind.parameter_or_default(parameters, 1));
            let window = backward.saturating_add(forward).saturating_add(1);
            if window > values.len() {
                debug!(
                    window,
                    points = values.len(),
                    "moving-average window exceeds series; empty overlay"
                );
                Vec::new()
            } else {
                with_source_times(series, simple_moving_average(&values, backward, forward))
            }
        }
        TrendLineKind::CumulativeMovingAverage => {
            with_source_times(series, cumulative_moving_average(&values))
        }
        TrendLineKind::ExponentialMovingAverage => {
            let smoothing = kind.parameter_or_default(parameters, 0);
            with_source_times(series, exponential_moving_average(&values, smoothing))
        }
        TrendLineKind::Segmentation => {
            let config = SegmentationConfig::from_parameters(
                kind.parameter_or_default(parameters, 0),
                kind.parameter_or_default(parameters, 1),
            );
            let breakpoints = segmentation.segment(&values, &config)?;
            if breakpoints.len() < 2 {
                return Ok(None);
            }
            segmentation_overlay(series, &values, &breakpoints)?
        }
    };

    debug!(
        kind = kind.label(),
        points = overlay.len(),
        "computed trend line"
    );
    Ok(Some(overlay))
}

fn window_size(raw: f64) -> usize {
    if raw.is_finite() && raw > 0.0 {
        raw.floor().min(usize::MAX as f64) as usize
    } else {
        0
    }
}

fn with_source_times(series: &TimeSeries, averages: Vec<f64>) -> Vec<TrendPoint> {
    series
        .points()
        .iter()
        .zip(averages)
        .map(|(point, value)| TrendPoint {
            time: point.time,
            value,
        })
        .collect()
}

/// Two points per segment, at the first and last source time, both at the
/// segment mean.
fn segmentation_overlay(
    series: &TimeSeries,
    values: &[f64],
    breakpoints: &[usize],
) -> Result<Vec<TrendPoint>, PerfError> {
    let points = series.points();
    let summaries = summarize_segments(values, breakpoints)?;
    let mut overlay = Vec::with_capacity(summaries.len() * 2);
    for segment in summaries {
        overlay.push(TrendPoint {
            time: points[segment.start].time,
            value: segment.mean,
        });
        overlay.push(TrendPoint {
            time: points[segment.end - 1].time,
            value: segment.mean,
        });
    }
    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::{LocalSegmentation, SegmentationService, TrendPoint, execute};
    use crate::kind::TrendLineKind;
    use perf_core::{MeasurementPoint, PerfError, TimeSeries};
    use perf_stats::SegmentationConfig;

    fn series(values: &[f64]) -> TimeSeries {
        let points = values
            .iter()
            .enumerate()
            .map(|(idx, value)| MeasurementPoint::new(idx as u64 + 100, idx as i64 * 1_000, *value))
            .collect();
        TimeSeries::from_points(points).expect("valid series")
    }

    struct FailingSegmentation;

    impl SegmentationService for FailingSegmentation {
        fn segment(&self, _: &[f64], _: &SegmentationConfig) -> Result<Vec<usize>, PerfError> {
            Err(PerfError::remote("SegmentationFailed"))
        }
    }

    #[test]
    fn none_type_has_no_overlay() {
        let overlay = execute(TrendLineKind::None, &series(&[1.0, 2.0]), &[], &LocalSegmentation)
            .expect("none never fails");
        assert_eq!(overlay, None);
    }

    #[test]
    fn empty_series_has_no_overlay_for_every_type() {
        for kind in TrendLineKind::ALL {
            let overlay = execute(
                kind,
                &TimeSeries::new(),
                &kind.default_parameters(),
                &LocalSegmentation,
            )
            .expect("empty input never fails");
            assert_eq!(overlay, None, "{kind:?}");
        }
    }

    #[test]
    fn oversized_window_degrades_to_empty_overlay() {
        let overlay = execute(
            TrendLineKind::SimpleMovingAverage,
            &series(&[1.0, 2.0, 3.0]),
            &[8.0, 4.0],
            &LocalSegmentation,
        )
        .expect("oversized window is not an error");
        assert_eq!(overlay, Some(Vec::new()));
    }

    #[test]
    fn simple_average_reuses_source_times() {
        let overlay = execute(
            TrendLineKind::SimpleMovingAverage,
            &series(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            &[1.0, 1.0],
            &LocalSegmentation,
        )
        .expect("computes")
        .expect("defined");
        assert_eq!(overlay.len(), 5);
        assert_eq!(
            overlay[0],
            TrendPoint {
                time: 0,
                value: 1.5
            }
        );
        assert_eq!(overlay[2].time, 2_000);
        assert_eq!(overlay[2].value, 3.0);
    }

    #[test]
    fn cumulative_and_exponential_cover_every_point() {
        let data = series(&[4.0, 8.0, 6.0]);
        let cumulative = execute(TrendLineKind::CumulativeMovingAverage, &data, &[], &LocalSegmentation)
            .expect("computes")
            .expect("defined");
        assert_eq!(
            cumulative.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![4.0, 6.0, 6.0]
        );

        let exponential = execute(
            TrendLineKind::ExponentialMovingAverage,
            &data,
            &[0.5],
            &LocalSegmentation,
        )
        .expect("computes")
        .expect("defined");
        assert_eq!(
            exponential.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![4.0, 6.0, 6.0]
        );
    }

    #[test]
    fn segmentation_emits_two_points_per_segment() {
        let mut values = vec![1.0; 30];
        values.extend(std::iter::repeat_n(9.0, 30));
        let overlay = execute(
            TrendLineKind::Segmentation,
            &series(&values),
            &[2.5, 500.0],
            &LocalSegmentation,
        )
        .expect("computes")
        .expect("defined");
        assert_eq!(
            overlay,
            vec![
                TrendPoint { time: 0, value: 1.0 },
                TrendPoint { time: 29_000, value: 1.0 },
                TrendPoint { time: 30_000, value: 9.0 },
                TrendPoint { time: 59_000, value: 9.0 },
            ]
        );
    }

    #[test]
    fn segmentation_failures_propagate() {
        let err = execute(
            TrendLineKind::Segmentation,
            &series(&[1.0, 2.0, 3.0]),
            &[],
            &FailingSegmentation,
        )
        .expect_err("service failure must surface");
        assert_eq!(err.code(), "remote_error");
    }
}
