// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::PerfError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Two-sided confidence interval around a measured value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Symmetric interval `value ± delta`.
    pub fn around(value: f64, delta: f64) -> Self {
        Self {
            lower: value - delta,
            upper: value + delta,
        }
    }
}

/// One measurement: a test run result at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPoint {
    pub id: u64,
    /// Unix milliseconds.
    pub time: i64,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<ConfidenceInterval>,
    #[serde(default)]
    pub marked_outlier: bool,
}

impl MeasurementPoint {
    pub fn new(id: u64, time: i64, value: f64) -> Self {
        Self {
            id,
            time,
            value,
            interval: None,
            marked_outlier: false,
        }
    }

    pub fn with_interval(mut self, interval: ConfidenceInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_marked_outlier(mut self, marked_outlier: bool) -> Self {
        self.marked_outlier = marked_outlier;
        self
    }
}

/// Time-ordered measurement series.
///
/// Points are kept in non-decreasing time order. Appending never moves an
/// existing point, so an index handed out earlier keeps naming the same point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MeasurementPoint>", into = "Vec<MeasurementPoint>")]
pub struct TimeSeries {
    points: Vec<MeasurementPoint>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from points that are already in time order.
    pub fn from_points(points: Vec<MeasurementPoint>) -> Result<Self, PerfError> {
        let mut series = Self {
            points: Vec::with_capacity(points.len()),
        };
        for point in points {
            series.append(point)?;
        }
        Ok(series)
    }

    /// Sorts by time (stable, so equal timestamps keep their input order)
    /// before building the series.
    pub fn from_unsorted(mut points: Vec<MeasurementPoint>) -> Result<Self, PerfError> {
        points.sort_by_key(|point| point.time);
        Self::from_points(points)
    }

    /// Appends a point and returns its index.
    pub fn append(&mut self, point: MeasurementPoint) -> Result<usize, PerfError> {
        if !point.value.is_finite() {
            return Err(PerfError::invalid_input(format!(
                "point {} has non-finite value {}",
                point.id, point.value
            )));
        }
        if let Some(last) = self.points.last()
            && point.time < last.time
        {
            return Err(PerfError::invalid_input(format!(
                "point {} at time={} precedes the last point {} at time={}",
                point.id, point.time, last.id, last.time
            )));
        }
        self.points.push(point);
        Ok(self.points.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    pub fn find_point_by_index(&self, index: usize) -> Option<&MeasurementPoint> {
        self.points.get(index)
    }

    /// Returns the index and point carrying `id`.
    pub fn find_by_id(&self, id: u64) -> Option<(usize, &MeasurementPoint)> {
        self.points
            .iter()
            .enumerate()
            .find(|(_, point)| point.id == id)
    }

    pub fn first(&self) -> Option<&MeasurementPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&MeasurementPoint> {
        self.points.last()
    }

    /// Points whose index falls in `range`, clipped to the series.
    pub fn slice_by_index(&self, range: Range<usize>) -> &[MeasurementPoint] {
        let end = range.end.min(self.points.len());
        let start = range.start.min(end);
        &self.points[start..end]
    }

    /// Index range of the points with `from <= time <= to`.
    pub fn index_range_for_time(&self, from: i64, to: i64) -> Range<usize> {
        if from > to {
            return 0..0;
        }
        let start = self.points.partition_point(|point| point.time < from);
        let end = self.points.partition_point(|point| point.time <= to);
        start..end
    }

    /// Points with `from <= time <= to`.
    pub fn slice_by_time(&self, from: i64, to: i64) -> &[MeasurementPoint] {
        let range = self.index_range_for_time(from, to);
        &self.points[range]
    }

    /// Copy of the series with outlier-marked points removed.
    pub fn without_outliers(&self) -> TimeSeries {
        Self {
            points: self
                .points
                .iter()
                .filter(|point| !point.marked_outlier)
                .cloned()
                .collect(),
        }
    }
}

impl TryFrom<Vec<MeasurementPoint>> for TimeSeries {
    type Error = PerfError;

    fn try_from(points: Vec<MeasurementPoint>) -> Result<Self, Self::Error> {
        Self::from_points(points)
    }
}

impl From<TimeSeries> for Vec<MeasurementPoint> {
    fn from(series: TimeSeries) -> Self {
        series.points
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfidenceInterval, MeasurementPoint, TimeSeries};

    fn series(times: &[i64]) -> TimeSeries {
        TimeSeries::from_points(
            times
                .iter()
                .enumerate()
                .map(|(idx, &time)| MeasurementPoint::new(idx as u64 + 100, time, idx as f64))
                .collect(),
        )
        .expect("ordered points should build a series")
    }

    #[test]
    fn append_rejects_out_of_order_time() {
        let mut s = series(&[10, 20]);
        let err = s
            .append(MeasurementPoint::new(7, 15, 1.0))
            .expect_err("time going backwards must fail");
        assert!(err.to_string().contains("precedes the last point"));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn append_accepts_equal_timestamps_and_keeps_indices_stable() {
        let mut s = series(&[10, 20]);
        let before = s.find_point_by_index(1).cloned();
        let idx = s
            .append(MeasurementPoint::new(9, 20, 5.0))
            .expect("equal time is allowed");
        assert_eq!(idx, 2);
        assert_eq!(s.find_point_by_index(1).cloned(), before);
    }

    #[test]
    fn append_rejects_non_finite_values() {
        let mut s = TimeSeries::new();
        let err = s
            .append(MeasurementPoint::new(1, 0, f64::NAN))
            .expect_err("NaN must fail");
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn from_unsorted_orders_by_time() {
        let s = TimeSeries::from_unsorted(vec![
            MeasurementPoint::new(1, 30, 1.0),
            MeasurementPoint::new(2, 10, 2.0),
            MeasurementPoint::new(3, 20, 3.0),
        ])
        .expect("sorting should make the points valid");
        let ids: Vec<u64> = s.points().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn time_slicing_is_inclusive_on_both_ends() {
        let s = series(&[10, 20, 30, 40, 50]);
        assert_eq!(s.index_range_for_time(20, 40), 1..4);
        assert_eq!(s.slice_by_time(21, 39).len(), 1);
        assert!(s.slice_by_time(60, 70).is_empty());
        assert!(s.slice_by_time(40, 20).is_empty());
    }

    #[test]
    fn index_slicing_clips_to_bounds() {
        let s = series(&[1, 2, 3]);
        assert_eq!(s.slice_by_index(1..10).len(), 2);
        assert!(s.slice_by_index(5..9).is_empty());
    }

    #[test]
    fn find_by_id_returns_index() {
        let s = series(&[1, 2, 3]);
        let (idx, point) = s.find_by_id(102).expect("id 102 exists");
        assert_eq!(idx, 2);
        assert_eq!(point.time, 3);
        assert!(s.find_by_id(7).is_none());
    }

    #[test]
    fn without_outliers_drops_marked_points() {
        let s = TimeSeries::from_points(vec![
            MeasurementPoint::new(1, 1, 1.0),
            MeasurementPoint::new(2, 2, 90.0).with_marked_outlier(true),
            MeasurementPoint::new(3, 3, 1.5),
        ])
        .expect("valid series");
        let filtered = s.without_outliers();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.values(), vec![1.0, 1.5]);
    }

    #[test]
    fn serde_rejects_unordered_payloads() {
        let raw = r#"[{"id":1,"time":5,"value":1.0},{"id":2,"time":4,"value":2.0}]"#;
        assert!(serde_json::from_str::<TimeSeries>(raw).is_err());

        let ok = r#"[{"id":1,"time":4,"value":1.0,"interval":{"lower":0.5,"upper":1.5},"markedOutlier":true}]"#;
        let s: TimeSeries = serde_json::from_str(ok).expect("ordered payload parses");
        let point = s.first().expect("one point");
        assert!(point.marked_outlier);
        assert_eq!(point.interval, Some(ConfidenceInterval::around(1.0, 0.5)));
    }
}
