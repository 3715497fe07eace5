// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Measurement-set payloads: rows of positional cells whose meaning is given
//! by the payload's `formatMap`, grouped per run configuration.

use perf_core::wire::{ensure_ok_status, id_from_value, number_from_value};
use perf_core::{ConfidenceInterval, ConfiguredSeries, MeasurementPoint, PerfError, SeriesConfiguration, TimeSeries};
use perf_stats::confidence_interval_delta;
use serde_json::Value;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
struct Columns {
    id: usize,
    mean: usize,
    iteration_count: Option<usize>,
    sum: Option<usize>,
    square_sum: Option<usize>,
    marked_outlier: Option<usize>,
    commit_time: Option<usize>,
    build_time: Option<usize>,
}

impl Columns {
    fn from_format_map(format_map: &[Value]) -> Result<Self, PerfError> {
        let position = |name: &str| format_map.iter().position(|column| column.as_str() == Some(name));
        let required = |name: &str| {
            position(name).ok_or_else(|| {
                PerfError::transport(format!("measurement set formatMap has no '{name}' column"))
            })
        };
        let columns = Self {
            id: required("id")?,
            mean: required("mean")?,
            iteration_count: position("iterationCount"),
            sum: position("sum"),
            square_sum: position("squareSum"),
            marked_outlier: position("markedOutlier"),
            commit_time: position("commitTime"),
            build_time: position("buildTime"),
        };
        if columns.commit_time.is_none() && columns.build_time.is_none() {
            return Err(PerfError::transport(
                "measurement set formatMap has neither 'commitTime' nor 'buildTime'",
            ));
        }
        Ok(columns)
    }
}

/// Decodes a measurement-set payload into one series per configuration,
/// `current` first.
pub fn decode_measurement_set(payload: &Value) -> Result<Vec<ConfiguredSeries>, PerfError> {
    ensure_ok_status(payload)?;
    let format_map = payload
        .get("formatMap")
        .and_then(Value::as_array)
        .ok_or_else(|| PerfError::transport("measurement set has no formatMap"))?;
    let columns = Columns::from_format_map(format_map)?;

    let Some(configurations) = payload.get("configurations").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };
    for name in configurations.keys() {
        if SeriesConfiguration::parse(name).is_none() {
            debug!(configuration = %name, "skipping unknown configuration");
        }
    }

    let mut decoded = Vec::new();
    for configuration in SeriesConfiguration::ALL {
        let Some(rows) = configurations.get(configuration.as_str()) else {
            continue;
        };
        let rows = rows.as_array().ok_or_else(|| {
            PerfError::transport(format!("configuration '{}' is not an array", configuration.as_str()))
        })?;
        let points = rows
            .iter()
            .map(|row| decode_row(row, &columns))
            .collect::<Result<Vec<_>, _>>()?;
        decoded.push(ConfiguredSeries {
            configuration,
            series: TimeSeries::from_unsorted(points)?,
        });
    }
    Ok(decoded)
}

fn decode_row(row: &Value, columns: &Columns) -> Result<MeasurementPoint, PerfError> {
    let cells = row
        .as_array()
        .ok_or_else(|| PerfError::transport(format!("measurement row is not an array: {row}")))?;
    let cell = |index: Option<usize>| index.and_then(|index| cells.get(index));

    let id = cell(Some(columns.id))
        .and_then(id_from_value)
        .ok_or_else(|| PerfError::transport(format!("measurement row has no valid id: {row}")))?;
    let mean = cell(Some(columns.mean))
        .and_then(number_from_value)
        .ok_or_else(|| PerfError::transport(format!("measurement {id} has no valid mean")))?;

    // The commit time wins when known; builds without one fall back to the
    // build time.
    let time = cell(columns.commit_time)
        .and_then(number_from_value)
        .filter(|time| *time > 0.0)
        .or_else(|| cell(columns.build_time).and_then(number_from_value))
        .ok_or_else(|| PerfError::transport(format!("measurement {id} has no time")))?;

    let interval = match (
        cell(columns.iteration_count).and_then(id_from_value),
        cell(columns.sum).and_then(number_from_value),
        cell(columns.square_sum).and_then(number_from_value),
    ) {
        (Some(count), Some(sum), Some(square_sum)) => usize::try_from(count)
            .ok()
            .and_then(|count| confidence_interval_delta(count, sum, square_sum))
            .map(|delta| ConfidenceInterval::around(mean, delta)),
        _ => None,
    };

    let marked_outlier = match cell(columns.marked_outlier) {
        Some(Value::Bool(flag)) => *flag,
        Some(other) => number_from_value(other).is_some_and(|flag| flag != 0.0),
        None => false,
    };

    let mut point = MeasurementPoint::new(id, time.round() as i64, mean).with_marked_outlier(marked_outlier);
    if let Some(interval) = interval {
        point = point.with_interval(interval);
    }
    Ok(point)
}
