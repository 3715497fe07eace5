// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use perf_core::{PerfError, SeriesConfiguration, TimeSeries};
use perf_model::{BuildRequest, ModelStore};
use perf_pane::{ChartPane, ChartPaneState, PaneStateRecord, PaneStatus};
use perf_trendline::{LocalSegmentation, TrendLineKind, TrendPoint, execute};
use serde::Serialize;
use serde_json::Value;

/// Resolves a trend-line type from its numeric id or a case-insensitive
/// name such as `sma` or `segmentation`.
pub fn parse_trend_line_kind(raw: &str) -> Option<TrendLineKind> {
    if let Ok(id) = raw.trim().parse::<u32>() {
        return TrendLineKind::from_id(id);
    }
    let normalized = raw.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
    match normalized.as_str() {
        "none" => Some(TrendLineKind::None),
        "segmentation" => Some(TrendLineKind::Segmentation),
        "sma" | "simplemovingaverage" => Some(TrendLineKind::SimpleMovingAverage),
        "cma" | "cumulativemovingaverage" => Some(TrendLineKind::CumulativeMovingAverage),
        "ema" | "exponentialmovingaverage" => Some(TrendLineKind::ExponentialMovingAverage),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendLineOutput {
    pub type_id: u32,
    pub label: &'static str,
    pub parameters: Vec<f64>,
    /// `None` when no trend line is defined for the input.
    pub points: Option<Vec<TrendPoint>>,
}

/// Runs the trend-line engine in-process. Missing parameters take their
/// defaults.
pub fn compute_trend_line(
    series: &TimeSeries,
    kind: TrendLineKind,
    parameters: &[f64],
) -> Result<TrendLineOutput, PerfError> {
    let expected = kind.parameter_list();
    if parameters.len() > expected.len() {
        return Err(PerfError::invalid_input(format!(
            "{} takes {} parameters; got {}",
            kind.label(),
            expected.len(),
            parameters.len()
        )));
    }
    let parameters: Vec<f64> = (0..expected.len())
        .map(|index| kind.parameter_or_default(parameters, index))
        .collect();
    let points = execute(kind, series, &parameters, &LocalSegmentation)?;
    Ok(TrendLineOutput {
        type_id: kind.id(),
        label: kind.label(),
        parameters,
        points,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequestSummary {
    pub id: u64,
    pub order: i64,
    pub status: &'static str,
    pub status_label: &'static str,
    pub platform: String,
    pub test: String,
    pub test_group_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub waiting_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,
}

impl BuildRequestSummary {
    pub fn new(request: &BuildRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: request.id(),
            order: request.order(),
            status: request.status().as_str(),
            status_label: request.status_label(),
            platform: request.platform().name.clone(),
            test: request.test().full_name(),
            test_group_id: request.test_group_id(),
            created_at: request.created_at(),
            waiting_time: request.waiting_time(now),
            status_url: request.status_url().map(str::to_string),
        }
    }
}

/// Cached requests of a triggerable, by test group then order.
pub fn summarize_build_requests(
    store: &ModelStore,
    triggerable_id: u64,
    now: DateTime<Utc>,
) -> Vec<BuildRequestSummary> {
    let mut requests = store.cached_requests_for_triggerable(triggerable_id);
    requests.sort_by_key(|request| (request.test_group_id(), request.order(), request.id()));
    requests
        .into_iter()
        .map(|request| BuildRequestSummary::new(request, now))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub configuration: SeriesConfiguration,
    pub points: usize,
    pub outliers: usize,
    pub overlay_points: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneSummary {
    pub status: PaneStatus,
    pub title: Option<String>,
    pub trend_line: &'static str,
    pub trend_line_parameters: Vec<f64>,
    pub series: Vec<SeriesSummary>,
    pub deep_link: Option<Value>,
    pub error: Option<String>,
}

pub fn summarize_pane(pane: &ChartPane) -> PaneSummary {
    let trend_line = pane.trend_line();
    let series = SeriesConfiguration::ALL
        .into_iter()
        .filter_map(|configuration| {
            let series = pane.series(configuration)?;
            Some(SeriesSummary {
                configuration,
                points: series.len(),
                outliers: series.points().iter().filter(|point| point.marked_outlier).count(),
                overlay_points: pane.overlay(configuration).map(<[_]>::len),
            })
        })
        .collect();
    PaneSummary {
        status: pane.status(),
        title: pane.title(),
        trend_line: trend_line.kind.label(),
        trend_line_parameters: trend_line.parameters,
        series,
        deep_link: pane.serialize_state().map(|state| state.to_positional()),
        error: pane.last_error().map(ToString::to_string),
    }
}

/// Positional deep link to the versioned record form.
pub fn deep_link_to_record(raw: &str) -> Result<PaneStateRecord, PerfError> {
    let state = ChartPaneState::from_json_str(raw)?;
    Ok(PaneStateRecord::from_state(&state))
}

/// Versioned record back to the positional deep link.
pub fn record_to_deep_link(raw: &str) -> Result<Value, PerfError> {
    let record: PaneStateRecord = serde_json::from_str(raw)
        .map_err(|err| PerfError::invalid_input(format!("invalid pane state record: {err}")))?;
    Ok(record.into_state()?.to_positional())
}
