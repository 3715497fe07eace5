// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Serializable pane state and its compact positional deep-link form:
//! `[platformId, metricId, selectionOrIndicator?, graphOptions?, trendLine?]`.

use perf_core::PerfError;
use perf_core::wire::{id_from_value, number_from_value};
use perf_trendline::TrendLineKind;
use serde::Serialize;
use serde_json::{Value, json};

/// What the main chart is focused on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PaneFocus {
    /// Time range in Unix milliseconds.
    Selection { from: f64, to: f64 },
    /// Id of the point under a locked indicator.
    Indicator(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphOption {
    NoSampling,
    ShowOutliers,
}

/// Tokens are matched exactly; any other spelling is an unknown token.
const GRAPH_OPTION_TOKENS: [(&str, GraphOption); 2] = [
    ("noSampling", GraphOption::NoSampling),
    ("showOutliers", GraphOption::ShowOutliers),
];

impl GraphOption {
    pub fn token(self) -> &'static str {
        match self {
            Self::NoSampling => "noSampling",
            Self::ShowOutliers => "showOutliers",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        GRAPH_OPTION_TOKENS
            .iter()
            .find(|(candidate, _)| *candidate == token)
            .map(|(_, option)| *option)
    }
}

/// Display options of the main chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOptions {
    pub sampling_enabled: bool,
    pub show_outliers: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            sampling_enabled: true,
            show_outliers: false,
        }
    }
}

impl GraphOptions {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens = Vec::new();
        if !self.sampling_enabled {
            tokens.push(GraphOption::NoSampling.token());
        }
        if self.show_outliers {
            tokens.push(GraphOption::ShowOutliers.token());
        }
        tokens
    }

    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut options = Self::default();
        for token in tokens {
            match GraphOption::parse(token) {
                Some(GraphOption::NoSampling) => options.sampling_enabled = false,
                Some(GraphOption::ShowOutliers) => options.show_outliers = true,
                None => {}
            }
        }
        options
    }
}

/// Chosen trend-line type and its parameter values, one per declared
/// parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendLineSetting {
    pub kind: TrendLineKind,
    pub parameters: Vec<f64>,
}

impl TrendLineSetting {
    pub fn with_defaults(kind: TrendLineKind) -> Self {
        Self {
            kind,
            parameters: kind.default_parameters(),
        }
    }
}

impl Default for TrendLineSetting {
    fn default() -> Self {
        Self::with_defaults(TrendLineKind::default())
    }
}

/// Everything needed to reopen a pane as it was.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPaneState {
    pub platform_id: u64,
    pub metric_id: u64,
    pub focus: Option<PaneFocus>,
    /// `None` leaves the pane's current options untouched on restore.
    pub graph_options: Option<GraphOptions>,
    pub trend_line: Option<TrendLineSetting>,
}

impl ChartPaneState {
    pub fn new(platform_id: u64, metric_id: u64) -> Self {
        Self {
            platform_id,
            metric_id,
            focus: None,
            graph_options: None,
            trend_line: None,
        }
    }

    /// Positional array with trailing empty slots dropped.
    pub fn to_positional(&self) -> Value {
        let mut slots = vec![
            json!(self.platform_id),
            json!(self.metric_id),
            Value::Null,
            Value::Null,
            Value::Null,
        ];
        match self.focus {
            Some(PaneFocus::Selection { from, to }) => slots[2] = json!([from, to]),
            Some(PaneFocus::Indicator(point_id)) => slots[2] = json!(point_id),
            None => {}
        }
        if let Some(options) = self.graph_options
            && !options.is_default()
        {
            slots[3] = json!(options.tokens());
        }
        if let Some(setting) = &self.trend_line {
            let mut encoded = vec![json!(setting.kind.id())];
            encoded.extend(setting.parameters.iter().map(|value| json!(value)));
            slots[4] = Value::Array(encoded);
        }
        while slots.last().is_some_and(Value::is_null) {
            slots.pop();
        }
        Value::Array(slots)
    }

    /// Decodes the positional form.
    ///
    /// Only the platform/metric pair is required. Every later slot tolerates
    /// absence and wrong types: the focus and graph options are then left
    /// unset, an unknown trend-line id selects the default type, and a
    /// non-numeric parameter takes that parameter's default.
    pub fn from_positional(value: &Value) -> Result<Self, PerfError> {
        let slots = value.as_array().ok_or_else(|| {
            PerfError::invalid_input(format!("pane state must be an array; got {value}"))
        })?;
        let platform_id = slots
            .first()
            .and_then(id_from_value)
            .ok_or_else(|| PerfError::invalid_input("pane state is missing a platform id"))?;
        let metric_id = slots
            .get(1)
            .and_then(id_from_value)
            .ok_or_else(|| PerfError::invalid_input("pane state is missing a metric id"))?;

        Ok(Self {
            platform_id,
            metric_id,
            focus: slots.get(2).and_then(decode_focus),
            graph_options: slots.get(3).and_then(decode_graph_options),
            trend_line: Some(decode_trend_line(slots.get(4))),
        })
    }

    pub fn to_json_string(&self) -> String {
        self.to_positional().to_string()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, PerfError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| PerfError::invalid_input(format!("pane state is not JSON: {err}")))?;
        Self::from_positional(&value)
    }
}

fn decode_focus(value: &Value) -> Option<PaneFocus> {
    match value {
        Value::Array(bounds) => {
            let from = bounds.first().and_then(number_from_value)?;
            let to = bounds.get(1).and_then(number_from_value)?;
            Some(PaneFocus::Selection { from, to })
        }
        Value::Number(number) => number.as_u64().map(PaneFocus::Indicator),
        _ => None,
    }
}

fn decode_graph_options(value: &Value) -> Option<GraphOptions> {
    let tokens = value.as_array()?;
    Some(GraphOptions::from_tokens(
        tokens.iter().filter_map(Value::as_str),
    ))
}

fn decode_trend_line(value: Option<&Value>) -> TrendLineSetting {
    let options = value.and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
    let kind = options
        .first()
        .and_then(id_from_value)
        .and_then(|id| u32::try_from(id).ok())
        .and_then(TrendLineKind::from_id)
        .unwrap_or_default();
    let parameters = kind
        .parameter_list()
        .iter()
        .enumerate()
        .map(|(index, parameter)| {
            options
                .get(index + 1)
                .and_then(number_from_value)
                .unwrap_or(parameter.default)
        })
        .collect();
    TrendLineSetting { kind, parameters }
}

#[cfg(test)]
mod tests {
    use super::{ChartPaneState, GraphOption, GraphOptions, PaneFocus, TrendLineSetting};
    use perf_trendline::TrendLineKind;
    use serde_json::json;

    #[test]
    fn bare_pair_round_trips_to_default_trend_line() {
        let state = ChartPaneState::new(12, 34);
        assert_eq!(state.to_positional(), json!([12, 34]));

        let restored = ChartPaneState::from_positional(&state.to_positional()).expect("decodes");
        assert_eq!((restored.platform_id, restored.metric_id), (12, 34));
        assert_eq!(restored.focus, None);
        assert_eq!(restored.graph_options, None);
        assert_eq!(restored.trend_line, Some(TrendLineSetting::default()));
        assert_eq!(
            restored.trend_line.map(|setting| setting.kind),
            Some(TrendLineKind::SimpleMovingAverage)
        );
    }

    #[test]
    fn full_state_encodes_every_slot() {
        let state = ChartPaneState {
            platform_id: 1,
            metric_id: 2,
            focus: Some(PaneFocus::Selection {
                from: 1000.0,
                to: 2000.5,
            }),
            graph_options: Some(GraphOptions {
                sampling_enabled: false,
                show_outliers: true,
            }),
            trend_line: Some(TrendLineSetting {
                kind: TrendLineKind::Segmentation,
                parameters: vec![3.5, 200.0],
            }),
        };
        let encoded = state.to_positional();
        assert_eq!(
            encoded,
            json!([1, 2, [1000.0, 2000.5], ["noSampling", "showOutliers"], [5, 3.5, 200.0]])
        );
        assert_eq!(ChartPaneState::from_positional(&encoded).expect("decodes"), state);
    }

    #[test]
    fn indicator_and_middle_gaps_are_preserved() {
        let mut state = ChartPaneState::new(1, 2);
        state.trend_line = Some(TrendLineSetting::with_defaults(TrendLineKind::None));
        assert_eq!(state.to_positional(), json!([1, 2, null, null, [0]]));

        state.focus = Some(PaneFocus::Indicator(77));
        assert_eq!(state.to_positional(), json!([1, 2, 77, null, [0]]));
    }

    #[test]
    fn graph_option_tokens_are_case_sensitive() {
        let state = ChartPaneState::from_positional(&json!([1, 2, null, ["noSampling", "showOutliers"]]))
            .expect("decodes");
        assert_eq!(
            state.graph_options,
            Some(GraphOptions {
                sampling_enabled: false,
                show_outliers: true
            })
        );

        let state = ChartPaneState::from_positional(&json!([1, 2, null, ["nosampling", "showoutliers"]]))
            .expect("decodes");
        assert_eq!(state.graph_options, Some(GraphOptions::default()));
        assert_eq!(GraphOption::parse("ShowOutliers"), None);

        let state = ChartPaneState::from_positional(&json!([1, 2, null, ["NOSAMPLING", 5]]))
            .expect("decodes");
        assert_eq!(state.graph_options, Some(GraphOptions::default()));
    }

    #[test]
    fn malformed_slots_fall_back_to_defaults() {
        let state = ChartPaneState::from_positional(&json!([
            "1",
            2,
            "not a focus",
            {"not": "a set"},
            [42, "x"]
        ]))
        .expect("pair is enough");
        assert_eq!(state.platform_id, 1);
        assert_eq!(state.focus, None);
        assert_eq!(state.graph_options, None);
        assert_eq!(state.trend_line, Some(TrendLineSetting::default()));

        let state = ChartPaneState::from_positional(&json!([1, 2, [5, "nope"], null, ["1", "3", null]]))
            .expect("decodes");
        assert_eq!(state.focus, None);
        assert_eq!(
            state.trend_line,
            Some(TrendLineSetting {
                kind: TrendLineKind::SimpleMovingAverage,
                parameters: vec![3.0, 4.0],
            })
        );
    }

    #[test]
    fn missing_pair_is_an_error() {
        assert!(ChartPaneState::from_positional(&json!([])).is_err());
        assert!(ChartPaneState::from_positional(&json!([1])).is_err());
        assert!(ChartPaneState::from_positional(&json!({"platform": 1})).is_err());
        assert!(ChartPaneState::from_json_str("[1, 2").is_err());
    }

    #[test]
    fn json_string_form_round_trips() {
        let mut state = ChartPaneState::new(3, 4);
        state.focus = Some(PaneFocus::Indicator(9));
        let raw = state.to_json_string();
        assert_eq!(raw, "[3,4,9]");
        let restored = ChartPaneState::from_json_str(&raw).expect("decodes");
        assert_eq!(restored.focus, Some(PaneFocus::Indicator(9)));
    }
}
