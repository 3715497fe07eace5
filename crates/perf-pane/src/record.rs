// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::state::{ChartPaneState, GraphOptions, PaneFocus, TrendLineSetting};
use perf_core::PerfError;
use perf_trendline::TrendLineKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;
/// Newest additive version readers accept.
pub const MAX_FORWARD_COMPAT_SCHEMA_VERSION: u32 = 2;

pub type UnknownFields = Map<String, Value>;

pub fn validate_schema_version(schema_version: u32, artifact: &str) -> Result<(), PerfError> {
    if (CURRENT_SCHEMA_VERSION..=MAX_FORWARD_COMPAT_SCHEMA_VERSION).contains(&schema_version) {
        return Ok(());
    }
    Err(PerfError::invalid_input(format!(
        "{artifact} schema_version={schema_version} is unsupported; supported versions are {CURRENT_SCHEMA_VERSION}..={MAX_FORWARD_COMPAT_SCHEMA_VERSION}"
    )))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendLineRecord {
    pub type_id: u32,
    #[serde(default)]
    pub parameters: Vec<f64>,
}

/// Tagged, versioned form of [`ChartPaneState`] for storage. Fields written by
/// newer versions are carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaneStateRecord {
    pub schema_version: u32,
    pub platform_id: u64,
    pub metric_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_line: Option<TrendLineRecord>,
    #[serde(default, flatten)]
    pub unknown_fields: UnknownFields,
}

impl PaneStateRecord {
    pub fn from_state(state: &ChartPaneState) -> Self {
        Self::from_state_with_unknown(state, CURRENT_SCHEMA_VERSION, UnknownFields::new())
    }

    pub fn from_state_with_unknown(
        state: &ChartPaneState,
        schema_version: u32,
        unknown_fields: UnknownFields,
    ) -> Self {
        let (selection, indicator_id) = match state.focus {
            Some(PaneFocus::Selection { from, to }) => (Some([from, to]), None),
            Some(PaneFocus::Indicator(point_id)) => (None, Some(point_id)),
            None => (None, None),
        };
        Self {
            schema_version,
            platform_id: state.platform_id,
            metric_id: state.metric_id,
            selection,
            indicator_id,
            graph_options: state
                .graph_options
                .map(|options| options.tokens().into_iter().map(str::to_string).collect()),
            trend_line: state.trend_line.as_ref().map(|setting| TrendLineRecord {
                type_id: setting.kind.id(),
                parameters: setting.parameters.clone(),
            }),
            unknown_fields,
        }
    }

    /// Validates and converts back. Unlike the positional form, a record
    /// with conflicting focus fields or an unknown trend-line type is
    /// rejected.
    pub fn into_state_parts(self) -> Result<(ChartPaneState, UnknownFields), PerfError> {
        validate_schema_version(self.schema_version, "PaneState")?;

        let focus = match (self.selection, self.indicator_id) {
            (Some(_), Some(_)) => {
                return Err(PerfError::invalid_input(
                    "PaneState cannot carry both selection and indicator_id",
                ));
            }
            (Some([from, to]), None) => {
                if !from.is_finite() || !to.is_finite() {
                    return Err(PerfError::invalid_input(format!(
                        "PaneState selection must be finite; got [{from}, {to}]"
                    )));
                }
                Some(PaneFocus::Selection { from, to })
            }
            (None, Some(point_id)) => Some(PaneFocus::Indicator(point_id)),
            (None, None) => None,
        };

        let trend_line = match self.trend_line {
            Some(record) => {
                let kind = TrendLineKind::from_id(record.type_id).ok_or_else(|| {
                    PerfError::invalid_input(format!(
                        "PaneState trend_line.type_id={} is not a known trend-line type",
                        record.type_id
                    ))
                })?;
                let expected = kind.parameter_list().len();
                if record.parameters.len() != expected {
                    return Err(PerfError::invalid_input(format!(
                        "PaneState trend_line for {} needs {expected} parameters; got {}",
                        kind.label(),
                        record.parameters.len()
                    )));
                }
                Some(TrendLineSetting {
                    kind,
                    parameters: record.parameters,
                })
            }
            None => None,
        };

        let state = ChartPaneState {
            platform_id: self.platform_id,
            metric_id: self.metric_id,
            focus,
            graph_options: self
                .graph_options
                .map(|tokens| GraphOptions::from_tokens(tokens.iter().map(String::as_str))),
            trend_line,
        };
        Ok((state, self.unknown_fields))
    }

    pub fn into_state(self) -> Result<ChartPaneState, PerfError> {
        let (state, _) = self.into_state_parts()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CURRENT_SCHEMA_VERSION, MAX_FORWARD_COMPAT_SCHEMA_VERSION, PaneStateRecord, UnknownFields,
    };
    use crate::state::{ChartPaneState, GraphOptions, PaneFocus, TrendLineSetting};
    use perf_trendline::TrendLineKind;
    use serde_json::json;

    fn sample_state() -> ChartPaneState {
        ChartPaneState {
            platform_id: 5,
            metric_id: 6,
            focus: Some(PaneFocus::Selection {
                from: 10.0,
                to: 20.0,
            }),
            graph_options: Some(GraphOptions {
                sampling_enabled: false,
                show_outliers: false,
            }),
            trend_line: Some(TrendLineSetting::with_defaults(
                TrendLineKind::ExponentialMovingAverage,
            )),
        }
    }

    #[test]
    fn record_round_trip_matches_positional_form() {
        let state = sample_state();
        let record = PaneStateRecord::from_state(&state);
        let encoded = serde_json::to_value(&record).expect("serialize");
        assert_eq!(encoded["schema_version"], json!(CURRENT_SCHEMA_VERSION));
        assert_eq!(encoded["graph_options"], json!(["noSampling"]));

        let decoded: PaneStateRecord = serde_json::from_value(encoded).expect("deserialize");
        let restored = decoded.into_state().expect("valid record");
        assert_eq!(restored, state);
        assert_eq!(restored.to_positional(), state.to_positional());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let payload = json!({
            "schema_version": MAX_FORWARD_COMPAT_SCHEMA_VERSION,
            "platform_id": 1,
            "metric_id": 2,
            "indicator_id": 99,
            "envelope": {"sigma": 2}
        });
        let record: PaneStateRecord = serde_json::from_value(payload).expect("deserialize");
        let (state, unknown) = record.into_state_parts().expect("forward-compatible");
        assert_eq!(state.focus, Some(PaneFocus::Indicator(99)));
        assert_eq!(unknown.get("envelope"), Some(&json!({"sigma": 2})));

        let rewritten = PaneStateRecord::from_state_with_unknown(
            &state,
            MAX_FORWARD_COMPAT_SCHEMA_VERSION,
            unknown,
        );
        let encoded = serde_json::to_value(rewritten).expect("serialize");
        assert_eq!(encoded["envelope"], json!({"sigma": 2}));
    }

    #[test]
    fn unsupported_versions_and_conflicts_are_rejected() {
        let mut record = PaneStateRecord::from_state(&sample_state());
        record.schema_version = MAX_FORWARD_COMPAT_SCHEMA_VERSION + 1;
        let err = record.into_state().expect_err("too new");
        assert!(err.to_string().contains("unsupported"));

        let mut record = PaneStateRecord::from_state(&sample_state());
        record.indicator_id = Some(3);
        assert!(record.into_state().is_err());

        let mut record = PaneStateRecord::from_state(&sample_state());
        if let Some(trend_line) = record.trend_line.as_mut() {
            trend_line.type_id = 4;
        }
        assert!(record.into_state().is_err());

        let mut record = PaneStateRecord::from_state(&sample_state());
        if let Some(trend_line) = record.trend_line.as_mut() {
            trend_line.parameters.clear();
        }
        assert!(record.into_state().is_err());

        let record = PaneStateRecord::from_state_with_unknown(&sample_state(), 0, UnknownFields::new());
        assert!(record.into_state().is_err());
    }
}
