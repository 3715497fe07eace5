// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use perf_stats::{DEFAULT_GRID_SIZE, DEFAULT_SEGMENT_COUNT_WEIGHT};

/// One tunable input of a trend-line type.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSpec {
    pub label: &'static str,
    pub default: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
}

impl ParameterSpec {
    /// Clamps `value` into `[min, max]`. Computation never clamps; this is for
    /// input surfaces.
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        let mut clamped = value;
        if let Some(min) = self.min
            && clamped < min
        {
            clamped = min;
        }
        if let Some(max) = self.max
            && clamped > max
        {
            clamped = max;
        }
        clamped
    }
}

const SEGMENTATION_PARAMETERS: [ParameterSpec; 2] = [
    ParameterSpec {
        label: "Segment count weight",
        default: DEFAULT_SEGMENT_COUNT_WEIGHT,
        min: Some(0.01),
        max: Some(10.0),
        step: 0.01,
    },
    ParameterSpec {
        label: "Grid size",
        default: DEFAULT_GRID_SIZE as f64,
        min: Some(100.0),
        max: Some(10_000.0),
        step: 10.0,
    },
];

const SIMPLE_PARAMETERS: [ParameterSpec; 2] = [
    ParameterSpec {
        label: "Backward window size",
        default: 8.0,
        min: Some(2.0),
        max: None,
        step: 1.0,
    },
    ParameterSpec {
        label: "Forward window size",
        default: 4.0,
        min: Some(0.0),
        max: None,
        step: 1.0,
    },
];

const EXPONENTIAL_PARAMETERS: [ParameterSpec; 1] = [ParameterSpec {
    label: "Smoothing factor",
    default: 0.01,
    min: Some(0.001),
    max: Some(0.9),
    step: 0.001,
}];

/// Registered trend-line computations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TrendLineKind {
    None,
    Segmentation,
    #[default]
    SimpleMovingAverage,
    CumulativeMovingAverage,
    ExponentialMovingAverage,
}

impl TrendLineKind {
    /// Registry order, as offered to users.
    pub const ALL: [TrendLineKind; 5] = [
        Self::None,
        Self::Segmentation,
        Self::SimpleMovingAverage,
        Self::CumulativeMovingAverage,
        Self::ExponentialMovingAverage,
    ];

    /// Stable id used in serialized pane state.
    pub fn id(self) -> u32 {
        match self {
            Self::None => 0,
            Self::SimpleMovingAverage => 1,
            Self::CumulativeMovingAverage => 2,
            Self::ExponentialMovingAverage => 3,
            Self::Segmentation => 5,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Segmentation => "Segmentation",
            Self::SimpleMovingAverage => "Simple Moving Average",
            Self::CumulativeMovingAverage => "Cumulative Moving Average",
            Self::ExponentialMovingAverage => "Exponential Moving Average",
        }
    }

    pub fn parameter_list(self) -> &'static [ParameterSpec] {
        match self {
            Self::None | Self::CumulativeMovingAverage => &[],
            Self::Segmentation => &SEGMENTATION_PARAMETERS,
            Self::SimpleMovingAverage => &SIMPLE_PARAMETERS,
            Self::ExponentialMovingAverage => &EXPONENTIAL_PARAMETERS,
        }
    }

    pub fn default_parameters(self) -> Vec<f64> {
        self.parameter_list().iter().map(|parameter| parameter.default).collect()
    }

    /// Parameter `index`, or its default when missing or non-finite.
    pub fn parameter_or_default(self, parameters: &[f64], index: usize) -> f64 {
        let default = self
            .parameter_list()
            .get(index)
            .map_or(f64::NAN, |parameter| parameter.default);
        match parameters.get(index) {
            Some(value) if value.is_finite() => *value,
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TrendLineKind;

    #[test]
    fn ids_are_stable_and_round_trip() {
        let ids: Vec<u32> = TrendLineKind::ALL.iter().map(|kind| kind.id()).collect();
        assert_eq!(ids, vec![0, 5, 1, 2, 3]);
        for kind in TrendLineKind::ALL {
            assert_eq!(TrendLineKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(TrendLineKind::from_id(4), None);
    }

    #[test]
    fn default_is_simple_moving_average() {
        assert_eq!(TrendLineKind::default(), TrendLineKind::SimpleMovingAverage);
        assert_eq!(
            TrendLineKind::default().default_parameters(),
            vec![8.0, 4.0]
        );
    }

    #[test]
    fn parameter_lists_match_registry() {
        assert!(TrendLineKind::None.parameter_list().is_empty());
        assert!(TrendLineKind::CumulativeMovingAverage.parameter_list().is_empty());
        assert_eq!(
            TrendLineKind::Segmentation.default_parameters(),
            vec![2.5, 500.0]
        );
        assert_eq!(
            TrendLineKind::ExponentialMovingAverage.default_parameters(),
            vec![0.01]
        );
    }

    #[test]
    fn clamp_respects_optional_bounds() {
        let [backward, forward] = TrendLineKind::SimpleMovingAverage.parameter_list() else {
            panic!("simple moving average has two parameters");
        };
        assert_eq!(backward.clamp(0.0), 2.0);
        assert_eq!(backward.clamp(1_000.0), 1_000.0);
        assert_eq!(forward.clamp(-3.0), 0.0);
        assert_eq!(forward.clamp(f64::NAN), 4.0);

        let smoothing = TrendLineKind::ExponentialMovingAverage.parameter_list()[0];
        assert_eq!(smoothing.clamp(2.0), 0.9);
    }

    #[test]
    fn missing_parameters_fall_back_to_defaults() {
        let kind = TrendLineKind::SimpleMovingAverage;
        assert_eq!(kind.parameter_or_default(&[3.0], 0), 3.0);
        assert_eq!(kind.parameter_or_default(&[3.0], 1), 4.0);
        assert_eq!(kind.parameter_or_default(&[f64::NAN, 1.0], 0), 8.0);
    }
}
