// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{PerfError, TimeSeries};
use serde::{Deserialize, Serialize};

/// Which run configuration a series was measured under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesConfiguration {
    Current,
    Baseline,
    Target,
}

impl SeriesConfiguration {
    pub const ALL: [SeriesConfiguration; 3] = [Self::Current, Self::Baseline, Self::Target];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Baseline => "baseline",
            Self::Target => "target",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "current" => Some(Self::Current),
            "baseline" => Some(Self::Baseline),
            "target" => Some(Self::Target),
            _ => None,
        }
    }
}

/// A fetched series tagged with its configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredSeries {
    pub configuration: SeriesConfiguration,
    pub series: TimeSeries,
}

/// Source of measurement series for a platform/metric pair.
pub trait SeriesFetcher {
    /// Fetches every configuration measured for the pair, `Current` first.
    ///
    /// `no_cache` bypasses any static or intermediate cache so freshly
    /// written status changes are visible.
    fn fetch_series(
        &self,
        platform_id: u64,
        metric_id: u64,
        no_cache: bool,
    ) -> Result<Vec<ConfiguredSeries>, PerfError>;
}

/// Service that records a measurement's outlier status.
pub trait OutlierUpdater {
    fn update_run_status(&self, run_id: u64, marked_outlier: bool) -> Result<(), PerfError>;
}

/// Service that opens an analysis task over a range of measurements.
pub trait AnalysisTaskCreator {
    /// Returns the id of the new task.
    fn create_analysis_task(
        &self,
        name: &str,
        start_run_id: u64,
        end_run_id: u64,
    ) -> Result<u64, PerfError>;
}
