// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Core shared types for perfdash: the error type, the time-series store and
//! the collaborator traits the pane controller drives.

pub mod collaborators;
pub mod error;
pub mod time_series;
pub mod wire;

pub use collaborators::{
    AnalysisTaskCreator, ConfiguredSeries, OutlierUpdater, SeriesConfiguration, SeriesFetcher,
};
pub use error::PerfError;
pub use time_series::{ConfidenceInterval, MeasurementPoint, TimeSeries};
