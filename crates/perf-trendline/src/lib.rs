// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Trend-line types and the engine that turns a series into an overlay.

pub mod engine;
pub mod kind;

pub use engine::{LocalSegmentation, SegmentationService, TrendPoint, execute};
pub use kind::{ParameterSpec, TrendLineKind};
