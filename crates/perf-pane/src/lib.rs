// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Chart pane controller. The pane never performs IO itself: operations
//! return [`PaneEffect`]s and their completions come back as [`PaneEvent`]s.

pub mod controller;
pub mod debounce;
pub mod popover;
pub mod record;
pub mod runtime;
pub mod state;
pub mod support;

pub use controller::{
    ANALYSIS_FAILURE_PREFIX, ChartPane, DEFAULT_DEBOUNCE_MS, OUTLIER_FAILURE_PREFIX, OutlierButton,
    PageNotification,
    PaneConfig, PaneEffect, PaneEvent, PaneStatus, TrendLineJob, TrendLineOverlays,
};
pub use debounce::TimerId;
pub use popover::{Popover, PopoverManager};
pub use record::{PaneStateRecord, TrendLineRecord};
pub use runtime::PaneRuntime;
pub use state::{ChartPaneState, GraphOption, GraphOptions, PaneFocus, TrendLineSetting};
pub use support::{DeepLinkRecorder, PaneNotification, PaneSupport, SupportId};
