// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::debounce::{Debouncer, TimerId};
use crate::popover::{Popover, PopoverManager};
use crate::state::{ChartPaneState, GraphOptions, PaneFocus, TrendLineSetting};
use crate::support::{PaneNotification, PaneSupport, SupportId, SupportRegistry};
use perf_core::{ConfiguredSeries, MeasurementPoint, PerfError, SeriesConfiguration, TimeSeries};
use perf_model::{Metric, Platform};
use perf_trendline::{SegmentationService, TrendLineKind, TrendPoint, execute};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Prefix of the alert raised when an outlier update fails.
pub const OUTLIER_FAILURE_PREFIX: &str = "Failed to update the outlier status: ";

/// Prefix of the alert raised when an analysis task cannot be created.
pub const ANALYSIS_FAILURE_PREFIX: &str = "Failed to create the analysis task: ";

/// Configuration for [`ChartPane`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaneConfig {
    /// Quiet period before a parameter edit triggers recomputation.
    pub debounce_ms: u64,
    /// Trend line used until the user or a deep link picks one.
    pub default_trend_line: TrendLineKind,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            default_trend_line: TrendLineKind::default(),
        }
    }
}

impl PaneConfig {
    pub fn validate(&self) -> Result<(), PerfError> {
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(PerfError::invalid_input(format!(
                "debounce_ms must be <= {MAX_DEBOUNCE_MS}; got {}",
                self.debounce_ms
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PaneStatus {
    Unconfigured,
    /// Platform/metric known, series not loaded yet.
    Configured,
    DataLoaded,
    TrendLineComputing,
    TrendLineReady,
    Closed,
}

pub type TrendLineOverlays = Vec<(SeriesConfiguration, Option<Vec<TrendPoint>>)>;

/// Snapshot of everything one trend-line computation needs.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendLineJob {
    pub version: u64,
    pub kind: TrendLineKind,
    pub parameters: Vec<f64>,
    pub sources: Vec<(SeriesConfiguration, Arc<TimeSeries>)>,
}

impl TrendLineJob {
    /// Computes the overlay of every source; the first failure wins.
    pub fn run(&self, segmentation: &dyn SegmentationService) -> Result<TrendLineOverlays, PerfError> {
        self.sources
            .iter()
            .map(|(configuration, series)| {
                let overlay = execute(self.kind, series, &self.parameters, segmentation)?;
                Ok((*configuration, overlay))
            })
            .collect()
    }
}

/// Notifications for the page hosting the pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PageNotification {
    SelectionChanged,
    IndicatorChanged { lock_changed: bool },
    GraphOptionsChanged,
    AnalysisTaskCreated { task_id: u64 },
}

/// Work the controller asks its environment to perform.
#[derive(Clone, Debug, PartialEq)]
pub enum PaneEffect {
    FetchSeries {
        request: u64,
        platform_id: u64,
        metric_id: u64,
        no_cache: bool,
    },
    ComputeTrendLine(TrendLineJob),
    ClearTrendLines,
    ScheduleTimer {
        id: TimerId,
        delay_ms: u64,
    },
    SubmitOutlierStatus {
        request: u64,
        point_ids: Vec<u64>,
        marked_outlier: bool,
    },
    CreateAnalysisTask {
        request: u64,
        name: String,
        start_point_id: u64,
        end_point_id: u64,
    },
    Alert(String),
    Render,
    NotifyPage(PageNotification),
}

/// Completions fed back into the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum PaneEvent {
    SeriesFetched {
        request: u64,
        result: Result<Vec<ConfiguredSeries>, PerfError>,
    },
    TrendLineComputed {
        version: u64,
        result: Result<TrendLineOverlays, PerfError>,
    },
    TimerFired(TimerId),
    OutlierStatusSubmitted {
        request: u64,
        result: Result<(), PerfError>,
    },
    AnalysisTaskCreated {
        request: u64,
        result: Result<u64, PerfError>,
    },
}

/// State of the "mark selected points" button.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierButton {
    pub label: String,
    pub enabled: bool,
    pub marks_as_outlier: bool,
    pub point_ids: Vec<u64>,
}

/// Sans-IO controller of one chart pane.
///
/// Every operation returns the effects to perform; completions come back
/// through [`ChartPane::handle`]. Fetches and trend-line computations are
/// stamped with monotonically increasing counters and a completion carrying
/// an outdated stamp is dropped.
#[derive(Debug)]
pub struct ChartPane {
    config: PaneConfig,
    status: PaneStatus,
    pair: Option<(u64, u64)>,
    platform: Option<Arc<Platform>>,
    metric: Option<Arc<Metric>>,
    fetch_request: u64,
    series: Vec<(SeriesConfiguration, Arc<TimeSeries>)>,
    selection: Option<(f64, f64)>,
    indicator: Option<u64>,
    indicator_locked: bool,
    graph_options: GraphOptions,
    trend_line: Option<TrendLineSetting>,
    trend_line_version: u64,
    overlays: TrendLineOverlays,
    debouncer: Debouncer,
    outlier_request: u64,
    analysis_request: u64,
    analysis_task: Option<u64>,
    supports: SupportRegistry,
    popovers: PopoverManager,
    last_error: Option<PerfError>,
}

impl ChartPane {
    pub fn new(config: PaneConfig) -> Result<Self, PerfError> {
        config.validate()?;
        Ok(Self {
            config,
            status: PaneStatus::Unconfigured,
            pair: None,
            platform: None,
            metric: None,
            fetch_request: 0,
            series: Vec::new(),
            selection: None,
            indicator: None,
            indicator_locked: false,
            graph_options: GraphOptions::default(),
            trend_line: None,
            trend_line_version: 0,
            overlays: Vec::new(),
            debouncer: Debouncer::default(),
            outlier_request: 0,
            analysis_request: 0,
            analysis_task: None,
            supports: SupportRegistry::default(),
            popovers: PopoverManager::default(),
            last_error: None,
        })
    }

    /// Creates a pane and configures it in one step.
    pub fn open(
        config: PaneConfig,
        platform_id: u64,
        metric_id: u64,
    ) -> Result<(Self, Vec<PaneEffect>), PerfError> {
        let mut pane = Self::new(config)?;
        let effects = pane.configure(platform_id, metric_id);
        Ok((pane, effects))
    }

    pub fn status(&self) -> PaneStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.status == PaneStatus::Closed
    }

    pub fn platform_and_metric(&self) -> Option<(u64, u64)> {
        self.pair
    }

    pub fn config(&self) -> &PaneConfig {
        &self.config
    }

    /// `"<metric> on <platform>"` once both are known.
    pub fn title(&self) -> Option<String> {
        let (Some(platform), Some(metric)) = (&self.platform, &self.metric) else {
            return None;
        };
        Some(format!("{} on {}", metric.full_name(), platform.name))
    }

    pub fn series(&self, configuration: SeriesConfiguration) -> Option<&TimeSeries> {
        self.series
            .iter()
            .find(|(candidate, _)| *candidate == configuration)
            .map(|(_, series)| series.as_ref())
    }

    pub fn overlays(&self) -> &TrendLineOverlays {
        &self.overlays
    }

    pub fn overlay(&self, configuration: SeriesConfiguration) -> Option<&[TrendPoint]> {
        self.overlays
            .iter()
            .find(|(candidate, _)| *candidate == configuration)
            .and_then(|(_, overlay)| overlay.as_deref())
    }

    pub fn trend_line_version(&self) -> u64 {
        self.trend_line_version
    }

    /// The trend line in effect: the chosen one, else the configured default.
    pub fn trend_line(&self) -> TrendLineSetting {
        self.trend_line
            .clone()
            .unwrap_or_else(|| TrendLineSetting::with_defaults(self.config.default_trend_line))
    }

    pub fn graph_options(&self) -> GraphOptions {
        self.graph_options
    }

    pub fn selection(&self) -> Option<(f64, f64)> {
        self.selection
    }

    /// Indicated point id and whether the indicator is locked.
    pub fn indicator(&self) -> Option<(u64, bool)> {
        self.indicator.map(|id| (id, self.indicator_locked))
    }

    pub fn last_error(&self) -> Option<&PerfError> {
        self.last_error.as_ref()
    }

    pub fn popovers(&self) -> &PopoverManager {
        &self.popovers
    }

    /// Id of the last analysis task this pane created.
    pub fn analysis_task(&self) -> Option<u64> {
        self.analysis_task
    }

    pub fn pending_timers(&self) -> usize {
        self.debouncer.pending_count()
    }

    pub fn register_support(&mut self, support: Box<dyn PaneSupport>) -> SupportId {
        self.supports.register(support)
    }

    pub fn detach_support(&mut self, id: SupportId) -> bool {
        self.supports.detach(id)
    }

    pub fn support_names(&self) -> Vec<&'static str> {
        self.supports.names()
    }

    /// Points to `platform_id`/`metric_id` and fetches their series.
    ///
    /// Data, focus and overlays of a previous pair are discarded and any
    /// in-flight fetch or computation becomes stale.
    pub fn configure(&mut self, platform_id: u64, metric_id: u64) -> Vec<PaneEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        info!(platform_id, metric_id, "configuring chart pane");

        if self.pair != Some((platform_id, metric_id)) {
            self.platform = None;
            self.metric = None;
        }
        self.pair = Some((platform_id, metric_id));
        self.series.clear();
        self.overlays.clear();
        self.selection = None;
        self.indicator = None;
        self.indicator_locked = false;
        self.trend_line_version += 1;
        self.last_error = None;
        self.status = PaneStatus::Configured;

        self.broadcast(PaneNotification::Reconfigured {
            platform_id,
            metric_id,
        });
        vec![self.fetch_effect(false), PaneEffect::Render]
    }

    /// Attaches the resolved platform and metric used for the title.
    pub fn set_entities(
        &mut self,
        platform: Arc<Platform>,
        metric: Arc<Metric>,
    ) -> Result<Vec<PaneEffect>, PerfError> {
        if self.pair != Some((platform.id, metric.id)) {
            return Err(PerfError::invalid_input(format!(
                "pane shows {:?}; got platform {} and metric {}",
                self.pair, platform.id, metric.id
            )));
        }
        self.platform = Some(platform);
        self.metric = Some(metric);
        Ok(vec![PaneEffect::Render])
    }

    pub fn handle(&mut self, event: PaneEvent) -> Vec<PaneEffect> {
        if self.is_closed() {
            debug!(?event, "pane closed; ignoring event");
            return Vec::new();
        }
        match event {
            PaneEvent::SeriesFetched { request, result } => self.on_series_fetched(request, result),
            PaneEvent::TrendLineComputed { version, result } => {
                self.on_trend_line_computed(version, result)
            }
            PaneEvent::TimerFired(id) => self.on_timer_fired(id),
            PaneEvent::OutlierStatusSubmitted { request, result } => {
                self.on_outlier_status_submitted(request, result)
            }
            PaneEvent::AnalysisTaskCreated { request, result } => {
                self.on_analysis_task_created(request, result)
            }
        }
    }

    pub fn set_trend_line_type(&mut self, kind: TrendLineKind) -> Vec<PaneEffect> {
        if self.is_closed() || self.trend_line.as_ref().map(|setting| setting.kind) == Some(kind) {
            return Vec::new();
        }
        self.trend_line = Some(TrendLineSetting::with_defaults(kind));

        let mut effects = self.update_trend_line();
        effects.push(PaneEffect::NotifyPage(PageNotification::GraphOptionsChanged));
        effects.push(PaneEffect::Render);
        self.broadcast(PaneNotification::StateChanged);
        effects
    }

    /// Stores a parameter edit and schedules its debounced recomputation.
    /// A computation already in flight is superseded immediately.
    pub fn set_trend_line_parameter(&mut self, index: usize, value: f64) -> Vec<PaneEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        if !value.is_finite() {
            debug!(index, value, "ignoring non-finite trend-line parameter");
            return Vec::new();
        }
        let default_kind = self.config.default_trend_line;
        let setting = self
            .trend_line
            .get_or_insert_with(|| TrendLineSetting::with_defaults(default_kind));
        let Some(slot) = setting.parameters.get_mut(index) else {
            debug!(index, kind = setting.kind.label(), "no such trend-line parameter");
            return Vec::new();
        };
        if *slot == value {
            return Vec::new();
        }
        *slot = value;

        // Whatever is in flight was computed with the old value.
        if self.has_data() {
            self.trend_line_version += 1;
        }
        let id = self.debouncer.schedule(index, value);
        vec![PaneEffect::ScheduleTimer {
            id,
            delay_ms: self.config.debounce_ms,
        }]
    }

    pub fn set_selection(&mut self, selection: Option<(f64, f64)>) -> Vec<PaneEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        let selection = match selection {
            Some((from, to)) if !from.is_finite() || !to.is_finite() => {
                debug!(from, to, "ignoring non-finite selection");
                return Vec::new();
            }
            Some((from, to)) if from > to => Some((to, from)),
            other => other,
        };
        if selection == self.selection {
            return Vec::new();
        }
        self.selection = selection;
        self.broadcast(PaneNotification::StateChanged);
        vec![
            PaneEffect::NotifyPage(PageNotification::SelectionChanged),
            PaneEffect::Render,
        ]
    }

    pub fn set_indicator(&mut self, point_id: Option<u64>, locked: bool) -> Vec<PaneEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        let lock_changed = locked != self.indicator_locked;
        self.indicator = point_id;
        self.indicator_locked = locked;
        self.broadcast(PaneNotification::StateChanged);
        vec![
            PaneEffect::NotifyPage(PageNotification::IndicatorChanged { lock_changed }),
            PaneEffect::Render,
        ]
    }

    pub fn set_sampling_enabled(&mut self, enabled: bool) -> Vec<PaneEffect> {
        if self.is_closed() || self.graph_options.sampling_enabled == enabled {
            return Vec::new();
        }
        self.graph_options.sampling_enabled = enabled;
        self.broadcast(PaneNotification::GraphOptionsChanged);
        vec![
            PaneEffect::NotifyPage(PageNotification::GraphOptionsChanged),
            PaneEffect::Render,
        ]
    }

    /// Outliers feed the trend line only while shown, so toggling this
    /// recomputes it.
    pub fn set_show_outliers(&mut self, show: bool) -> Vec<PaneEffect> {
        if self.is_closed() || self.graph_options.show_outliers == show {
            return Vec::new();
        }
        self.graph_options.show_outliers = show;
        let mut effects = self.update_trend_line();
        self.broadcast(PaneNotification::GraphOptionsChanged);
        effects.push(PaneEffect::NotifyPage(PageNotification::GraphOptionsChanged));
        effects.push(PaneEffect::Render);
        effects
    }

    pub fn click_popover(&mut self, popover: Popover) -> Vec<PaneEffect> {
        self.popovers.click(popover);
        vec![PaneEffect::Render]
    }

    pub fn hover_popover_anchor(&mut self, popover: Popover, entered: bool) -> Vec<PaneEffect> {
        if entered {
            self.popovers.anchor_enter(popover);
        } else {
            self.popovers.anchor_leave(popover);
        }
        vec![PaneEffect::Render]
    }

    pub fn hover_popover_body(&mut self, popover: Popover, entered: bool) -> Vec<PaneEffect> {
        if entered {
            self.popovers.body_enter(popover);
        } else {
            self.popovers.body_leave(popover);
        }
        vec![PaneEffect::Render]
    }

    /// Points of the current series inside the selection, as displayed.
    pub fn selected_points(&self) -> Vec<&MeasurementPoint> {
        let (Some((from, to)), Some(series)) =
            (self.selection, self.series(SeriesConfiguration::Current))
        else {
            return Vec::new();
        };
        series
            .points()
            .iter()
            .filter(|point| self.graph_options.show_outliers || !point.marked_outlier)
            .filter(|point| {
                let time = point.time as f64;
                time >= from && time <= to
            })
            .collect()
    }

    fn locked_indicator_point(&self) -> Option<&MeasurementPoint> {
        if !self.indicator_locked {
            return None;
        }
        let id = self.indicator?;
        self.series(SeriesConfiguration::Current)?
            .find_by_id(id)
            .map(|(_, point)| point)
    }

    /// The locked indicator's point wins over the first selected point; the
    /// action flips that point's outlier flag for every target.
    pub fn outlier_button(&self) -> OutlierButton {
        let selected = self.selected_points();
        let first = self
            .locked_indicator_point()
            .or_else(|| selected.first().copied());
        let already_marked = first.is_some_and(|point| point.marked_outlier);
        let point_ids = if self.selection.is_some() {
            selected.iter().map(|point| point.id).collect()
        } else {
            first.map(|point| point.id).into_iter().collect()
        };
        OutlierButton {
            label: format!(
                "{} selected points as outlier",
                if already_marked { "Unmark" } else { "Mark" }
            ),
            enabled: first.is_some(),
            marks_as_outlier: !already_marked,
            point_ids,
        }
    }

    pub fn press_outlier_button(&mut self) -> Vec<PaneEffect> {
        let button = self.outlier_button();
        if !button.enabled {
            return Vec::new();
        }
        self.mark_as_outlier(button.marks_as_outlier, button.point_ids)
    }

    /// Requests an outlier status change. Local points are not touched; a
    /// successful update is observed through the forced refetch.
    pub fn mark_as_outlier(&mut self, marked_outlier: bool, point_ids: Vec<u64>) -> Vec<PaneEffect> {
        if self.is_closed() || point_ids.is_empty() {
            return Vec::new();
        }
        self.outlier_request += 1;
        info!(
            request = self.outlier_request,
            points = point_ids.len(),
            marked_outlier,
            "submitting outlier status"
        );
        vec![PaneEffect::SubmitOutlierStatus {
            request: self.outlier_request,
            point_ids,
            marked_outlier,
        }]
    }

    /// First and last displayed point of the selection. A range needs two
    /// distinct points.
    pub fn points_range_for_analysis(&self) -> Option<(u64, u64)> {
        let selected = self.selected_points();
        let (first, last) = (selected.first()?, selected.last()?);
        (first.id != last.id).then_some((first.id, last.id))
    }

    /// Requests an analysis task named `name` over the selected range.
    pub fn analyze_range(&mut self, name: &str) -> Vec<PaneEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        let Some((start_point_id, end_point_id)) = self.points_range_for_analysis() else {
            debug!(selection = ?self.selection, "no point range to analyze");
            return Vec::new();
        };
        let name = name.trim();
        if name.is_empty() {
            return vec![PaneEffect::Alert(format!(
                "{ANALYSIS_FAILURE_PREFIX}the task needs a name"
            ))];
        }
        self.analysis_request += 1;
        info!(
            request = self.analysis_request,
            start_point_id, end_point_id, "creating analysis task"
        );
        vec![PaneEffect::CreateAnalysisTask {
            request: self.analysis_request,
            name: name.to_string(),
            start_point_id,
            end_point_id,
        }]
    }

    pub fn serialize_state(&self) -> Option<ChartPaneState> {
        let (platform_id, metric_id) = self.pair?;
        let focus = match (self.selection, self.indicator) {
            (Some((from, to)), _) => Some(PaneFocus::Selection { from, to }),
            (None, Some(point_id)) if self.indicator_locked => Some(PaneFocus::Indicator(point_id)),
            _ => None,
        };
        Some(ChartPaneState {
            platform_id,
            metric_id,
            focus,
            graph_options: (!self.graph_options.is_default()).then_some(self.graph_options),
            trend_line: self.trend_line.clone(),
        })
    }

    /// Restores a deep-linked state. A different platform/metric pair
    /// reconfigures the pane first; the trend line is applied now if data is
    /// loaded, otherwise on arrival.
    pub fn update_from_serialized_state(&mut self, state: &ChartPaneState) -> Vec<PaneEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if self.pair != Some((state.platform_id, state.metric_id)) {
            effects.extend(self.configure(state.platform_id, state.metric_id));
        }

        match state.focus {
            Some(PaneFocus::Selection { from, to }) => {
                self.selection = Some(if from > to { (to, from) } else { (from, to) });
            }
            Some(PaneFocus::Indicator(point_id)) => {
                self.indicator = Some(point_id);
                self.indicator_locked = true;
            }
            None => {
                self.indicator = None;
                self.indicator_locked = false;
            }
        }
        if let Some(options) = state.graph_options {
            self.graph_options = options;
        }
        self.trend_line = Some(
            state
                .trend_line
                .clone()
                .unwrap_or_else(|| TrendLineSetting::with_defaults(self.config.default_trend_line)),
        );

        effects.extend(self.update_trend_line());
        self.broadcast(PaneNotification::StateChanged);
        effects.push(PaneEffect::Render);
        effects
    }

    /// Closes the pane: supports are notified and detached, timers dropped,
    /// and later events ignored.
    pub fn close(&mut self) -> Vec<PaneEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        info!(pair = ?self.pair, "closing chart pane");
        self.broadcast(PaneNotification::Closed);
        self.supports.detach_all();
        self.popovers.hide_all();
        self.debouncer.clear();
        self.trend_line_version += 1;
        self.series.clear();
        self.overlays.clear();
        self.status = PaneStatus::Closed;
        Vec::new()
    }

    fn has_data(&self) -> bool {
        matches!(
            self.status,
            PaneStatus::DataLoaded | PaneStatus::TrendLineComputing | PaneStatus::TrendLineReady
        )
    }

    fn fetch_effect(&mut self, no_cache: bool) -> PaneEffect {
        self.fetch_request += 1;
        let (platform_id, metric_id) = self.pair.unwrap_or_default();
        PaneEffect::FetchSeries {
            request: self.fetch_request,
            platform_id,
            metric_id,
            no_cache,
        }
    }

    fn broadcast(&mut self, notification: PaneNotification) {
        let state = self.serialize_state();
        self.popovers.notify(&notification, state.as_ref());
        self.supports.broadcast(&notification, state.as_ref());
    }

    fn update_trend_line(&mut self) -> Vec<PaneEffect> {
        if !self.has_data() {
            return Vec::new();
        }
        self.trend_line_version += 1;
        let setting = self.trend_line();

        if setting.kind == TrendLineKind::None {
            self.overlays.clear();
            self.status = PaneStatus::TrendLineReady;
            self.broadcast(PaneNotification::TrendLineUpdated {
                version: self.trend_line_version,
            });
            return vec![PaneEffect::ClearTrendLines, PaneEffect::Render];
        }

        let sources = self
            .series
            .iter()
            .map(|(configuration, series)| {
                let source = if self.graph_options.show_outliers {
                    Arc::clone(series)
                } else {
                    Arc::new(series.without_outliers())
                };
                (*configuration, source)
            })
            .collect();
        self.status = PaneStatus::TrendLineComputing;
        info!(
            version = self.trend_line_version,
            kind = setting.kind.label(),
            "computing trend line"
        );
        vec![PaneEffect::ComputeTrendLine(TrendLineJob {
            version: self.trend_line_version,
            kind: setting.kind,
            parameters: setting.parameters,
            sources,
        })]
    }

    fn on_series_fetched(
        &mut self,
        request: u64,
        result: Result<Vec<ConfiguredSeries>, PerfError>,
    ) -> Vec<PaneEffect> {
        if request != self.fetch_request {
            debug!(request, current = self.fetch_request, "dropping stale series fetch");
            return Vec::new();
        }
        match result {
            Ok(fetched) => {
                info!(request, configurations = fetched.len(), "series fetched");
                self.series = fetched
                    .into_iter()
                    .map(|entry| (entry.configuration, Arc::new(entry.series)))
                    .collect();
                self.status = PaneStatus::DataLoaded;
                self.last_error = None;
                let mut effects = self.update_trend_line();
                effects.push(PaneEffect::Render);
                effects
            }
            Err(err) => {
                warn!(request, error = %err, "series fetch failed");
                self.last_error = Some(err);
                vec![PaneEffect::Render]
            }
        }
    }

    fn on_trend_line_computed(
        &mut self,
        version: u64,
        result: Result<TrendLineOverlays, PerfError>,
    ) -> Vec<PaneEffect> {
        if version != self.trend_line_version {
            debug!(
                version,
                current = self.trend_line_version,
                "dropping stale trend line"
            );
            return Vec::new();
        }
        match result {
            Ok(overlays) => {
                self.overlays = overlays;
                self.status = PaneStatus::TrendLineReady;
                self.broadcast(PaneNotification::TrendLineUpdated { version });
            }
            Err(err) => {
                warn!(version, error = %err, "trend line computation failed");
                self.last_error = Some(err);
                self.status = PaneStatus::DataLoaded;
            }
        }
        vec![PaneEffect::Render]
    }

    fn on_timer_fired(&mut self, id: TimerId) -> Vec<PaneEffect> {
        let Some(pending) = self.debouncer.take(id) else {
            debug!(timer = id.get(), "unknown or expired timer");
            return Vec::new();
        };
        let current = self
            .trend_line
            .as_ref()
            .and_then(|setting| setting.parameters.get(pending.index))
            .copied();
        if current != Some(pending.value) {
            debug!(
                timer = id.get(),
                index = pending.index,
                "parameter edit superseded before its quiet period ended"
            );
            return Vec::new();
        }
        let mut effects = self.update_trend_line();
        effects.push(PaneEffect::NotifyPage(PageNotification::GraphOptionsChanged));
        self.broadcast(PaneNotification::StateChanged);
        effects
    }

    fn on_outlier_status_submitted(
        &mut self,
        request: u64,
        result: Result<(), PerfError>,
    ) -> Vec<PaneEffect> {
        match result {
            Ok(()) => {
                info!(request, "outlier status updated; refetching without cache");
                vec![self.fetch_effect(true)]
            }
            Err(err) => {
                warn!(request, error = %err, "outlier status update failed");
                vec![PaneEffect::Alert(format!("{OUTLIER_FAILURE_PREFIX}{err}"))]
            }
        }
    }

    fn on_analysis_task_created(
        &mut self,
        request: u64,
        result: Result<u64, PerfError>,
    ) -> Vec<PaneEffect> {
        if request != self.analysis_request {
            debug!(request, current = self.analysis_request, "dropping stale analysis task reply");
            return Vec::new();
        }
        match result {
            Ok(task_id) => {
                info!(request, task_id, "analysis task created");
                self.analysis_task = Some(task_id);
                vec![
                    PaneEffect::NotifyPage(PageNotification::AnalysisTaskCreated { task_id }),
                    PaneEffect::Render,
                ]
            }
            Err(err) => {
                warn!(request, error = %err, "analysis task creation failed");
                vec![PaneEffect::Alert(format!("{ANALYSIS_FAILURE_PREFIX}{err}"))]
            }
        }
    }
}
