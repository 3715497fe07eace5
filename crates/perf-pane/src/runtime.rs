// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::controller::{ChartPane, PageNotification, PaneEffect, PaneEvent};
use crate::debounce::TimerId;
use perf_core::{AnalysisTaskCreator, OutlierUpdater, PerfError, SeriesFetcher};
use perf_trendline::SegmentationService;
use std::collections::{BTreeSet, VecDeque};
use tracing::trace;

/// Drives a [`ChartPane`] against synchronous collaborators and a virtual
/// clock. Effects run in the order the pane emitted them.
pub struct PaneRuntime<'a> {
    pane: ChartPane,
    fetcher: &'a dyn SeriesFetcher,
    updater: &'a dyn OutlierUpdater,
    segmentation: &'a dyn SegmentationService,
    analysis: Option<&'a dyn AnalysisTaskCreator>,
    now_ms: u64,
    timers: BTreeSet<(u64, TimerId)>,
    queue: VecDeque<PaneEffect>,
    alerts: Vec<String>,
    page_notifications: Vec<PageNotification>,
    renders: usize,
    trend_line_clears: usize,
}

impl<'a> PaneRuntime<'a> {
    pub fn new(
        pane: ChartPane,
        fetcher: &'a dyn SeriesFetcher,
        updater: &'a dyn OutlierUpdater,
        segmentation: &'a dyn SegmentationService,
    ) -> Self {
        Self {
            pane,
            fetcher,
            updater,
            segmentation,
            analysis: None,
            now_ms: 0,
            timers: BTreeSet::new(),
            queue: VecDeque::new(),
            alerts: Vec::new(),
            page_notifications: Vec::new(),
            renders: 0,
            trend_line_clears: 0,
        }
    }

    /// Service used for analysis-task requests; without one they fail.
    pub fn with_analysis_tasks(mut self, analysis: &'a dyn AnalysisTaskCreator) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn pane(&self) -> &ChartPane {
        &self.pane
    }

    pub fn into_pane(self) -> ChartPane {
        self.pane
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn page_notifications(&self) -> &[PageNotification] {
        &self.page_notifications
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn trend_line_clears(&self) -> usize {
        self.trend_line_clears
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Runs `operation` on the pane and everything it sets off, short of
    /// timers that are not yet due.
    pub fn apply<F>(&mut self, operation: F)
    where
        F: FnOnce(&mut ChartPane) -> Vec<PaneEffect>,
    {
        let effects = operation(&mut self.pane);
        self.dispatch(effects);
        self.run_until_idle();
    }

    pub fn dispatch(&mut self, effects: Vec<PaneEffect>) {
        self.queue.extend(effects);
    }

    pub fn run_until_idle(&mut self) {
        while let Some(effect) = self.queue.pop_front() {
            self.perform(effect);
        }
    }

    /// Moves the clock forward, firing due timers in deadline order.
    pub fn advance(&mut self, elapsed_ms: u64) {
        let target = self.now_ms.saturating_add(elapsed_ms);
        while let Some(&(due, id)) = self.timers.first() {
            if due > target {
                break;
            }
            self.timers.remove(&(due, id));
            self.now_ms = due;
            let effects = self.pane.handle(PaneEvent::TimerFired(id));
            self.dispatch(effects);
            self.run_until_idle();
        }
        self.now_ms = target;
    }

    fn perform(&mut self, effect: PaneEffect) {
        trace!(?effect, "performing pane effect");
        let follow_up = match effect {
            PaneEffect::FetchSeries {
                request,
                platform_id,
                metric_id,
                no_cache,
            } => {
                let result = self.fetcher.fetch_series(platform_id, metric_id, no_cache);
                self.pane.handle(PaneEvent::SeriesFetched { request, result })
            }
            PaneEffect::ComputeTrendLine(job) => {
                let result = job.run(self.segmentation);
                self.pane.handle(PaneEvent::TrendLineComputed {
                    version: job.version,
                    result,
                })
            }
            PaneEffect::SubmitOutlierStatus {
                request,
                point_ids,
                marked_outlier,
            } => {
                let result = point_ids
                    .iter()
                    .try_for_each(|id| self.updater.update_run_status(*id, marked_outlier));
                self.pane
                    .handle(PaneEvent::OutlierStatusSubmitted { request, result })
            }
            PaneEffect::CreateAnalysisTask {
                request,
                name,
                start_point_id,
                end_point_id,
            } => {
                let result = match self.analysis {
                    Some(analysis) => {
                        analysis.create_analysis_task(&name, start_point_id, end_point_id)
                    }
                    None => Err(PerfError::not_supported("no analysis task service configured")),
                };
                self.pane
                    .handle(PaneEvent::AnalysisTaskCreated { request, result })
            }
            PaneEffect::ScheduleTimer { id, delay_ms } => {
                self.timers
                    .insert((self.now_ms.saturating_add(delay_ms), id));
                Vec::new()
            }
            PaneEffect::ClearTrendLines => {
                self.trend_line_clears += 1;
                Vec::new()
            }
            PaneEffect::Alert(message) => {
                self.alerts.push(message);
                Vec::new()
            }
            PaneEffect::Render => {
                self.renders += 1;
                Vec::new()
            }
            PaneEffect::NotifyPage(notification) => {
                self.page_notifications.push(notification);
                Vec::new()
            }
        };
        self.dispatch(follow_up);
    }
}
