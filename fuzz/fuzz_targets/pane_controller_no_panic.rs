// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use perf_core::{ConfiguredSeries, MeasurementPoint, PerfError, SeriesConfiguration, TimeSeries};
use perf_pane::{ChartPane, PaneConfig, PaneEffect, PaneEvent, Popover, TimerId};
use perf_trendline::{LocalSegmentation, TrendLineKind};

fn build_series(data: &mut &[u8]) -> Vec<ConfiguredSeries> {
    let len = common::bounded(common::next_byte(data), 0, 48);
    let points = (0..len)
        .map(|idx| {
            let value = f64::from(common::next_byte(data)) / 4.0;
            let outlier = common::next_byte(data) % 5 == 0;
            MeasurementPoint::new(idx as u64, idx as i64 * 100, value).with_marked_outlier(outlier)
        })
        .collect();
    match TimeSeries::from_points(points) {
        Ok(series) => vec![ConfiguredSeries {
            configuration: SeriesConfiguration::Current,
            series,
        }],
        Err(_) => Vec::new(),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut data = data;
    let Ok(mut pane) = ChartPane::new(PaneConfig::default()) else {
        return;
    };
    let mut pending: Vec<PaneEffect> = Vec::new();
    let mut timers: Vec<TimerId> = Vec::new();

    for _ in 0..64 {
        if data.is_empty() {
            break;
        }
        let op = common::next_byte(&mut data);
        let arg = common::next_byte(&mut data);
        let effects = match op % 12 {
            0 => pane.configure(u64::from(arg % 4), u64::from(arg / 64)),
            1 => {
                let kind = TrendLineKind::ALL[usize::from(arg) % TrendLineKind::ALL.len()];
                pane.set_trend_line_type(kind)
            }
            2 => pane.set_trend_line_parameter(usize::from(arg % 3), f64::from(arg) / 8.0),
            3 => {
                let to = f64::from(common::next_byte(&mut data)) * 50.0;
                pane.set_selection(Some((f64::from(arg) * 50.0, to)))
            }
            4 => pane.set_indicator(Some(u64::from(arg % 48)), arg % 2 == 0),
            5 => pane.set_show_outliers(arg % 2 == 0),
            6 if arg % 2 == 0 => pane.press_outlier_button(),
            6 => pane.analyze_range("fuzz range"),
            7 => pane.click_popover(Popover::ALL[usize::from(arg) % Popover::ALL.len()]),
            8 => match timers.pop() {
                Some(id) => pane.handle(PaneEvent::TimerFired(id)),
                None => Vec::new(),
            },
            9 => match pending.pop() {
                Some(PaneEffect::FetchSeries { request, .. }) => pane.handle(PaneEvent::SeriesFetched {
                    request,
                    result: if arg % 7 == 0 {
                        Err(PerfError::transport("fuzz"))
                    } else {
                        Ok(build_series(&mut data))
                    },
                }),
                Some(PaneEffect::ComputeTrendLine(job)) => pane.handle(PaneEvent::TrendLineComputed {
                    version: job.version,
                    result: job.run(&LocalSegmentation),
                }),
                Some(PaneEffect::SubmitOutlierStatus { request, .. }) => {
                    pane.handle(PaneEvent::OutlierStatusSubmitted {
                        request,
                        result: if arg % 2 == 0 {
                            Ok(())
                        } else {
                            Err(PerfError::remote("NotAuthorized"))
                        },
                    })
                }
                Some(PaneEffect::CreateAnalysisTask { request, .. }) => {
                    pane.handle(PaneEvent::AnalysisTaskCreated {
                        request,
                        result: if arg % 3 == 0 {
                            Err(PerfError::remote("NotAuthorized"))
                        } else {
                            Ok(u64::from(arg))
                        },
                    })
                }
                _ => Vec::new(),
            },
            10 => {
                if let Some(state) = pane.serialize_state() {
                    pane.update_from_serialized_state(&state)
                } else {
                    Vec::new()
                }
            }
            _ => pane.close(),
        };
        for effect in effects {
            match effect {
                PaneEffect::ScheduleTimer { id, .. } => timers.push(id),
                PaneEffect::FetchSeries { .. }
                | PaneEffect::ComputeTrendLine(_)
                | PaneEffect::SubmitOutlierStatus { .. }
                | PaneEffect::CreateAnalysisTask { .. } => pending.push(effect),
                _ => {}
            }
        }
    }
});
