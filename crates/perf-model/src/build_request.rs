// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::entities::{Platform, RootSet, Test};
use crate::status::BuildRequestStatus;
use chrono::{DateTime, Utc};
use perf_core::{MeasurementPoint, PerfError};
use serde::Serialize;
use std::sync::Arc;

const WAITING_TIME_UNITS: [(&str, f64); 4] = [
    ("week", 7.0 * 24.0 * 3600.0),
    ("day", 24.0 * 3600.0),
    ("hour", 3600.0),
    ("minute", 60.0),
];

/// Resolved fields of a build request, as received from the server.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildRequestInit {
    pub triggerable_id: Option<u64>,
    pub analysis_task_id: Option<u64>,
    pub test_group_id: Option<u64>,
    pub platform: Arc<Platform>,
    pub test: Arc<Test>,
    pub order: i64,
    pub root_set: Arc<RootSet>,
    pub status: BuildRequestStatus,
    pub status_url: Option<String>,
    pub build_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// A scheduled performance test run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    id: u64,
    triggerable_id: Option<u64>,
    analysis_task_id: Option<u64>,
    test_group_id: Option<u64>,
    #[serde(serialize_with = "serialize_platform")]
    platform: Arc<Platform>,
    #[serde(serialize_with = "serialize_test")]
    test: Arc<Test>,
    order: i64,
    #[serde(serialize_with = "serialize_root_set")]
    root_set: Arc<RootSet>,
    status: BuildRequestStatus,
    status_url: Option<String>,
    build_id: Option<u64>,
    created_at: DateTime<Utc>,
    result: Option<MeasurementPoint>,
}

fn serialize_platform<S: serde::Serializer>(platform: &Arc<Platform>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(platform.id)
}

fn serialize_test<S: serde::Serializer>(test: &Arc<Test>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(test.id)
}

fn serialize_root_set<S: serde::Serializer>(root_set: &Arc<RootSet>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(root_set.id)
}

impl BuildRequest {
    pub fn new(id: u64, init: BuildRequestInit) -> Self {
        Self {
            id,
            triggerable_id: init.triggerable_id,
            analysis_task_id: init.analysis_task_id,
            test_group_id: init.test_group_id,
            platform: init.platform,
            test: init.test,
            order: init.order,
            root_set: init.root_set,
            status: init.status,
            status_url: init.status_url,
            build_id: init.build_id,
            created_at: init.created_at,
            result: None,
        }
    }

    /// Refreshes status, status URL and build id from a newer copy.
    ///
    /// The test group, order and root set identify the request and must not
    /// change; the status must not move backwards. A finished request only
    /// accepts an identical copy.
    pub fn update_from(&mut self, init: &BuildRequestInit) -> Result<(), PerfError> {
        if init.test_group_id != self.test_group_id {
            return Err(PerfError::invalid_input(format!(
                "build request {} cannot move from test group {:?} to {:?}",
                self.id, self.test_group_id, init.test_group_id
            )));
        }
        if init.order != self.order {
            return Err(PerfError::invalid_input(format!(
                "build request {} cannot change order from {} to {}",
                self.id, self.order, init.order
            )));
        }
        if init.root_set.id != self.root_set.id {
            return Err(PerfError::invalid_input(format!(
                "build request {} cannot change root set from {} to {}",
                self.id, self.root_set.id, init.root_set.id
            )));
        }
        if !self.status.can_transition_to(init.status) {
            return Err(PerfError::invalid_input(format!(
                "build request {} cannot go from {} to {}",
                self.id, self.status, init.status
            )));
        }
        if self.status.has_finished()
            && (init.status_url != self.status_url || init.build_id != self.build_id)
        {
            return Err(PerfError::invalid_input(format!(
                "build request {} has finished ({}) and cannot be modified",
                self.id, self.status
            )));
        }

        self.status = init.status;
        self.status_url.clone_from(&init.status_url);
        self.build_id = init.build_id;
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn triggerable_id(&self) -> Option<u64> {
        self.triggerable_id
    }

    pub fn analysis_task_id(&self) -> Option<u64> {
        self.analysis_task_id
    }

    pub fn test_group_id(&self) -> Option<u64> {
        self.test_group_id
    }

    pub fn platform(&self) -> &Arc<Platform> {
        &self.platform
    }

    pub fn test(&self) -> &Arc<Test> {
        &self.test
    }

    pub fn order(&self) -> i64 {
        self.order
    }

    pub fn root_set(&self) -> &Arc<RootSet> {
        &self.root_set
    }

    pub fn status(&self) -> BuildRequestStatus {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    pub fn status_url(&self) -> Option<&str> {
        self.status_url.as_deref()
    }

    pub fn build_id(&self) -> Option<u64> {
        self.build_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn has_finished(&self) -> bool {
        self.status.has_finished()
    }

    pub fn has_started(&self) -> bool {
        self.status.has_started()
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub fn is_scheduled(&self) -> bool {
        self.status.is_scheduled()
    }

    pub fn result(&self) -> Option<&MeasurementPoint> {
        self.result.as_ref()
    }

    /// Attaches a result. Group notification goes through
    /// `ModelStore::set_result`.
    pub(crate) fn attach_result(&mut self, result: MeasurementPoint) {
        self.result = Some(result);
    }

    /// Time since creation, as of `reference`. See [`format_waiting_time`].
    pub fn waiting_time(&self, reference: DateTime<Utc>) -> String {
        let elapsed = reference.signed_duration_since(self.created_at);
        format_waiting_time(elapsed.num_milliseconds() as f64 / 1000.0)
    }
}

/// Renders a duration in seconds with at most two units.
///
/// The first unit is the coarsest of week, day, hour whose length times 1.5
/// is exceeded, else minute. It is floored and followed by the next finer
/// unit, rounded; when the first unit is minute it stands alone, rounded.
/// Negative durations render as zero minutes.
pub fn format_waiting_time(elapsed_seconds: f64) -> String {
    let mut remaining = if elapsed_seconds.is_finite() {
        elapsed_seconds.max(0.0)
    } else {
        0.0
    };

    let last_index = WAITING_TIME_UNITS.len() - 1;
    let first = WAITING_TIME_UNITS
        .iter()
        .position(|(_, length)| remaining > 1.5 * length)
        .unwrap_or(last_index);
    let last = (first + 1).min(last_index);

    let mut parts = Vec::with_capacity(2);
    for (index, (unit, length)) in WAITING_TIME_UNITS.iter().enumerate().take(last + 1).skip(first) {
        let count = if index == last {
            (remaining / length).round()
        } else {
            (remaining / length).floor()
        };
        remaining -= count * length;
        let count = count as u64;
        let plural = if count == 1 { "" } else { "s" };
        parts.push(format!("{count} {unit}{plural}"));
    }
    parts.join(" ")
}
