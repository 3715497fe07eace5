// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Wire shapes of the dashboard's model endpoints.

use crate::status::BuildRequestStatus;
use perf_core::wire::{flexible_id, flexible_id_list, flexible_number, flexible_optional_id};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TriggerableRow {
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    pub name: String,
}

/// `GET /api/triggerables/`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TriggerablesPayload {
    #[serde(default)]
    pub triggerables: Vec<TriggerableRow>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RootRow {
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    #[serde(deserialize_with = "flexible_id")]
    pub repository: u64,
    pub revision: String,
    #[serde(default)]
    pub time: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RootSetRow {
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    #[serde(deserialize_with = "flexible_id_list")]
    pub roots: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequestRow {
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "flexible_optional_id")]
    pub triggerable: Option<u64>,
    #[serde(default, deserialize_with = "flexible_optional_id")]
    pub task: Option<u64>,
    #[serde(default, deserialize_with = "flexible_optional_id")]
    pub test_group: Option<u64>,
    #[serde(deserialize_with = "flexible_id")]
    pub platform: u64,
    #[serde(deserialize_with = "flexible_id")]
    pub test: u64,
    #[serde(deserialize_with = "flexible_number")]
    pub order: f64,
    #[serde(deserialize_with = "flexible_id")]
    pub root_set: u64,
    pub status: BuildRequestStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "flexible_optional_id")]
    pub build: Option<u64>,
    /// Unix milliseconds.
    #[serde(deserialize_with = "flexible_number")]
    pub created_at: f64,
}

/// `GET /api/build-requests/{triggerable}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequestsPayload {
    #[serde(default)]
    pub roots: Vec<RootRow>,
    #[serde(default)]
    pub root_sets: Vec<RootSetRow>,
    #[serde(default)]
    pub build_requests: Vec<BuildRequestRow>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlatformRow {
    pub name: String,
    #[serde(default, deserialize_with = "flexible_id_list")]
    pub metrics: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRow {
    pub name: String,
    #[serde(default, deserialize_with = "flexible_optional_id")]
    pub parent_id: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MetricRow {
    pub name: String,
    #[serde(deserialize_with = "flexible_id")]
    pub test: u64,
    #[serde(default)]
    pub aggregator: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RepositoryRow {
    pub name: String,
}

/// `GET /data/manifest.json`, reduced to the entities the chart pane and
/// build-request model resolve against. Maps are keyed by decimal id.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManifestPayload {
    #[serde(rename = "all")]
    pub platforms: BTreeMap<String, PlatformRow>,
    pub tests: BTreeMap<String, TestRow>,
    pub metrics: BTreeMap<String, MetricRow>,
    pub repositories: BTreeMap<String, RepositoryRow>,
}

#[cfg(test)]
mod tests {
    use super::{BuildRequestsPayload, ManifestPayload};
    use crate::status::BuildRequestStatus;
    use serde_json::json;

    #[test]
    fn build_request_payload_accepts_mixed_id_types() {
        let payload: BuildRequestsPayload = serde_json::from_value(json!({
            "status": "OK",
            "roots": [{"id": "5", "repository": 1, "revision": "r100"}],
            "rootSets": [{"id": 7, "roots": ["5"]}],
            "buildRequests": [{
                "id": "40",
                "triggerable": "2",
                "task": null,
                "testGroup": 3,
                "platform": "10",
                "test": 20,
                "order": "1",
                "rootSet": "7",
                "status": "scheduled",
                "url": null,
                "build": null,
                "createdAt": 1_700_000_000_000_i64
            }]
        }))
        .expect("payload decodes");

        assert_eq!(payload.roots[0].id, 5);
        assert_eq!(payload.root_sets[0].roots, vec![5]);
        let row = &payload.build_requests[0];
        assert_eq!(row.id, 40);
        assert_eq!(row.triggerable, Some(2));
        assert_eq!(row.task, None);
        assert_eq!(row.order, 1.0);
        assert_eq!(row.status, BuildRequestStatus::Scheduled);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = serde_json::from_value::<BuildRequestsPayload>(json!({
            "buildRequests": [{
                "id": 1, "platform": 1, "test": 1, "order": 0, "rootSet": 1,
                "status": "exploded", "createdAt": 0
            }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn manifest_sections_are_optional() {
        let manifest: ManifestPayload = serde_json::from_value(json!({
            "all": {"10": {"name": "Mac", "metrics": [1, "2"]}},
            "siteTitle": "Perf"
        }))
        .expect("manifest decodes");
        assert_eq!(manifest.platforms["10"].metrics, vec![1, 2]);
        assert!(manifest.tests.is_empty());
    }
}
