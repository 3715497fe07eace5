// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::build_request::{BuildRequest, BuildRequestInit};
use crate::entities::{
    Metric, Platform, Repository, Root, RootSet, Test, TestGroup, Triggerable,
};
use crate::payload::{BuildRequestsPayload, ManifestPayload, TestRow, TriggerableRow};
use chrono::DateTime;
use perf_core::{MeasurementPoint, PerfError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Id-keyed registry of every model object the dashboard has seen.
///
/// Immutable entities are shared as `Arc`s; build requests and test groups
/// are owned here and mutated through the store.
#[derive(Clone, Debug, Default)]
pub struct ModelStore {
    repositories: BTreeMap<u64, Arc<Repository>>,
    platforms: BTreeMap<u64, Arc<Platform>>,
    tests: BTreeMap<u64, Arc<Test>>,
    metrics: BTreeMap<u64, Arc<Metric>>,
    roots: BTreeMap<u64, Arc<Root>>,
    root_sets: BTreeMap<u64, Arc<RootSet>>,
    triggerables: BTreeMap<u64, Triggerable>,
    test_groups: BTreeMap<u64, TestGroup>,
    build_requests: BTreeMap<u64, BuildRequest>,
}

fn parse_key(section: &str, key: &str) -> Result<u64, PerfError> {
    key.trim().parse::<u64>().map_err(|_| {
        PerfError::invalid_input(format!("manifest {section} key {key:?} is not an id"))
    })
}

fn unknown(kind: &str, id: u64, context: &str) -> PerfError {
    PerfError::invalid_input(format!("{context} references unknown {kind} {id}"))
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_repository(&mut self, repository: Repository) -> Arc<Repository> {
        let repository = Arc::new(repository);
        self.repositories.insert(repository.id, Arc::clone(&repository));
        repository
    }

    pub fn insert_platform(&mut self, platform: Platform) -> Arc<Platform> {
        let platform = Arc::new(platform);
        self.platforms.insert(platform.id, Arc::clone(&platform));
        platform
    }

    pub fn insert_test(&mut self, test: Test) -> Arc<Test> {
        let test = Arc::new(test);
        self.tests.insert(test.id, Arc::clone(&test));
        test
    }

    pub fn insert_metric(&mut self, metric: Metric) -> Arc<Metric> {
        let metric = Arc::new(metric);
        self.metrics.insert(metric.id, Arc::clone(&metric));
        metric
    }

    pub fn insert_test_group(&mut self, group: TestGroup) {
        self.test_groups.insert(group.id, group);
    }

    pub fn repository(&self, id: u64) -> Option<&Arc<Repository>> {
        self.repositories.get(&id)
    }

    pub fn platform(&self, id: u64) -> Option<&Arc<Platform>> {
        self.platforms.get(&id)
    }

    pub fn test(&self, id: u64) -> Option<&Arc<Test>> {
        self.tests.get(&id)
    }

    pub fn metric(&self, id: u64) -> Option<&Arc<Metric>> {
        self.metrics.get(&id)
    }

    pub fn root_set(&self, id: u64) -> Option<&Arc<RootSet>> {
        self.root_sets.get(&id)
    }

    pub fn test_group(&self, id: u64) -> Option<&TestGroup> {
        self.test_groups.get(&id)
    }

    pub fn build_request(&self, id: u64) -> Option<&BuildRequest> {
        self.build_requests.get(&id)
    }

    pub fn triggerables(&self) -> impl Iterator<Item = &Triggerable> {
        self.triggerables.values()
    }

    /// Registers platforms, tests, metrics and repositories from the manifest.
    ///
    /// Tests are resolved parent-first; a parent cycle or a metric naming an
    /// unknown test is an error and leaves the store unchanged.
    pub fn load_manifest(&mut self, manifest: &ManifestPayload) -> Result<(), PerfError> {
        let mut repositories = BTreeMap::new();
        for (key, row) in &manifest.repositories {
            let id = parse_key("repositories", key)?;
            repositories.insert(
                id,
                Arc::new(Repository {
                    id,
                    name: row.name.clone(),
                }),
            );
        }

        let mut test_rows = BTreeMap::new();
        for (key, row) in &manifest.tests {
            test_rows.insert(parse_key("tests", key)?, row);
        }
        let mut tests = BTreeMap::new();
        for &id in test_rows.keys() {
            resolve_test(id, &test_rows, &self.tests, &mut tests, &mut BTreeSet::new())?;
        }

        let mut metrics = BTreeMap::new();
        for (key, row) in &manifest.metrics {
            let id = parse_key("metrics", key)?;
            let test = tests
                .get(&row.test)
                .or_else(|| self.tests.get(&row.test))
                .cloned()
                .ok_or_else(|| unknown("test", row.test, &format!("metric {id}")))?;
            metrics.insert(
                id,
                Arc::new(Metric {
                    id,
                    name: row.name.clone(),
                    test,
                    aggregator: row.aggregator.clone(),
                }),
            );
        }

        let mut platforms = BTreeMap::new();
        for (key, row) in &manifest.platforms {
            let id = parse_key("all", key)?;
            platforms.insert(
                id,
                Arc::new(Platform {
                    id,
                    name: row.name.clone(),
                    metric_ids: row.metrics.clone(),
                }),
            );
        }

        info!(
            platforms = platforms.len(),
            tests = test_rows.len(),
            metrics = metrics.len(),
            repositories = repositories.len(),
            "loaded manifest"
        );
        self.repositories.extend(repositories);
        self.tests.extend(tests);
        self.metrics.extend(metrics);
        self.platforms.extend(platforms);
        Ok(())
    }

    pub fn set_triggerables(&mut self, rows: &[TriggerableRow]) -> Vec<Triggerable> {
        rows.iter()
            .map(|row| {
                let triggerable = Triggerable {
                    id: row.id,
                    name: row.name.clone(),
                };
                self.triggerables.insert(row.id, triggerable.clone());
                triggerable
            })
            .collect()
    }

    /// Rebuilds the build-request object graph from a
    /// `/api/build-requests/{triggerable}` payload.
    ///
    /// Every id is resolved before anything is stored, so an unknown
    /// reference leaves the store unchanged. Requests already known are
    /// refreshed in place. Returns the request ids in payload order.
    pub fn construct_build_requests_from_data(
        &mut self,
        payload: &BuildRequestsPayload,
    ) -> Result<Vec<u64>, PerfError> {
        let mut roots = BTreeMap::new();
        for row in &payload.roots {
            let repository = self
                .repositories
                .get(&row.repository)
                .cloned()
                .ok_or_else(|| unknown("repository", row.repository, &format!("root {}", row.id)))?;
            roots.insert(
                row.id,
                Arc::new(Root {
                    id: row.id,
                    repository,
                    revision: row.revision.clone(),
                    time: row.time,
                }),
            );
        }

        let mut root_sets = BTreeMap::new();
        for row in &payload.root_sets {
            let members = row
                .roots
                .iter()
                .map(|root_id| {
                    roots
                        .get(root_id)
                        .or_else(|| self.roots.get(root_id))
                        .cloned()
                        .ok_or_else(|| unknown("root", *root_id, &format!("root set {}", row.id)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            root_sets.insert(
                row.id,
                Arc::new(RootSet {
                    id: row.id,
                    roots: members,
                }),
            );
        }

        let mut inits = Vec::with_capacity(payload.build_requests.len());
        for row in &payload.build_requests {
            let context = format!("build request {}", row.id);
            let platform = self
                .platforms
                .get(&row.platform)
                .cloned()
                .ok_or_else(|| unknown("platform", row.platform, &context))?;
            let test = self
                .tests
                .get(&row.test)
                .cloned()
                .ok_or_else(|| unknown("test", row.test, &context))?;
            let root_set = root_sets
                .get(&row.root_set)
                .or_else(|| self.root_sets.get(&row.root_set))
                .cloned()
                .ok_or_else(|| unknown("root set", row.root_set, &context))?;
            let created_at = DateTime::from_timestamp_millis(row.created_at as i64)
                .ok_or_else(|| {
                    PerfError::invalid_input(format!(
                        "{context} has out-of-range createdAt {}",
                        row.created_at
                    ))
                })?;
            let init = BuildRequestInit {
                triggerable_id: row.triggerable,
                analysis_task_id: row.task,
                test_group_id: row.test_group,
                platform,
                test,
                order: row.order as i64,
                root_set,
                status: row.status,
                status_url: row.url.clone(),
                build_id: row.build,
                created_at,
            };
            if let Some(existing) = self.build_requests.get(&row.id) {
                let mut candidate = existing.clone();
                candidate.update_from(&init)?;
            }
            inits.push((row.id, init));
        }

        self.roots.extend(roots);
        self.root_sets.extend(root_sets);
        let mut ids = Vec::with_capacity(inits.len());
        for (id, init) in inits {
            if let Some(existing) = self.build_requests.get_mut(&id) {
                existing.update_from(&init)?;
                debug!(request = id, status = %init.status, "refreshed build request");
            } else {
                if let Some(group_id) = init.test_group_id
                    && let Some(group) = self.test_groups.get_mut(&group_id)
                {
                    group.add_build_request(init.order, id);
                }
                self.build_requests.insert(id, BuildRequest::new(id, init));
            }
            ids.push(id);
        }

        info!(requests = ids.len(), "constructed build requests");
        Ok(ids)
    }

    /// Cached build requests scheduled by `triggerable_id`, by id.
    pub fn cached_requests_for_triggerable(&self, triggerable_id: u64) -> Vec<&BuildRequest> {
        self.build_requests
            .values()
            .filter(|request| request.triggerable_id() == Some(triggerable_id))
            .collect()
    }

    /// Attaches `result` to a request and notifies its test group.
    pub fn set_result(&mut self, request_id: u64, result: MeasurementPoint) -> Result<(), PerfError> {
        let request = self.build_requests.get_mut(&request_id).ok_or_else(|| {
            PerfError::invalid_input(format!("unknown build request {request_id}"))
        })?;
        request.attach_result(result.clone());
        match request
            .test_group_id()
            .and_then(|group_id| self.test_groups.get_mut(&group_id))
        {
            Some(group) => group.did_set_result(request_id, result),
            None => debug!(request = request_id, "result set on request without a loaded test group"),
        }
        Ok(())
    }
}

fn resolve_test(
    id: u64,
    rows: &BTreeMap<u64, &TestRow>,
    existing: &BTreeMap<u64, Arc<Test>>,
    resolved: &mut BTreeMap<u64, Arc<Test>>,
    visiting: &mut BTreeSet<u64>,
) -> Result<Arc<Test>, PerfError> {
    if let Some(test) = resolved.get(&id) {
        return Ok(Arc::clone(test));
    }
    let Some(row) = rows.get(&id) else {
        return existing
            .get(&id)
            .cloned()
            .ok_or_else(|| unknown("test", id, "test hierarchy"));
    };
    if !visiting.insert(id) {
        return Err(PerfError::invalid_input(format!(
            "test {id} is its own ancestor"
        )));
    }
    let parent = match row.parent_id {
        Some(parent_id) => Some(resolve_test(parent_id, rows, existing, resolved, visiting)?),
        None => None,
    };
    visiting.remove(&id);

    let test = Arc::new(Test {
        id,
        name: row.name.clone(),
        parent,
    });
    resolved.insert(id, Arc::clone(&test));
    Ok(test)
}
