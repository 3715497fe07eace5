// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use perf_core::MeasurementPoint;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: u64,
    pub name: String,
    pub metric_ids: Vec<u64>,
}

impl Platform {
    pub fn has_metric(&self, metric_id: u64) -> bool {
        self.metric_ids.contains(&metric_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Test {
    pub id: u64,
    pub name: String,
    #[serde(skip)]
    pub parent: Option<Arc<Test>>,
}

impl Test {
    /// Ancestor names joined with `" > "`, root first.
    pub fn full_name(&self) -> String {
        let mut names = vec![self.name.as_str()];
        let mut cursor = self.parent.as_deref();
        while let Some(test) = cursor {
            names.push(test.name.as_str());
            cursor = test.parent.as_deref();
        }
        names.reverse();
        names.join(" > ")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub id: u64,
    pub name: String,
    #[serde(skip)]
    pub test: Arc<Test>,
    pub aggregator: Option<String>,
}

impl Metric {
    /// `name : aggregator`, or just the name.
    pub fn label(&self) -> String {
        match &self.aggregator {
            Some(aggregator) => format!("{} : {aggregator}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} : {}", self.test.full_name(), self.label())
    }
}

/// One pinned revision of one repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Root {
    pub id: u64,
    #[serde(skip)]
    pub repository: Arc<Repository>,
    pub revision: String,
    pub time: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootSet {
    pub id: u64,
    #[serde(skip)]
    pub roots: Vec<Arc<Root>>,
}

impl RootSet {
    pub fn revision_for(&self, repository_id: u64) -> Option<&str> {
        self.roots
            .iter()
            .find(|root| root.repository.id == repository_id)
            .map(|root| root.revision.as_str())
    }

    pub fn repositories(&self) -> Vec<Arc<Repository>> {
        self.roots.iter().map(|root| Arc::clone(&root.repository)).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Triggerable {
    pub id: u64,
    pub name: String,
}

/// A group of build requests scheduled together, in `order`.
#[derive(Clone, Debug, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestGroup {
    pub id: u64,
    pub name: String,
    request_ids: Vec<(i64, u64)>,
    results: Vec<(u64, MeasurementPoint)>,
}

impl TestGroup {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Registers a request; requests stay sorted by order, then id.
    pub fn add_build_request(&mut self, order: i64, request_id: u64) {
        if self.request_ids.iter().any(|(_, id)| *id == request_id) {
            return;
        }
        let position = self
            .request_ids
            .partition_point(|entry| *entry < (order, request_id));
        self.request_ids.insert(position, (order, request_id));
    }

    pub fn build_request_ids(&self) -> Vec<u64> {
        self.request_ids.iter().map(|(_, id)| *id).collect()
    }

    /// Called by the store when a member request receives its result.
    pub fn did_set_result(&mut self, request_id: u64, result: MeasurementPoint) {
        match self.results.iter_mut().find(|(id, _)| *id == request_id) {
            Some(entry) => entry.1 = result,
            None => self.results.push((request_id, result)),
        }
    }

    pub fn result_for(&self, request_id: u64) -> Option<&MeasurementPoint> {
        self.results
            .iter()
            .find(|(id, _)| *id == request_id)
            .map(|(_, result)| result)
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Metric, Repository, Root, RootSet, Test, TestGroup};
    use perf_core::MeasurementPoint;
    use std::sync::Arc;

    fn suite() -> Arc<Test> {
        let root = Arc::new(Test {
            id: 1,
            name: "Speedometer".to_string(),
            parent: None,
        });
        Arc::new(Test {
            id: 2,
            name: "TodoMVC".to_string(),
            parent: Some(root),
        })
    }

    #[test]
    fn full_names_walk_the_parent_chain() {
        let test = suite();
        assert_eq!(test.full_name(), "Speedometer > TodoMVC");

        let metric = Metric {
            id: 9,
            name: "Time".to_string(),
            test,
            aggregator: Some("Total".to_string()),
        };
        assert_eq!(metric.label(), "Time : Total");
        assert_eq!(metric.full_name(), "Speedometer > TodoMVC : Time : Total");
    }

    #[test]
    fn root_sets_look_up_revisions_by_repository() {
        let webkit = Arc::new(Repository {
            id: 11,
            name: "WebKit".to_string(),
        });
        let root_set = RootSet {
            id: 3,
            roots: vec![Arc::new(Root {
                id: 5,
                repository: webkit,
                revision: "r1234".to_string(),
                time: None,
            })],
        };
        assert_eq!(root_set.revision_for(11), Some("r1234"));
        assert_eq!(root_set.revision_for(12), None);
        assert_eq!(root_set.repositories()[0].name, "WebKit");
    }

    #[test]
    fn groups_keep_requests_in_order_and_record_results() {
        let mut group = TestGroup::new(4, "A/B");
        group.add_build_request(2, 30);
        group.add_build_request(0, 10);
        group.add_build_request(1, 20);
        group.add_build_request(1, 20);
        assert_eq!(group.build_request_ids(), vec![10, 20, 30]);

        group.did_set_result(20, MeasurementPoint::new(7, 0, 1.5));
        group.did_set_result(20, MeasurementPoint::new(7, 0, 2.5));
        assert_eq!(group.result_count(), 1);
        assert_eq!(group.result_for(20).map(|p| p.value), Some(2.5));
    }
}
