// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use serde::Serialize;
use std::collections::BTreeMap;

/// Handle of a scheduled timer. Ids are never reused within a pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimerId(u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A parameter edit waiting for its quiet period to elapse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingParameter {
    pub index: usize,
    pub value: f64,
}

/// Bookkeeping for debounced trend-line parameter edits.
///
/// Every edit gets its own timer. Nothing is cancelled eagerly: when a timer
/// fires the caller compares the stored value against the current one, so
/// an edit that was overwritten in the meantime is dropped then.
#[derive(Clone, Debug, Default)]
pub struct Debouncer {
    next_id: u64,
    pending: BTreeMap<TimerId, PendingParameter>,
}

impl Debouncer {
    pub fn schedule(&mut self, index: usize, value: f64) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert(id, PendingParameter { index, value });
        id
    }

    /// Removes and returns the edit behind `id`, if it is still pending.
    pub fn take(&mut self, id: TimerId) -> Option<PendingParameter> {
        self.pending.remove(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
