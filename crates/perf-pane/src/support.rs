// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::state::ChartPaneState;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Lifecycle events a pane broadcasts to its supports.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PaneNotification {
    Reconfigured { platform_id: u64, metric_id: u64 },
    StateChanged,
    GraphOptionsChanged,
    TrendLineUpdated { version: u64 },
    Closed,
}

/// Behaviour attached to a pane.
///
/// `state` is the pane's current serializable state, absent while the pane
/// has no platform/metric pair.
pub trait PaneSupport {
    fn name(&self) -> &'static str;

    fn notify(&mut self, notification: &PaneNotification, state: Option<&ChartPaneState>);

    /// Called once when the support is removed or the pane closes.
    fn detach(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SupportId(usize);

/// Supports registered against one pane, notified in registration order.
#[derive(Default)]
pub struct SupportRegistry {
    next_id: usize,
    supports: Vec<(SupportId, Box<dyn PaneSupport>)>,
}

impl std::fmt::Debug for SupportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.supports.iter().map(|(id, support)| (id, support.name())))
            .finish()
    }
}

impl SupportRegistry {
    pub fn register(&mut self, support: Box<dyn PaneSupport>) -> SupportId {
        let id = SupportId(self.next_id);
        self.next_id += 1;
        self.supports.push((id, support));
        id
    }

    /// Detaches one support; the others keep receiving notifications.
    pub fn detach(&mut self, id: SupportId) -> bool {
        let Some(position) = self.supports.iter().position(|(candidate, _)| *candidate == id) else {
            return false;
        };
        let (_, mut support) = self.supports.remove(position);
        support.detach();
        true
    }

    pub fn detach_all(&mut self) {
        for (_, mut support) in self.supports.drain(..) {
            support.detach();
        }
    }

    pub fn broadcast(&mut self, notification: &PaneNotification, state: Option<&ChartPaneState>) {
        for (_, support) in &mut self.supports {
            support.notify(notification, state);
        }
    }

    pub fn len(&self) -> usize {
        self.supports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supports.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.supports.iter().map(|(_, support)| support.name()).collect()
    }
}

/// Records the positional deep link after every state-affecting
/// notification. The history is shared with whoever holds
/// [`DeepLinkRecorder::history`].
#[derive(Clone, Debug, Default)]
pub struct DeepLinkRecorder {
    history: Rc<RefCell<Vec<Value>>>,
    detached: Rc<RefCell<bool>>,
}

impl DeepLinkRecorder {
    pub fn history(&self) -> Rc<RefCell<Vec<Value>>> {
        Rc::clone(&self.history)
    }

    pub fn latest(&self) -> Option<Value> {
        self.history.borrow().last().cloned()
    }

    pub fn is_detached(&self) -> bool {
        *self.detached.borrow()
    }
}

impl PaneSupport for DeepLinkRecorder {
    fn name(&self) -> &'static str {
        "deep-link"
    }

    fn notify(&mut self, notification: &PaneNotification, state: Option<&ChartPaneState>) {
        if matches!(notification, PaneNotification::Closed) {
            return;
        }
        let Some(state) = state else {
            return;
        };
        let link = state.to_positional();
        let mut history = self.history.borrow_mut();
        if history.last() != Some(&link) {
            history.push(link);
        }
    }

    fn detach(&mut self) {
        *self.detached.borrow_mut() = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{DeepLinkRecorder, PaneNotification, PaneSupport, SupportRegistry};
    use crate::state::ChartPaneState;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counter {
        seen: Rc<RefCell<Vec<PaneNotification>>>,
    }

    impl PaneSupport for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn notify(&mut self, notification: &PaneNotification, _: Option<&ChartPaneState>) {
            self.seen.borrow_mut().push(notification.clone());
        }
    }

    #[test]
    fn supports_detach_independently() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorder = DeepLinkRecorder::default();
        let mut registry = SupportRegistry::default();
        let counter_id = registry.register(Box::new(Counter {
            seen: Rc::clone(&seen),
        }));
        registry.register(Box::new(recorder.clone()));
        assert_eq!(registry.names(), vec!["counter", "deep-link"]);

        let state = ChartPaneState::new(1, 2);
        registry.broadcast(&PaneNotification::StateChanged, Some(&state));
        assert!(registry.detach(counter_id));
        assert!(!registry.detach(counter_id));
        registry.broadcast(&PaneNotification::GraphOptionsChanged, Some(&state));

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(recorder.latest(), Some(json!([1, 2])));
        assert!(!recorder.is_detached());

        registry.detach_all();
        assert!(registry.is_empty());
        assert!(recorder.is_detached());
    }

    #[test]
    fn recorder_skips_duplicates_and_unconfigured_panes() {
        let mut recorder = DeepLinkRecorder::default();
        recorder.notify(&PaneNotification::StateChanged, None);
        let state = ChartPaneState::new(3, 4);
        recorder.notify(&PaneNotification::StateChanged, Some(&state));
        recorder.notify(&PaneNotification::GraphOptionsChanged, Some(&state));
        assert_eq!(recorder.history().borrow().len(), 1);
    }
}
