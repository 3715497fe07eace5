// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::state::ChartPaneState;
use crate::support::{PaneNotification, PaneSupport};
use serde::Serialize;
use std::collections::BTreeSet;

/// Action-toolbar popovers of a pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Popover {
    OtherPlatforms,
    Analyze,
    Filtering,
    TrendLines,
}

impl Popover {
    pub const ALL: [Popover; 4] = [
        Self::OtherPlatforms,
        Self::Analyze,
        Self::Filtering,
        Self::TrendLines,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::OtherPlatforms => "Other Platforms",
            Self::Analyze => "Analyze",
            Self::Filtering => "Filtering",
            Self::TrendLines => "Trend lines",
        }
    }

    /// The analyze form holds typed input, so it only opens on click.
    pub fn opens_on_hover(self) -> bool {
        self != Self::Analyze
    }
}

/// Popover visibility with at most one click-locked popover.
///
/// A click toggles the lock; showing any popover hides a different locked
/// one. Hover opens a popover only while nothing is locked, and leaving
/// closes it unless the pointer is still over its anchor or body.
#[derive(Clone, Debug, Default)]
pub struct PopoverManager {
    visible: BTreeSet<Popover>,
    locked: Option<Popover>,
    pointer_in_anchor: BTreeSet<Popover>,
    pointer_in_body: BTreeSet<Popover>,
}

impl PopoverManager {
    pub fn is_visible(&self, popover: Popover) -> bool {
        self.visible.contains(&popover)
    }

    pub fn locked(&self) -> Option<Popover> {
        self.locked
    }

    pub fn visible(&self) -> Vec<Popover> {
        self.visible.iter().copied().collect()
    }

    pub fn click(&mut self, popover: Popover) {
        let make_visible = self.locked != Some(popover);
        self.set_visibility(popover, make_visible);
        if make_visible {
            self.locked = Some(popover);
        }
    }

    pub fn anchor_enter(&mut self, popover: Popover) {
        if !popover.opens_on_hover() || self.locked.is_some() {
            return;
        }
        self.pointer_in_anchor.insert(popover);
        self.set_visibility(popover, true);
    }

    pub fn anchor_leave(&mut self, popover: Popover) {
        self.pointer_in_anchor.remove(&popover);
        self.close_if_needed(popover);
    }

    pub fn body_enter(&mut self, popover: Popover) {
        self.pointer_in_body.insert(popover);
    }

    pub fn body_leave(&mut self, popover: Popover) {
        self.pointer_in_body.remove(&popover);
        self.close_if_needed(popover);
    }

    pub fn hide_all(&mut self) {
        self.visible.clear();
        self.locked = None;
        self.pointer_in_anchor.clear();
        self.pointer_in_body.clear();
    }

    fn close_if_needed(&mut self, popover: Popover) {
        if self.locked != Some(popover)
            && !self.pointer_in_anchor.contains(&popover)
            && !self.pointer_in_body.contains(&popover)
        {
            self.set_visibility(popover, false);
        }
    }

    fn set_visibility(&mut self, popover: Popover, visible: bool) {
        if visible {
            self.visible.insert(popover);
        } else {
            self.visible.remove(&popover);
        }

        if visible
            && let Some(locked) = self.locked
            && locked != popover
        {
            self.set_visibility(locked, false);
        }
        if !visible && self.locked == Some(popover) {
            self.locked = None;
        }
    }
}

impl PaneSupport for PopoverManager {
    fn name(&self) -> &'static str {
        "popovers"
    }

    fn notify(&mut self, notification: &PaneNotification, _state: Option<&ChartPaneState>) {
        if matches!(
            notification,
            PaneNotification::Reconfigured { .. } | PaneNotification::Closed
        ) {
            self.hide_all();
        }
    }

    fn detach(&mut self) {
        self.hide_all();
    }
}
