//! Tunables for input interception, transition pacing and review policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::node::NodeKind;

/// Full lesson configuration. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    /// Input interception
    pub guard: GuardConfig,
    /// Unlock animation pacing
    pub sequencer: SequencerConfig,
    /// Which kinds stay reachable for review
    pub reentry: ReentryPolicy,
}

/// Input thresholds and scroll debounce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Minimum drag displacement (px) that counts as a navigation attempt
    pub drag_threshold: f64,
    /// Minimum wheel delta that counts as a navigation attempt
    pub wheel_threshold: f64,
    /// Quiet period after a raw scroll event before reconciling
    pub debounce_ms: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 50.0,
            wheel_threshold: 10.0,
            debounce_ms: 150,
        }
    }
}

impl GuardConfig {
    /// Debounce as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Delays between the steps of a multi-step unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Hub opens after this delay
    pub hub_open_ms: u64,
    /// Hub children unlock this long after the hub opened
    pub fanout_ms: u64,
    /// Further input is accepted this long after the last unlock
    pub settle_ms: u64,
    /// Cursor returns to the hub this long after a branch completes
    pub return_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            hub_open_ms: 600,
            fanout_ms: 800,
            settle_ms: 400,
            return_ms: 500,
        }
    }
}

/// Per-kind rule for revisiting nodes that are already completed.
///
/// Linear, gate and hub nodes stay reachable once unlocked. A branch is reachable
/// once it has been entered; once completed it is reachable only when
/// `branch_review` is on. Sibling branches never entered are not reachable by scrolling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReentryPolicy {
    /// Completed branches may be scrolled back into
    pub branch_review: bool,
}

impl Default for ReentryPolicy {
    fn default() -> Self {
        Self { branch_review: true }
    }
}

impl ReentryPolicy {
    /// Whether a node of `kind` may be scrolled into.
    pub fn is_active(&self, kind: &NodeKind, is_entered: bool, is_completed: bool) -> bool {
        match kind {
            NodeKind::Linear | NodeKind::Gate | NodeKind::Hub { .. } => true,
            NodeKind::Branch { .. } if is_completed => self.branch_review,
            NodeKind::Branch { .. } => is_entered,
        }
    }
}
