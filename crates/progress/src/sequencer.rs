//! Transition sequencer - paces the visible steps of a multi-step unlock.
//!
//! Completion updates the state atomically; what is paced here is only what
//! the user gets to see: the hub opening, then its branches unlocking, or the
//! cursor travelling back to a hub. While a sequence is in flight no new
//! completion or transition is accepted; callers retry or drop the request.
//!
//! ```text
//! Idle ──fan-out──▶ AnimatingFanout ──hub_open──▶ hub cue ──fanout──▶ branch cues ──settle──▶ Idle
//! Idle ──branch───▶ AnimatingReturn ──return────▶ return cue ──settle──▶ Idle
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use lessonpath_core::{NodeId, NotificationKind, ProgressionError, SequencerConfig};
use tokio::time::Instant;
use tracing::debug;

use crate::outcome::{CompletionEffect, CompletionOutcome};

/// Sequencer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerPhase {
    /// Accepting requests
    Idle,
    /// A completed branch is handing the cursor back to its hub
    AnimatingReturn,
    /// A hub and its branches are being revealed
    AnimatingFanout,
}

/// Something the session must act on when its moment arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    /// Publish a notification
    Notify(NotificationKind),
    /// Move the cursor back to a hub after a branch completed
    ReturnToHub {
        /// The hub
        hub: NodeId,
        /// The completed branch
        branch: NodeId,
    },
}

/// Explicit state machine replacing chained timers.
#[derive(Debug)]
pub struct TransitionSequencer {
    config: SequencerConfig,
    phase: SequencerPhase,
    pending: VecDeque<(Instant, Cue)>,
    release_at: Option<Instant>,
}

impl TransitionSequencer {
    /// Create an idle sequencer.
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            config,
            phase: SequencerPhase::Idle,
            pending: VecDeque::new(),
            release_at: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SequencerPhase {
        self.phase
    }

    /// Whether new requests are accepted.
    pub fn is_idle(&self) -> bool {
        self.phase == SequencerPhase::Idle
    }

    /// Reject a request while a sequence is in flight.
    pub fn ensure_idle(&self) -> Result<(), ProgressionError> {
        if self.is_idle() {
            Ok(())
        } else {
            debug!("Rejecting request: sequencer is {:?}", self.phase);
            Err(ProgressionError::Busy)
        }
    }

    /// When the next step is due, if anything is in flight.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .front()
            .map(|(at, _)| *at)
            .or(self.release_at)
    }

    /// Plan the visible steps of a completion. Returns cues due immediately.
    pub fn schedule(&mut self, outcome: &CompletionOutcome, now: Instant) -> Vec<Cue> {
        let mut immediate = Vec::new();
        let ms = Duration::from_millis;

        match &outcome.effect {
            CompletionEffect::AlreadyCompleted => {}
            CompletionEffect::Terminal => {
                immediate.push(Cue::Notify(NotificationKind::LessonCompleted {
                    node: outcome.node.clone(),
                }));
            }
            CompletionEffect::Advanced { fanouts } => {
                let in_burst = |id: &NodeId| {
                    fanouts
                        .iter()
                        .any(|f| f.hub == *id || f.branches.contains(id))
                };
                for id in outcome.unlocked.iter().filter(|id| !in_burst(id)) {
                    immediate.push(Cue::Notify(NotificationKind::NodeUnlocked { node: id.clone() }));
                }

                if !fanouts.is_empty() {
                    self.phase = SequencerPhase::AnimatingFanout;
                    let hub_at = now + ms(self.config.hub_open_ms);
                    let branches_at = hub_at + ms(self.config.fanout_ms);
                    for fanout in fanouts {
                        self.pending.push_back((
                            hub_at,
                            Cue::Notify(NotificationKind::NodeUnlocked { node: fanout.hub.clone() }),
                        ));
                    }
                    for fanout in fanouts {
                        for branch in &fanout.branches {
                            self.pending.push_back((
                                branches_at,
                                Cue::Notify(NotificationKind::NodeUnlocked { node: branch.clone() }),
                            ));
                        }
                    }
                    self.release_at = Some(branches_at + ms(self.config.settle_ms));
                }
            }
            CompletionEffect::Converged { hub, gate } => {
                let at = self.begin_return(hub, &outcome.node, now);
                if let Some(gate) = gate.as_ref().filter(|g| outcome.unlocked.contains(g)) {
                    self.pending.push_back((
                        at,
                        Cue::Notify(NotificationKind::NodeUnlocked { node: gate.clone() }),
                    ));
                }
            }
            CompletionEffect::RemainingBranches { hub, remaining } => {
                let at = self.begin_return(hub, &outcome.node, now);
                self.pending.push_back((
                    at,
                    Cue::Notify(NotificationKind::RemainingBranches {
                        hub: hub.clone(),
                        remaining: remaining.clone(),
                    }),
                ));
            }
        }

        if !self.is_idle() {
            debug!("Sequencer entered {:?} for '{}'", self.phase, outcome.node);
        }
        immediate
    }

    fn begin_return(&mut self, hub: &NodeId, branch: &NodeId, now: Instant) -> Instant {
        self.phase = SequencerPhase::AnimatingReturn;
        let at = now + Duration::from_millis(self.config.return_ms);
        self.pending.push_back((
            at,
            Cue::ReturnToHub {
                hub: hub.clone(),
                branch: branch.clone(),
            },
        ));
        self.release_at = Some(at + Duration::from_millis(self.config.settle_ms));
        at
    }

    /// Release every cue whose moment has come, in order; go idle once settled.
    pub fn tick(&mut self, now: Instant) -> Vec<Cue> {
        let mut due = Vec::new();
        while let Some((at, _)) = self.pending.front() {
            if *at > now {
                break;
            }
            if let Some((_, cue)) = self.pending.pop_front() {
                due.push(cue);
            }
        }

        if self.pending.is_empty() {
            if let Some(release) = self.release_at {
                if now >= release {
                    debug!("Sequencer settled from {:?}", self.phase);
                    self.release_at = None;
                    self.phase = SequencerPhase::Idle;
                }
            }
        }
        due
    }

    /// Drop anything in flight (new-session boundary).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.release_at = None;
        self.phase = SequencerPhase::Idle;
    }
}

impl Default for TransitionSequencer {
    fn default() -> Self {
        Self::new(SequencerConfig::default())
    }
}
