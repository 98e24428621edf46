//! Navigation guard - makes a freely scrollable surface obey the progression state.
//!
//! The guard only ever reads the graph. Every attempted move is reduced to a
//! candidate position and checked against the furthest reachable position,
//! the boundary of the node being worked on, and the reentry policy:
//!
//! - forward moves land on the first legal position at or after the candidate,
//!   or are reverted with a reason;
//! - backward moves are never blocked, only redirected to the nearest legal
//!   position at or below the candidate.

use lessonpath_core::{
    BlockReason, Direction, GuardConfig, LessonConfig, Node, NodeId, Position, ProgressionError,
    ReentryPolicy,
};
use lessonpath_progress::ProgressionGraph;
use tracing::{debug, info};

use crate::input::{InputEvent, KeyIntent};

/// Outcome of checking one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Not a navigation input (e.g. an unrelated key)
    PassThrough,
    /// Below threshold, or a corrective snap is still in flight
    Ignored,
    /// The attempt targets the position already held
    Unchanged,
    /// The candidate is legal
    Accepted {
        /// New position
        position: Position,
        /// Its owner, if any
        node: Option<NodeId>,
    },
    /// The candidate was illegal; a nearby legal position was chosen
    Redirected {
        /// Attempted position
        from: Position,
        /// Position snapped to
        to: Position,
        /// Its owner, if any
        node: Option<NodeId>,
    },
    /// A forward attempt was reverted
    Blocked {
        /// Attempted position
        attempted: Position,
        /// Position held
        held: Position,
        /// Attempted direction
        direction: Direction,
        /// Why
        reason: BlockReason,
    },
}

impl Verdict {
    /// Where the viewport should end up, if the verdict moves or holds it.
    pub fn target(&self) -> Option<Position> {
        match self {
            Verdict::Accepted { position, .. } => Some(*position),
            Verdict::Redirected { to, .. } => Some(*to),
            Verdict::Blocked { held, .. } => Some(*held),
            _ => None,
        }
    }

    /// Node owning the settled position.
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Verdict::Accepted { node, .. } | Verdict::Redirected { node, .. } => node.as_ref(),
            _ => None,
        }
    }

    /// Whether the attempt was reverted.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }

    /// The attempted move as an error, when it was illegal.
    pub fn as_error(&self) -> Option<ProgressionError> {
        match self {
            Verdict::Redirected {
                from: attempted,
                to: settled,
                ..
            } => Some(ProgressionError::IllegalTransition {
                from: *settled,
                to: *attempted,
            }),
            Verdict::Blocked { attempted, held, .. } => Some(ProgressionError::IllegalTransition {
                from: *held,
                to: *attempted,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ReachCache {
    revision: u64,
    max: Position,
}

/// Intercepts input and reconciles observed positions.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    config: GuardConfig,
    policy: ReentryPolicy,
    last_valid: Position,
    cache: Option<ReachCache>,
    enforcing: bool,
}

impl NavigationGuard {
    /// Create a guard holding `start`.
    pub fn new(config: GuardConfig, policy: ReentryPolicy, start: Position) -> Self {
        Self {
            config,
            policy,
            last_valid: start,
            cache: None,
            enforcing: false,
        }
    }

    /// Create a guard from a lesson's configuration.
    pub fn from_config(config: &LessonConfig, start: Position) -> Self {
        Self::new(config.guard.clone(), config.reentry.clone(), start)
    }

    /// Thresholds in use.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Last position that passed the checks.
    pub fn last_valid(&self) -> Position {
        self.last_valid
    }

    /// Trust a position without checking it (session start, reset).
    pub fn set_last_valid(&mut self, position: Position) {
        self.last_valid = position;
    }

    /// Whether a corrective snap is in flight.
    pub fn is_enforcing(&self) -> bool {
        self.enforcing
    }

    /// A corrective snap was issued.
    pub fn begin_enforcing(&mut self) {
        self.enforcing = true;
    }

    /// The corrective snap landed or was superseded.
    pub fn finish_enforcing(&mut self) {
        self.enforcing = false;
    }

    /// Drop the cached reach (after completions).
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Furthest reachable position, cached per graph revision.
    pub fn max_reachable(&mut self, graph: &ProgressionGraph) -> Position {
        match self.cache {
            Some(cache) if cache.revision == graph.revision() => return cache.max,
            Some(cache) => {
                let err = ProgressionError::StaleCache {
                    cached: cache.revision,
                    actual: graph.revision(),
                };
                debug!("Recomputing reach: {}", err);
            }
            None => {}
        }

        let max = graph.max_reachable_position();
        self.cache = Some(ReachCache {
            revision: graph.revision(),
            max,
        });
        max
    }

    /// Check one input event.
    pub fn intercept(&mut self, graph: &ProgressionGraph, event: &InputEvent) -> Verdict {
        if self.enforcing {
            debug!("Ignoring {:?}: corrective snap in flight", event);
            return Verdict::Ignored;
        }

        let candidate = match event {
            InputEvent::Drag { delta } => {
                if delta.abs() < self.config.drag_threshold {
                    return Verdict::Ignored;
                }
                self.step(*delta < 0.0)
            }
            InputEvent::Wheel { delta } => {
                if delta.abs() < self.config.wheel_threshold {
                    return Verdict::Ignored;
                }
                self.step(*delta > 0.0)
            }
            InputEvent::Key(key) => match key.intent() {
                None => return Verdict::PassThrough,
                Some(KeyIntent::Advance) => self.step(true),
                Some(KeyIntent::Retreat) => self.step(false),
                Some(KeyIntent::First) => Some(0),
                Some(KeyIntent::Last) => return self.evaluate_last(graph),
            },
            InputEvent::SetPosition(position) => Some(*position),
        };

        match candidate {
            Some(candidate) => self.evaluate(graph, candidate),
            None => Verdict::Unchanged,
        }
    }

    /// Check a position the surface reached on its own.
    pub fn reconcile(&mut self, graph: &ProgressionGraph, observed: Position) -> Verdict {
        if self.enforcing {
            return Verdict::Ignored;
        }
        self.evaluate(graph, observed)
    }

    fn step(&self, forward: bool) -> Option<Position> {
        if forward {
            self.last_valid.checked_add(1)
        } else {
            self.last_valid.checked_sub(1)
        }
    }

    fn evaluate(&mut self, graph: &ProgressionGraph, candidate: Position) -> Verdict {
        match Direction::between(self.last_valid, candidate) {
            None => Verdict::Unchanged,
            Some(Direction::Forward) => self.evaluate_forward(graph, candidate),
            Some(Direction::Backward) => self.evaluate_backward(graph, candidate),
        }
    }

    fn evaluate_forward(&mut self, graph: &ProgressionGraph, candidate: Position) -> Verdict {
        let from = self.last_valid;
        let max = self.max_reachable(graph);
        let open_exit = graph
            .current_node()
            .filter(|n| !graph.is_completed(&n.id))
            .and_then(Node::exit_position);

        if open_exit == Some(from) {
            return self.block(candidate, Direction::Forward, BlockReason::BoundaryNotCompleted);
        }

        // Momentum may not carry past the boundary of the node being worked on.
        let clamp = open_exit.filter(|&exit| exit > from && exit <= max);
        let limit = clamp.unwrap_or(max);

        if let Some(position) = (candidate..=limit).find(|&p| self.is_open(graph, p)) {
            return self.settle(graph, candidate, position);
        }

        let reason = match clamp {
            Some(exit) if candidate > exit => BlockReason::BoundaryNotCompleted,
            _ => BlockReason::TargetLocked,
        };
        self.block(candidate, Direction::Forward, reason)
    }

    /// `End`: the furthest legal position ahead, instead of the first one.
    fn evaluate_last(&mut self, graph: &ProgressionGraph) -> Verdict {
        let from = self.last_valid;
        let max = self.max_reachable(graph);
        if max <= from {
            return Verdict::Unchanged;
        }

        let open_exit = graph
            .current_node()
            .filter(|n| !graph.is_completed(&n.id))
            .and_then(Node::exit_position)
            .filter(|&exit| exit >= from);
        let limit = open_exit.map_or(max, |exit| exit.min(max));

        match ((from + 1)..=limit).rev().find(|&p| self.is_open(graph, p)) {
            Some(position) => self.settle(graph, max, position),
            None => self.evaluate_forward(graph, max),
        }
    }

    fn evaluate_backward(&mut self, graph: &ProgressionGraph, candidate: Position) -> Verdict {
        let from = self.last_valid;
        let below = (0..=candidate).rev().find(|&p| self.is_open(graph, p));
        let above = || ((candidate + 1)..from).find(|&p| self.is_open(graph, p));

        let position = below.or_else(above).unwrap_or(from);
        self.settle(graph, candidate, position)
    }

    /// Whether a position may be shown. Unowned positions are always legal
    /// here; forward scans never look past the reach limit.
    fn is_open(&self, graph: &ProgressionGraph, position: Position) -> bool {
        let Some(node) = graph.node_for_position(position) else {
            return true;
        };
        if graph.state().current() == &node.id {
            return true;
        }
        let accessible =
            graph.is_unlocked(&node.id) || (node.is_branch() && graph.is_accessed(&node.id));
        accessible
            && self.policy.is_active(
                &node.kind,
                graph.was_entered(&node.id),
                graph.is_completed(&node.id),
            )
    }

    fn settle(&mut self, graph: &ProgressionGraph, candidate: Position, position: Position) -> Verdict {
        self.last_valid = position;
        let node = graph.node_for_position(position).map(|n| n.id.clone());

        if position == candidate {
            Verdict::Accepted { position, node }
        } else {
            debug!("Redirecting {} -> {}", candidate, position);
            Verdict::Redirected {
                from: candidate,
                to: position,
                node,
            }
        }
    }

    fn block(&self, attempted: Position, direction: Direction, reason: BlockReason) -> Verdict {
        let verdict = Verdict::Blocked {
            attempted,
            held: self.last_valid,
            direction,
            reason,
        };
        if let Some(err) = verdict.as_error() {
            info!("Navigation blocked ({}): {}", reason, err);
        }
        verdict
    }
}
