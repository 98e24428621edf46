//! Frame-driven enforcement loop around a [`Viewport`].

use std::time::Duration;

use lessonpath_core::{LessonConfig, Position};
use lessonpath_progress::ProgressionGraph;
use tokio::time::Instant;
use tracing::debug;

use crate::guard::{NavigationGuard, Verdict};
use crate::input::InputEvent;
use crate::viewport::Viewport;

/// Owns the viewport and the guard; applies verdicts as snaps.
///
/// Raw scroll events only arm a debounce deadline. Each frame the viewport is
/// polled and reconciled once the surface has been quiet long enough, or at
/// once if it moved without any scroll event. A corrective snap sets the
/// guard's enforcing flag, which is cleared on the following frame whether
/// the snap landed or the user already moved elsewhere, or at the next input
/// if the snap has landed by then.
#[derive(Debug)]
pub struct NavigationController<V: Viewport> {
    guard: NavigationGuard,
    viewport: V,
    debounce: Duration,
    scroll_deadline: Option<Instant>,
    snap_target: Option<Position>,
}

impl<V: Viewport> NavigationController<V> {
    /// Wrap a viewport; its current position is trusted as the start.
    pub fn new(viewport: V, config: &LessonConfig) -> Self {
        let start = viewport.position();
        Self {
            guard: NavigationGuard::from_config(config, start),
            viewport,
            debounce: config.guard.debounce(),
            scroll_deadline: None,
            snap_target: None,
        }
    }

    /// The guard.
    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// The viewport.
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// The viewport, for simulating user movement.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// Position currently shown.
    pub fn position(&self) -> Position {
        self.viewport.position()
    }

    /// Drop the guard's cached reach.
    pub fn invalidate_cache(&mut self) {
        self.guard.invalidate();
    }

    /// Move to a trusted position (session start, entering a node) and forget
    /// anything in flight.
    pub fn reset_to(&mut self, position: Position) {
        self.viewport.snap_to(position);
        self.guard.set_last_valid(self.viewport.position());
        self.guard.finish_enforcing();
        self.guard.invalidate();
        self.scroll_deadline = None;
        self.snap_target = None;
    }

    /// Check an input event and move the viewport accordingly.
    pub fn handle_input(&mut self, graph: &ProgressionGraph, event: &InputEvent) -> Verdict {
        self.release_landed_snap();
        let verdict = self.guard.intercept(graph, event);
        self.apply(&verdict);
        verdict
    }

    /// Programmatic move, checked like user input.
    pub fn jump_to(&mut self, graph: &ProgressionGraph, position: Position) -> Verdict {
        self.handle_input(graph, &InputEvent::SetPosition(position))
    }

    /// A raw scroll event arrived.
    pub fn on_scroll(&mut self, now: Instant) {
        self.scroll_deadline = Some(now + self.debounce);
    }

    /// Per-frame poll. Returns a verdict when a reconciliation happened.
    pub fn on_frame(&mut self, graph: &ProgressionGraph, now: Instant) -> Option<Verdict> {
        if let Some(target) = self.snap_target.take() {
            if self.viewport.position() != target {
                debug!("Corrective snap to {} superseded", target);
            }
            self.guard.finish_enforcing();
            return None;
        }

        let observed = self.viewport.position();
        if observed == self.guard.last_valid() {
            self.scroll_deadline = None;
            return None;
        }
        if self.scroll_deadline.is_some_and(|deadline| now < deadline) {
            return None;
        }
        self.scroll_deadline = None;

        let verdict = self.guard.reconcile(graph, observed);
        self.apply(&verdict);
        Some(verdict)
    }

    /// A snap that already reached its target holds no lock; drivers without a
    /// frame loop never get to observe it otherwise.
    fn release_landed_snap(&mut self) {
        if let Some(target) = self.snap_target {
            if self.viewport.position() == target {
                self.snap_target = None;
                self.guard.finish_enforcing();
            }
        }
    }

    fn apply(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Accepted { position, .. } => {
                if self.viewport.position() != *position {
                    self.viewport.snap_to(*position);
                }
            }
            Verdict::Redirected { to, .. } | Verdict::Blocked { held: to, .. } => {
                debug!("Corrective snap to {}", to);
                self.viewport.snap_to(*to);
                self.guard.begin_enforcing();
                self.snap_target = Some(*to);
            }
            Verdict::PassThrough | Verdict::Ignored | Verdict::Unchanged => {}
        }
    }
}
