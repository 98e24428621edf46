//! One learner working through one lesson.

use lessonpath_core::{
    BlockReason, Direction, LessonConfig, Node, NodeId, Notification, NotificationKind, Position,
};
use lessonpath_navigation::{InputEvent, NavigationController, Verdict, Viewport};
use lessonpath_progress::{
    CompletionEffect, CompletionOutcome, Cue, EntryOutcome, ProgressSummary, ProgressionGraph,
    SequencerPhase, TransitionSequencer,
};
use lessonpath_storage::{KeyValueStore, ProgressStore};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Capacity of the notification channel.
pub const CHANNEL_CAPACITY: usize = 64;

/// Graph, guard, sequencer and store wired together.
///
/// Every mutating operation persists before it returns, so what is saved is
/// never behind the unlock set the guard enforces.
pub struct LessonSession<K: KeyValueStore, V: Viewport> {
    graph: ProgressionGraph,
    nav: NavigationController<V>,
    sequencer: TransitionSequencer,
    store: ProgressStore<K>,
    bus: broadcast::Sender<Notification>,
}

impl<K: KeyValueStore, V: Viewport> LessonSession<K, V> {
    /// Adopt persisted progress and place the viewport inside the current node.
    pub async fn open(
        mut graph: ProgressionGraph,
        config: &LessonConfig,
        store: ProgressStore<K>,
        viewport: V,
    ) -> Self {
        let state = store.load(graph.root()).await;
        graph.adopt(state);

        let shown = viewport.position();
        let start = match graph.current_node() {
            Some(node) if node.owns(shown) => shown,
            Some(node) => node.first_position().unwrap_or(shown),
            None => shown,
        };

        let mut nav = NavigationController::new(viewport, config);
        nav.reset_to(start);
        info!(
            "Opened lesson at '{}' (position {})",
            graph.state().current(),
            start
        );

        let (bus, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            graph,
            nav,
            sequencer: TransitionSequencer::new(config.sequencer.clone()),
            store,
            bus,
        }
    }

    /// Receive notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.bus.subscribe()
    }

    /// The graph and its state.
    pub fn graph(&self) -> &ProgressionGraph {
        &self.graph
    }

    /// The navigation controller.
    pub fn controller(&self) -> &NavigationController<V> {
        &self.nav
    }

    /// The navigation controller, for moving the viewport directly.
    pub fn controller_mut(&mut self) -> &mut NavigationController<V> {
        &mut self.nav
    }

    /// The progress store, for neighbouring keys.
    pub fn store_mut(&mut self) -> &mut ProgressStore<K> {
        &mut self.store
    }

    /// Position currently shown.
    pub fn position(&self) -> Position {
        self.nav.position()
    }

    /// Sequencer phase.
    pub fn phase(&self) -> SequencerPhase {
        self.sequencer.phase()
    }

    /// Progress summary.
    pub fn summary(&self) -> ProgressSummary {
        self.graph.progress_summary()
    }

    /// Record that a node's exit condition was satisfied.
    pub async fn complete_node(&mut self, id: &NodeId, now: Instant) -> Result<CompletionOutcome> {
        self.pump(now).await?;
        self.sequencer.ensure_idle()?;

        let outcome = self.graph.complete_node(id)?;
        if outcome.effect == CompletionEffect::AlreadyCompleted {
            return Ok(outcome);
        }
        self.persist().await?;
        if !outcome.unlocked.is_empty() {
            self.nav.invalidate_cache();
        }

        let immediate = self.sequencer.schedule(&outcome, now);
        self.process(immediate).await?;
        Ok(outcome)
    }

    /// Move the cursor into a node and show its first position.
    pub async fn enter_node(&mut self, id: &NodeId, now: Instant) -> Result<EntryOutcome> {
        self.pump(now).await?;
        self.sequencer.ensure_idle()?;
        self.enter(id).await
    }

    /// Feed one input event through the guard.
    pub async fn handle_input(&mut self, event: &InputEvent, now: Instant) -> Result<Verdict> {
        self.pump(now).await?;
        if !self.sequencer.is_idle() {
            debug!("Dropping input while {:?}", self.sequencer.phase());
            return Ok(Verdict::Ignored);
        }

        let verdict = self.nav.handle_input(&self.graph, event);
        self.after_verdict(&verdict).await?;
        Ok(verdict)
    }

    /// A raw scroll event arrived.
    pub fn on_scroll(&mut self, now: Instant) {
        self.nav.on_scroll(now);
    }

    /// Per-frame tick: advance the sequencer, then reconcile the viewport.
    pub async fn on_frame(&mut self, now: Instant) -> Result<Option<Verdict>> {
        self.pump(now).await?;
        if !self.sequencer.is_idle() {
            return Ok(None);
        }

        let verdict = self.nav.on_frame(&self.graph, now);
        if let Some(verdict) = &verdict {
            self.after_verdict(verdict).await?;
        }
        Ok(verdict)
    }

    /// Sleep through whatever the sequencer still has scheduled.
    pub async fn run_until_idle(&mut self) -> Result<()> {
        while let Some(deadline) = self.sequencer.next_deadline() {
            tokio::time::sleep_until(deadline).await;
            self.pump(deadline).await?;
        }
        Ok(())
    }

    /// Play everything still scheduled without waiting (headless drivers).
    pub async fn fast_forward(&mut self) -> Result<()> {
        while let Some(deadline) = self.sequencer.next_deadline() {
            self.pump(deadline).await?;
        }
        Ok(())
    }

    /// Start over: initial state, persisted, viewport at the root.
    pub async fn reset(&mut self) -> Result<()> {
        self.sequencer.clear();
        self.graph.reset();
        self.store.clear().await?;
        self.persist().await?;

        let start = self
            .graph
            .first_position(self.graph.root())
            .unwrap_or_else(|| self.nav.position());
        self.nav.reset_to(start);
        Ok(())
    }

    async fn enter(&mut self, id: &NodeId) -> Result<EntryOutcome> {
        let entry = self.graph.enter_node(id)?;
        self.persist().await?;
        self.nav.invalidate_cache();
        if entry.changed {
            self.publish(NotificationKind::NodeEntered { node: id.clone() });
        }

        let shown = self.nav.position();
        let target = self
            .graph
            .node(id)
            .filter(|node| !node.owns(shown))
            .and_then(Node::first_position);
        if let Some(position) = target {
            debug!("Showing '{}' from position {}", id, position);
            self.nav.reset_to(position);
        }
        Ok(entry)
    }

    async fn after_verdict(&mut self, verdict: &Verdict) -> Result<()> {
        match verdict {
            Verdict::Accepted { node: Some(node), .. } | Verdict::Redirected { node: Some(node), .. } => {
                if node != self.graph.state().current() {
                    match self.graph.enter_node(node) {
                        Ok(entry) => {
                            self.persist().await?;
                            self.nav.invalidate_cache();
                            if entry.changed {
                                self.publish(NotificationKind::NodeEntered { node: node.clone() });
                            }
                        }
                        Err(e) => warn!("Settled in '{}' but could not enter it: {}", node, e),
                    }
                }
            }
            Verdict::Blocked {
                held,
                direction,
                reason,
                ..
            } => self.publish_blocked(*direction, *reason, *held),
            _ => {}
        }
        Ok(())
    }

    async fn pump(&mut self, now: Instant) -> Result<()> {
        let due = self.sequencer.tick(now);
        self.process(due).await
    }

    async fn process(&mut self, cues: Vec<Cue>) -> Result<()> {
        for cue in cues {
            match cue {
                Cue::Notify(kind) => self.publish(kind),
                Cue::ReturnToHub { hub, branch } => {
                    info!("Returning from '{}' to hub '{}'", branch, hub);
                    self.enter(&hub).await?;
                    self.publish(NotificationKind::ReturnedToHub { hub, branch });
                }
            }
        }
        Ok(())
    }

    async fn persist(&mut self) -> Result<()> {
        if let Err(e) = self.store.save(self.graph.state()).await {
            warn!("Failed to persist progress: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    fn publish_blocked(&self, direction: Direction, reason: BlockReason, held: Position) {
        self.send(Notification::blocked(direction, reason, held));
    }

    fn publish(&self, kind: NotificationKind) {
        self.send(Notification::new(kind));
    }

    fn send(&self, notification: Notification) {
        debug!("Notify: {:?}", notification.kind);
        if self.bus.send(notification).is_err() {
            debug!("No notification subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonpath_navigation::{HeadlessViewport, Key};
    use lessonpath_progress::testing::{branching_lesson, id};
    use lessonpath_storage::{MemoryStore, DEFAULT_KEY};
    use std::time::Duration;

    type Session = LessonSession<MemoryStore, HeadlessViewport>;

    async fn open_with(backend: MemoryStore, position: Position) -> Session {
        let view = HeadlessViewport::new(15).with_position(position);
        LessonSession::open(
            branching_lesson(),
            &LessonConfig::default(),
            ProgressStore::new(backend),
            view,
        )
        .await
    }

    fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<NotificationKind> {
        let mut kinds = Vec::new();
        while let Ok(n) = rx.try_recv() {
            kinds.push(n.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn test_open_places_viewport_in_current_node() {
        let session = open_with(MemoryStore::new(), 12).await;
        assert_eq!(session.position(), 1);
        assert_eq!(session.controller().guard().last_valid(), 1);

        let session = open_with(MemoryStore::new(), 3).await;
        assert_eq!(session.position(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_persists_before_returning() {
        let backend = MemoryStore::new();
        let mut session = open_with(backend.clone(), 4).await;

        session.complete_node(&id("intro"), Instant::now()).await.unwrap();
        let raw = backend.get(DEFAULT_KEY).await.unwrap().unwrap();
        assert_eq!(raw, session.graph().state().to_json().unwrap());
        assert!(raw.contains("\"menu\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_while_fanout_animates() {
        let mut session = open_with(MemoryStore::new(), 4).await;
        let mut rx = session.subscribe();
        let start = Instant::now();

        session.complete_node(&id("intro"), start).await.unwrap();
        assert_eq!(session.phase(), SequencerPhase::AnimatingFanout);

        let err = session.enter_node(&id("a"), start).await.unwrap_err();
        assert!(err.is_busy());
        assert_eq!(
            session
                .handle_input(&InputEvent::Key(Key::ArrowRight), start)
                .await
                .unwrap(),
            Verdict::Ignored
        );

        session.run_until_idle().await.unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                NotificationKind::NodeUnlocked { node: id("menu") },
                NotificationKind::NodeUnlocked { node: id("a") },
                NotificationKind::NodeUnlocked { node: id("b") },
            ]
        );
        assert!(session.enter_node(&id("a"), Instant::now()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_input_is_announced() {
        let mut session = open_with(MemoryStore::new(), 4).await;
        let mut rx = session.subscribe();

        let verdict = session
            .handle_input(&InputEvent::Wheel { delta: 30.0 }, Instant::now())
            .await
            .unwrap();
        assert!(verdict.is_blocked());
        assert_eq!(
            drain(&mut rx),
            vec![NotificationKind::NavigationBlocked {
                direction: Direction::Forward,
                reason: BlockReason::BoundaryNotCompleted,
                position: 4,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrolling_into_a_node_enters_it() {
        let mut session = open_with(MemoryStore::new(), 4).await;
        session.complete_node(&id("intro"), Instant::now()).await.unwrap();
        session.run_until_idle().await.unwrap();
        let mut rx = session.subscribe();

        let now = Instant::now();
        session.controller_mut().viewport_mut().scroll_to(5);
        session.on_scroll(now);
        assert_eq!(session.on_frame(now).await.unwrap(), None);

        let verdict = session.on_frame(now + Duration::from_millis(200)).await.unwrap();
        assert_eq!(verdict.as_ref().and_then(Verdict::node), Some(&id("menu")));
        assert_eq!(session.graph().state().current(), &id("menu"));
        assert_eq!(drain(&mut rx), vec![NotificationKind::NodeEntered { node: id("menu") }]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_branch_completion_returns_to_hub() {
        let mut session = open_with(MemoryStore::new(), 4).await;
        session.complete_node(&id("intro"), Instant::now()).await.unwrap();
        session.run_until_idle().await.unwrap();
        session.enter_node(&id("a"), Instant::now()).await.unwrap();
        assert_eq!(session.position(), 6);

        let mut rx = session.subscribe();
        session.complete_node(&id("a"), Instant::now()).await.unwrap();
        assert_eq!(session.phase(), SequencerPhase::AnimatingReturn);
        session.run_until_idle().await.unwrap();

        assert_eq!(session.position(), 5);
        assert_eq!(session.graph().state().current(), &id("menu"));
        assert_eq!(
            drain(&mut rx),
            vec![
                NotificationKind::NodeEntered { node: id("menu") },
                NotificationKind::ReturnedToHub { hub: id("menu"), branch: id("a") },
                NotificationKind::RemainingBranches { hub: id("menu"), remaining: vec![id("b")] },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_entering_after_a_block_moves_the_viewport() {
        let mut session = open_with(MemoryStore::new(), 4).await;
        let blocked = session
            .handle_input(&InputEvent::SetPosition(5), Instant::now())
            .await
            .unwrap();
        assert!(blocked.is_blocked());

        session.complete_node(&id("intro"), Instant::now()).await.unwrap();
        session.run_until_idle().await.unwrap();
        session.enter_node(&id("a"), Instant::now()).await.unwrap();
        assert_eq!(session.position(), 6);
        assert_eq!(session.controller().guard().last_valid(), 6);

        let verdict = session
            .handle_input(&InputEvent::Key(Key::ArrowRight), Instant::now())
            .await
            .unwrap();
        assert_eq!(verdict.target(), Some(7));
        assert_eq!(session.position(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_branch_left_for_its_hub_can_be_resumed() {
        let mut session = open_with(MemoryStore::new(), 4).await;
        session.complete_node(&id("intro"), Instant::now()).await.unwrap();
        session.run_until_idle().await.unwrap();
        session.enter_node(&id("a"), Instant::now()).await.unwrap();

        let back = session
            .handle_input(&InputEvent::Key(Key::ArrowLeft), Instant::now())
            .await
            .unwrap();
        assert_eq!(back.target(), Some(5));
        assert_eq!(session.graph().state().current(), &id("menu"));

        let forward = session
            .handle_input(&InputEvent::Key(Key::ArrowRight), Instant::now())
            .await
            .unwrap();
        assert_eq!(forward.node(), Some(&id("a")));
        assert_eq!(session.position(), 6);
        assert_eq!(session.graph().state().current(), &id("a"));
    }

    #[tokio::test]
    async fn test_fast_forward_plays_the_whole_sequence() {
        let mut session = open_with(MemoryStore::new(), 4).await;
        let mut rx = session.subscribe();
        session.complete_node(&id("intro"), Instant::now()).await.unwrap();

        session.fast_forward().await.unwrap();
        assert_eq!(session.phase(), SequencerPhase::Idle);
        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_resumes_progress() {
        let backend = MemoryStore::new();
        let mut session = open_with(backend.clone(), 4).await;
        session.complete_node(&id("intro"), Instant::now()).await.unwrap();
        session.run_until_idle().await.unwrap();
        session.enter_node(&id("b"), Instant::now()).await.unwrap();

        let resumed = open_with(backend, 0).await;
        assert_eq!(resumed.graph().state(), session.graph().state());
        assert_eq!(resumed.position(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_starts_over() {
        let backend = MemoryStore::new();
        let mut session = open_with(backend.clone(), 4).await;
        session.complete_node(&id("intro"), Instant::now()).await.unwrap();

        session.reset().await.unwrap();
        assert!(session.phase() == SequencerPhase::Idle);
        assert_eq!(session.position(), 1);
        assert!(session.graph().state().completed().is_empty());

        let raw = backend.get(DEFAULT_KEY).await.unwrap().unwrap();
        assert_eq!(
            raw,
            r#"{"completed":[],"unlocked":["intro"],"current":"intro","accessed":[]}"#
        );
    }

    #[tokio::test]
    async fn test_unknown_node_changes_nothing() {
        let backend = MemoryStore::new();
        let mut session = open_with(backend.clone(), 1).await;

        assert!(session.complete_node(&id("ghost"), Instant::now()).await.is_err());
        assert!(backend.is_empty().await);
    }
}
