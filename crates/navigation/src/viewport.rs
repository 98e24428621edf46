//! The scrolling surface, seen only through its current position.

use lessonpath_core::Position;

/// Whatever shows one position at a time and can be moved programmatically.
pub trait Viewport {
    /// Position currently shown.
    fn position(&self) -> Position;

    /// Move to `position` immediately, without animation.
    fn snap_to(&mut self, position: Position);
}

/// In-memory viewport for the CLI and tests.
///
/// [`HeadlessViewport::scroll_to`] plays the user moving the surface freely;
/// [`Viewport::snap_to`] is the programmatic move and is recorded.
#[derive(Debug, Clone, Default)]
pub struct HeadlessViewport {
    position: Position,
    len: usize,
    snaps: Vec<Position>,
}

impl HeadlessViewport {
    /// A viewport over `len` positions, showing the first one.
    pub fn new(len: usize) -> Self {
        Self {
            position: 0,
            len,
            snaps: Vec::new(),
        }
    }

    /// Start at a given position (clamped).
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = self.clamp(position);
        self
    }

    /// User-driven movement: no guard involved.
    pub fn scroll_to(&mut self, position: Position) {
        self.position = self.clamp(position);
    }

    /// Every programmatic snap so far, oldest first.
    pub fn snaps(&self) -> &[Position] {
        &self.snaps
    }

    fn clamp(&self, position: Position) -> Position {
        position.min(self.len.saturating_sub(1))
    }
}

impl Viewport for HeadlessViewport {
    fn position(&self) -> Position {
        self.position
    }

    fn snap_to(&mut self, position: Position) {
        let position = self.clamp(position);
        self.snaps.push(position);
        self.position = position;
    }
}
