//! Notification model - signals produced for UI and feedback collaborators.
//!
//! Nothing in the core depends on these being observed; they only drive
//! affordances, sounds and flashes outside of it.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, NodeId, Position};
use crate::Time;

/// Which way a navigation attempt was heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward higher positions
    Forward,
    /// Toward lower positions
    Backward,
}

impl Direction {
    /// Direction of travel from `from` to `to`, if any.
    pub fn between(from: Position, to: Position) -> Option<Self> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(Direction::Forward),
            std::cmp::Ordering::Less => Some(Direction::Backward),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Why a navigation attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// The current node's exit position is held until the node is completed
    BoundaryNotCompleted,
    /// Nothing ahead is unlocked and active
    TargetLocked,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::BoundaryNotCompleted => write!(f, "boundary not completed"),
            BlockReason::TargetLocked => write!(f, "target locked"),
        }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// A navigation attempt was reverted.
    NavigationBlocked {
        /// Attempted direction
        direction: Direction,
        /// Why it was rejected
        reason: BlockReason,
        /// Position the viewport was held at
        position: Position,
    },

    /// A node became enterable.
    NodeUnlocked {
        /// The node
        node: NodeId,
    },

    /// The cursor moved into a node.
    NodeEntered {
        /// The node
        node: NodeId,
    },

    /// A completed branch handed the cursor back to its hub.
    ReturnedToHub {
        /// The hub
        hub: NodeId,
        /// The branch just completed
        branch: NodeId,
    },

    /// A branch completed but its hub still has open branches.
    RemainingBranches {
        /// The hub
        hub: NodeId,
        /// Branches not yet completed
        remaining: Vec<NodeId>,
    },

    /// A node with no children completed: end of content.
    LessonCompleted {
        /// The terminal node
        node: NodeId,
    },
}

/// A notification envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: EventId,

    /// When it was raised
    pub timestamp: Time,

    /// Payload
    pub kind: NotificationKind,
}

impl Notification {
    /// Wrap a payload, stamped now.
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            id: EventId::new(),
            timestamp: chrono::Utc::now(),
            kind,
        }
    }

    /// Shorthand for a blocked-navigation signal.
    pub fn blocked(direction: Direction, reason: BlockReason, position: Position) -> Self {
        Self::new(NotificationKind::NavigationBlocked {
            direction,
            reason,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_between() {
        assert_eq!(Direction::between(3, 4), Some(Direction::Forward));
        assert_eq!(Direction::between(3, 1), Some(Direction::Backward));
        assert_eq!(Direction::between(3, 3), None);
    }

    #[test]
    fn test_kind_is_tagged() {
        let n = Notification::blocked(Direction::Forward, BlockReason::TargetLocked, 5);
        let json = serde_json::to_value(&n.kind).unwrap();
        assert_eq!(json["type"], "navigation_blocked");
        assert_eq!(json["reason"], "target_locked");
        assert_eq!(json["direction"], "forward");
    }
}
