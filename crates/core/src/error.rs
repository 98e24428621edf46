//! Error types shared across the progression core.

use crate::id::{NodeId, Position};

/// Errors raised by progression operations.
///
/// None of these is fatal: callers log them and carry on with the state unchanged
/// or with a recovered value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    /// Id not present in the graph
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Node exists but may not be entered yet
    #[error("node is locked: {0}")]
    Locked(NodeId),

    /// Hubs are never completed themselves
    #[error("hub nodes cannot be completed: {0}")]
    HubNotCompletable(NodeId),

    /// A transition sequence is still animating
    #[error("a transition is already in flight")]
    Busy,

    /// A position change that violates legality
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition {
        /// Last legal position
        from: Position,
        /// Attempted position
        to: Position,
    },

    /// The unlock set changed without cache invalidation
    #[error("reachability cache is stale (cached revision {cached}, graph revision {actual})")]
    StaleCache {
        /// Revision the cache was computed for
        cached: u64,
        /// Current graph revision
        actual: u64,
    },

    /// Persisted fields were malformed and have been defaulted
    #[error("persisted state was corrupt, defaulted fields: {0:?}")]
    CorruptPersistedState(Vec<&'static str>),
}

/// Errors found while building a graph from its definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// Two nodes share an id
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// The declared root is not a node
    #[error("root node not found: {0}")]
    MissingRoot(NodeId),

    /// A parent/child/return/gate reference points nowhere
    #[error("node {node} references unknown node {target}")]
    UnknownReference {
        /// Referencing node
        node: NodeId,
        /// Missing target
        target: NodeId,
    },

    /// A branch returns to something that is not a hub
    #[error("branch {branch} returns to {target}, which is not a hub")]
    ReturnTargetNotHub {
        /// The branch
        branch: NodeId,
        /// Its return target
        target: NodeId,
    },

    /// A hub converges on something that is not a gate
    #[error("hub {hub} converges on {target}, which is not a gate")]
    GateTargetNotGate {
        /// The hub
        hub: NodeId,
        /// Its gate target
        target: NodeId,
    },

    /// A content node with no positions
    #[error("node {0} has no content")]
    EmptyContent(NodeId),

    /// A hub with content
    #[error("hub {0} must not own content")]
    HubWithContent(NodeId),

    /// Two nodes claim one position
    #[error("position {position} claimed by both {first} and {second}")]
    OverlappingPosition {
        /// The position
        position: Position,
        /// Earlier owner
        first: NodeId,
        /// Later claimant
        second: NodeId,
    },

    /// A content key the deck does not know
    #[error("node {node} references unknown slide {key}")]
    UnknownSlide {
        /// Referencing node
        node: NodeId,
        /// The slide key
        key: String,
    },

    /// The parent/child relation loops
    #[error("cycle detected: {0:?}")]
    Cycle(Vec<NodeId>),
}
