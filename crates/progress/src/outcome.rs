//! Results of progression mutations.

use lessonpath_core::NodeId;

/// A hub and the branches unlocked together with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fanout {
    /// The hub
    pub hub: NodeId,
    /// Its children, in definition order
    pub branches: Vec<NodeId>,
}

/// What completing a node did beyond marking it completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEffect {
    /// The node was already completed; nothing changed
    AlreadyCompleted,
    /// No children: end of content
    Terminal,
    /// Children were unlocked; hubs among them fanned out
    Advanced {
        /// Hub bursts, one per hub child
        fanouts: Vec<Fanout>,
    },
    /// Last open branch of a hub completed; its gate (if any) unlocked
    Converged {
        /// The hub returned to
        hub: NodeId,
        /// The hub's gate
        gate: Option<NodeId>,
    },
    /// A branch completed while siblings remain open
    RemainingBranches {
        /// The hub returned to
        hub: NodeId,
        /// Siblings still open
        remaining: Vec<NodeId>,
    },
}

/// Result of `complete_node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// The completed node
    pub node: NodeId,
    /// Kind-specific effect
    pub effect: CompletionEffect,
    /// Newly unlocked nodes, in unlock order
    pub unlocked: Vec<NodeId>,
}

impl CompletionOutcome {
    /// An outcome that unlocked nothing.
    pub fn new(node: NodeId, effect: CompletionEffect) -> Self {
        Self {
            node,
            effect,
            unlocked: Vec::new(),
        }
    }
}

/// Result of `enter_node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    /// The entered node
    pub node: NodeId,
    /// The cursor moved to a different node
    pub changed: bool,
    /// The node had never been accessed before
    pub first_visit: bool,
}
