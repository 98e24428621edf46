//! Shared lesson fixtures for tests across the workspace.

use lessonpath_core::{Node, NodeId};

use crate::ProgressionGraph;

/// Shorthand for a node id.
pub fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

/// A lesson with one hub and two branches converging on a gate.
///
/// ```text
/// 0        cover (standalone, no node)
/// 1..=4    intro  (linear, root)
/// 5        menu   (hub anchor, gate_for wrap)
/// 6..=8    a      (branch of menu)
/// 9..=11   b      (branch of menu)
/// 12..=14  wrap   (gate, parents a + b)
/// ```
pub fn branching_lesson() -> ProgressionGraph {
    let nodes = vec![
        Node::linear("intro", 1..=4).with_children(["menu"]),
        Node::hub("menu")
            .with_anchor(5)
            .with_gate_for("wrap")
            .with_children(["a", "b"]),
        Node::branch("a", "menu", 6..=8),
        Node::branch("b", "menu", 9..=11),
        Node::gate("wrap", 12..=14).with_parents(["a", "b"]),
    ];
    match ProgressionGraph::new("intro", nodes) {
        Ok(graph) => graph,
        Err(e) => panic!("fixture lesson is invalid: {e}"),
    }
}
