//! Node model - vertices of the progression graph.

use serde::{Deserialize, Serialize};
use crate::id::{NodeId, Position};

/// Classification of a node, carrying the fields only that kind may have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// A plain stretch of slides that advances to its children.
    Linear,

    /// A content-less junction that fans out to branch children.
    Hub {
        /// Gate unlocked once every child of this hub is complete
        gate_for: Option<NodeId>,
        /// Slide showing the hub's choice menu, if any
        anchor: Option<Position>,
    },

    /// A child of a hub that returns there on completion.
    Branch {
        /// Hub the cursor returns to
        return_to: NodeId,
    },

    /// A convergence point requiring every parent complete.
    Gate,
}

impl NodeKind {
    /// Short lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Linear => "linear",
            NodeKind::Hub { .. } => "hub",
            NodeKind::Branch { .. } => "branch",
            NodeKind::Gate => "gate",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex in the progression graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    /// Human label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Kind and kind-specific payload
    #[serde(flatten)]
    pub kind: NodeKind,

    /// Positions owned by this node, ascending. Empty for hubs.
    #[serde(default)]
    pub content: Vec<Position>,

    /// Nodes whose completion gates this one
    #[serde(default)]
    pub parents: Vec<NodeId>,

    /// Nodes this one may unlock on completion, in definition order
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl Node {
    fn with_kind(id: impl Into<NodeId>, kind: NodeKind, content: impl IntoIterator<Item = Position>) -> Self {
        let mut content: Vec<Position> = content.into_iter().collect();
        content.sort_unstable();
        content.dedup();
        Self {
            id: id.into(),
            title: None,
            kind,
            content,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a linear node.
    pub fn linear(id: impl Into<NodeId>, content: impl IntoIterator<Item = Position>) -> Self {
        Self::with_kind(id, NodeKind::Linear, content)
    }

    /// Create a hub with no gate and no anchor.
    pub fn hub(id: impl Into<NodeId>) -> Self {
        Self::with_kind(id, NodeKind::Hub { gate_for: None, anchor: None }, [])
    }

    /// Create a branch returning to `return_to`.
    pub fn branch(
        id: impl Into<NodeId>,
        return_to: impl Into<NodeId>,
        content: impl IntoIterator<Item = Position>,
    ) -> Self {
        Self::with_kind(id, NodeKind::Branch { return_to: return_to.into() }, content)
    }

    /// Create a gate.
    pub fn gate(id: impl Into<NodeId>, content: impl IntoIterator<Item = Position>) -> Self {
        Self::with_kind(id, NodeKind::Gate, content)
    }

    /// Add parents.
    pub fn with_parents<I, T>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        for parent in parents {
            let parent = parent.into();
            if !self.parents.contains(&parent) {
                self.parents.push(parent);
            }
        }
        self
    }

    /// Add children.
    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        for child in children {
            let child = child.into();
            if !self.children.contains(&child) {
                self.children.push(child);
            }
        }
        self
    }

    /// Set the gate a hub converges on. Ignored for other kinds.
    pub fn with_gate_for(mut self, gate: impl Into<NodeId>) -> Self {
        if let NodeKind::Hub { gate_for, .. } = &mut self.kind {
            *gate_for = Some(gate.into());
        }
        self
    }

    /// Set the menu slide of a hub. Ignored for other kinds.
    pub fn with_anchor(mut self, position: Position) -> Self {
        if let NodeKind::Hub { anchor, .. } = &mut self.kind {
            *anchor = Some(position);
        }
        self
    }

    /// Is this a hub?
    pub fn is_hub(&self) -> bool {
        matches!(self.kind, NodeKind::Hub { .. })
    }

    /// Is this a branch?
    pub fn is_branch(&self) -> bool {
        matches!(self.kind, NodeKind::Branch { .. })
    }

    /// Is this a gate?
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, NodeKind::Gate)
    }

    /// The hub a branch returns to.
    pub fn return_to(&self) -> Option<&NodeId> {
        match &self.kind {
            NodeKind::Branch { return_to } => Some(return_to),
            _ => None,
        }
    }

    /// The gate a hub converges on.
    pub fn gate_for(&self) -> Option<&NodeId> {
        match &self.kind {
            NodeKind::Hub { gate_for, .. } => gate_for.as_ref(),
            _ => None,
        }
    }

    /// The menu slide of a hub.
    pub fn anchor(&self) -> Option<Position> {
        match &self.kind {
            NodeKind::Hub { anchor, .. } => *anchor,
            _ => None,
        }
    }

    /// Last content position, where forward motion waits for completion.
    pub fn exit_position(&self) -> Option<Position> {
        if self.is_hub() {
            return None;
        }
        self.content.last().copied()
    }

    /// Lowest position owned by this node.
    pub fn first_position(&self) -> Option<Position> {
        self.content.first().copied().or_else(|| self.anchor())
    }

    /// Highest position owned by this node.
    pub fn last_position(&self) -> Option<Position> {
        self.content.last().copied().or_else(|| self.anchor())
    }

    /// Every position owned by this node, hub anchor included.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.content.iter().copied().chain(self.anchor())
    }

    /// Whether `position` belongs to this node.
    pub fn owns(&self, position: Position) -> bool {
        self.anchor() == Some(position) || self.content.binary_search(&position).is_ok()
    }

    /// Display label: title if set, id otherwise.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_sorted_and_exit_is_last() {
        let node = Node::linear("intro", [3, 1, 2, 2]);
        assert_eq!(node.content, vec![1, 2, 3]);
        assert_eq!(node.exit_position(), Some(3));
        assert_eq!(node.first_position(), Some(1));
    }

    #[test]
    fn test_hub_has_no_exit_but_owns_anchor() {
        let hub = Node::hub("menu").with_anchor(6).with_gate_for("wrap");
        assert_eq!(hub.exit_position(), None);
        assert_eq!(hub.first_position(), Some(6));
        assert_eq!(hub.last_position(), Some(6));
        assert!(hub.owns(6));
        assert_eq!(hub.gate_for(), Some(&NodeId::from("wrap")));
    }

    #[test]
    fn test_kind_specific_setters_ignore_other_kinds() {
        let node = Node::linear("intro", [1]).with_gate_for("wrap").with_anchor(9);
        assert_eq!(node.gate_for(), None);
        assert_eq!(node.anchor(), None);
        assert!(!node.owns(9));
    }

    #[test]
    fn test_branch_knows_its_hub() {
        let branch = Node::branch("a", "menu", [7, 8]).with_parents(["menu", "menu"]);
        assert_eq!(branch.return_to(), Some(&NodeId::from("menu")));
        assert_eq!(branch.parents.len(), 1);
    }

    #[test]
    fn test_kind_serialization_is_tagged() {
        let hub = Node::hub("menu").with_anchor(6);
        let json = serde_json::to_value(&hub).unwrap();
        assert_eq!(json["kind"], "hub");
        assert_eq!(json["anchor"], 6);

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, hub);
    }
}
