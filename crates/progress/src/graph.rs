//! The progression graph: node definitions plus the unlock/completion state machine.
//!
//! Definitions are validated once at construction and never change afterwards.
//! The [`ProgressionState`] is mutated only by the operations here; every change
//! to the unlock set bumps [`ProgressionGraph::revision`] so readers holding
//! derived values (the navigation guard's reach cache) can tell they are stale.

use std::collections::{BTreeMap, HashMap, HashSet};

use lessonpath_core::{
    DefinitionError, Node, NodeId, NodeKind, Position, ProgressionError, ProgressionState,
};
use tracing::{debug, info, warn};

use crate::outcome::{CompletionEffect, CompletionOutcome, EntryOutcome, Fanout};

/// Immutable node definitions paired with the mutable progression state.
#[derive(Debug, Clone)]
pub struct ProgressionGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    positions: BTreeMap<Position, usize>,
    root: NodeId,
    state: ProgressionState,
    // Branches entered since the state was adopted; not part of the persisted blob.
    entered: HashSet<NodeId>,
    revision: u64,
}

impl ProgressionGraph {
    /// Validate `nodes` and build a graph in its initial state.
    ///
    /// Parent/child edges only need to be declared on one side; the other half
    /// is filled in.
    pub fn new(root: impl Into<NodeId>, nodes: Vec<Node>) -> Result<Self, DefinitionError> {
        let root = root.into();
        let mut nodes = nodes;

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(DefinitionError::DuplicateNode(node.id.clone()));
            }
        }
        if !index.contains_key(&root) {
            return Err(DefinitionError::MissingRoot(root));
        }

        mirror_edges(&mut nodes, &index)?;
        check_kinds(&nodes, &index)?;
        let positions = index_positions(&nodes)?;
        if let Some(cycle) = find_cycle(&nodes, &index) {
            return Err(DefinitionError::Cycle(cycle));
        }

        debug!(
            "Built progression graph: {} nodes, {} positions, root '{}'",
            nodes.len(),
            positions.len(),
            root
        );

        Ok(Self {
            state: ProgressionState::initial(root.clone()),
            nodes,
            index,
            positions,
            root,
            entered: HashSet::new(),
            revision: 0,
        })
    }

    // === Definition queries ===

    /// The designated root.
    pub fn root(&self) -> &NodeId {
        &self.root
    }

    /// All nodes, in definition order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// The node owning a position, if any.
    pub fn node_for_position(&self, position: Position) -> Option<&Node> {
        self.positions.get(&position).map(|&i| &self.nodes[i])
    }

    /// Lowest position owned by a node.
    pub fn first_position(&self, id: &NodeId) -> Option<Position> {
        self.node(id).and_then(Node::first_position)
    }

    /// Highest position owned by a node.
    pub fn last_position(&self, id: &NodeId) -> Option<Position> {
        self.node(id).and_then(Node::last_position)
    }

    // === State queries ===

    /// The current state.
    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    /// Incremented whenever the unlock set (or the whole state) changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The node the cursor belongs to.
    pub fn current_node(&self) -> Option<&Node> {
        self.node(self.state.current())
    }

    /// Is `id` completed?
    pub fn is_completed(&self, id: &NodeId) -> bool {
        self.state.is_completed(id)
    }

    /// Has `id` been visited or unlocked?
    pub fn is_accessed(&self, id: &NodeId) -> bool {
        self.state.is_accessed(id)
    }

    /// Has the branch `id` been entered since the state was adopted?
    ///
    /// Unlocking marks every branch of a hub accessed at once, so access alone
    /// cannot tell the branch being worked on from its untouched siblings.
    pub fn was_entered(&self, id: &NodeId) -> bool {
        self.entered.contains(id)
    }

    /// Is `id` enterable?
    ///
    /// The root always is. Otherwise the explicit unlock set is consulted first,
    /// then the parent rule: a gate needs every parent completed, any other kind
    /// needs at least one.
    pub fn is_unlocked(&self, id: &NodeId) -> bool {
        if *id == self.root || self.state.is_unlocked(id) {
            return true;
        }
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.is_gate() {
            !node.parents.is_empty() && node.parents.iter().all(|p| self.state.is_completed(p))
        } else {
            node.parents.iter().any(|p| self.state.is_completed(p))
        }
    }

    /// Branches of a hub that are not completed yet.
    pub fn remaining_branches(&self, hub: &NodeId) -> Vec<NodeId> {
        self.node(hub)
            .map(|h| {
                h.children
                    .iter()
                    .filter(|c| !self.state.is_completed(c))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The furthest position currently enterable.
    ///
    /// Never less than the highest position of the current node, so nobody is
    /// locked out of where they already stand.
    pub fn max_reachable_position(&self) -> Position {
        let unlocked_max = self
            .nodes
            .iter()
            .filter(|n| self.is_unlocked(&n.id))
            .filter_map(Node::last_position)
            .max();
        let current_max = self.current_node().and_then(Node::last_position);
        unlocked_max.max(current_max).unwrap_or(0)
    }

    // === Mutations ===

    /// Record that a node's exit condition was satisfied and apply its effects.
    ///
    /// Idempotent: completing a completed node changes nothing. Locked nodes,
    /// hubs and unknown ids are rejected without touching the state.
    pub fn complete_node(&mut self, id: &NodeId) -> Result<CompletionOutcome, ProgressionError> {
        let Some(node) = self.node(id) else {
            warn!("complete_node: unknown node '{}'", id);
            return Err(ProgressionError::UnknownNode(id.clone()));
        };
        if node.is_hub() {
            warn!("complete_node: hub '{}' is never completed itself", id);
            return Err(ProgressionError::HubNotCompletable(id.clone()));
        }
        if self.state.is_completed(id) {
            debug!("Node '{}' already completed", id);
            return Ok(CompletionOutcome::new(id.clone(), CompletionEffect::AlreadyCompleted));
        }
        if !self.is_unlocked(id) {
            warn!("complete_node: node '{}' is still locked", id);
            return Err(ProgressionError::Locked(id.clone()));
        }

        let kind = node.kind.clone();
        let children = node.children.clone();
        self.state.mark_completed(id.clone());
        info!("Completed node '{}'", id);

        let mut unlocked = Vec::new();
        let effect = match kind {
            NodeKind::Linear | NodeKind::Gate => {
                if children.is_empty() {
                    info!("Node '{}' has no children: end of content", id);
                    CompletionEffect::Terminal
                } else {
                    let mut fanouts = Vec::new();
                    for child in &children {
                        if let Some(fanout) = self.fan_out(child, &mut unlocked) {
                            fanouts.push(fanout);
                        } else if self.gate_ready(child) {
                            self.unlock(child, &mut unlocked);
                        } else {
                            debug!("Gate '{}' still waits on other parents", child);
                        }
                    }
                    CompletionEffect::Advanced { fanouts }
                }
            }
            NodeKind::Branch { return_to } => {
                let remaining = self.remaining_branches(&return_to);
                if remaining.is_empty() {
                    let gate = self
                        .node(&return_to)
                        .and_then(Node::gate_for)
                        .filter(|gate| self.gate_ready(gate))
                        .cloned();
                    if let Some(gate) = &gate {
                        self.unlock(gate, &mut unlocked);
                    }
                    info!("All branches of '{}' completed", return_to);
                    CompletionEffect::Converged { hub: return_to, gate }
                } else {
                    debug!("Hub '{}' has {} open branches", return_to, remaining.len());
                    CompletionEffect::RemainingBranches { hub: return_to, remaining }
                }
            }
            NodeKind::Hub { .. } => unreachable!("hubs are rejected above"),
        };

        if !unlocked.is_empty() {
            self.revision += 1;
        }
        Ok(CompletionOutcome {
            node: id.clone(),
            effect,
            unlocked,
        })
    }

    /// Move the cursor into an enterable node.
    pub fn enter_node(&mut self, id: &NodeId) -> Result<EntryOutcome, ProgressionError> {
        if self.node(id).is_none() {
            warn!("enter_node: unknown node '{}'", id);
            return Err(ProgressionError::UnknownNode(id.clone()));
        }
        if !self.is_unlocked(id) {
            debug!("enter_node: node '{}' is locked", id);
            return Err(ProgressionError::Locked(id.clone()));
        }

        // Unlocked by the parent rule but never written: record it now.
        if self.state.mark_unlocked(id.clone()) {
            self.revision += 1;
        }
        if self.node(id).is_some_and(Node::is_branch) {
            self.entered.insert(id.clone());
        }
        let changed = self.state.current() != id;
        let first_visit = self.state.mark_accessed(id.clone());
        self.state.set_current(id.clone());
        if changed {
            debug!("Entered node '{}'", id);
        }

        Ok(EntryOutcome {
            node: id.clone(),
            changed,
            first_visit,
        })
    }

    /// Replace the state with a persisted one, verbatim.
    pub fn adopt(&mut self, state: ProgressionState) {
        if self.node(state.current()).is_none() {
            warn!("Adopted state points at unknown node '{}'", state.current());
        }
        self.state = state;
        self.entered.clear();
        if self.current_node().is_some_and(Node::is_branch) {
            self.entered.insert(self.state.current().clone());
        }
        self.revision += 1;
    }

    /// Back to initial lifecycle values (new-session boundary).
    pub fn reset(&mut self) {
        info!("Resetting progression to root '{}'", self.root);
        self.state = ProgressionState::initial(self.root.clone());
        self.entered.clear();
        self.revision += 1;
    }

    fn unlock(&mut self, id: &NodeId, unlocked: &mut Vec<NodeId>) {
        if self.state.mark_unlocked(id.clone()) {
            info!("Unlocked node '{}'", id);
            unlocked.push(id.clone());
        }
    }

    /// A gate may open only once every parent is completed; other kinds always may.
    fn gate_ready(&self, id: &NodeId) -> bool {
        self.node(id).is_some_and(|node| {
            !node.is_gate() || node.parents.iter().all(|p| self.state.is_completed(p))
        })
    }

    /// Unlock a hub and every one of its children in one step.
    fn fan_out(&mut self, hub: &NodeId, unlocked: &mut Vec<NodeId>) -> Option<Fanout> {
        let branches = self.node(hub).filter(|n| n.is_hub())?.children.clone();
        self.unlock(hub, unlocked);
        for branch in &branches {
            self.unlock(branch, unlocked);
        }
        Some(Fanout {
            hub: hub.clone(),
            branches,
        })
    }
}

/// Make parent/child declarations symmetric, rejecting dangling references.
fn mirror_edges(nodes: &mut [Node], index: &HashMap<NodeId, usize>) -> Result<(), DefinitionError> {
    let mut edges = Vec::new();
    for node in nodes.iter() {
        for child in &node.children {
            if !index.contains_key(child) {
                return Err(DefinitionError::UnknownReference {
                    node: node.id.clone(),
                    target: child.clone(),
                });
            }
            edges.push((node.id.clone(), child.clone()));
        }
        for parent in &node.parents {
            if !index.contains_key(parent) {
                return Err(DefinitionError::UnknownReference {
                    node: node.id.clone(),
                    target: parent.clone(),
                });
            }
            edges.push((parent.clone(), node.id.clone()));
        }
    }

    for (parent, child) in edges {
        let p = &mut nodes[index[&parent]];
        if !p.children.contains(&child) {
            p.children.push(child.clone());
        }
        let c = &mut nodes[index[&child]];
        if !c.parents.contains(&parent) {
            c.parents.push(parent);
        }
    }
    Ok(())
}

/// Kind-specific rules: content presence and the targets of `return_to` / `gate_for`.
fn check_kinds(nodes: &[Node], index: &HashMap<NodeId, usize>) -> Result<(), DefinitionError> {
    for node in nodes {
        match &node.kind {
            NodeKind::Hub { gate_for, .. } => {
                if !node.content.is_empty() {
                    return Err(DefinitionError::HubWithContent(node.id.clone()));
                }
                if let Some(gate) = gate_for {
                    let Some(&i) = index.get(gate) else {
                        return Err(DefinitionError::UnknownReference {
                            node: node.id.clone(),
                            target: gate.clone(),
                        });
                    };
                    if !nodes[i].is_gate() {
                        return Err(DefinitionError::GateTargetNotGate {
                            hub: node.id.clone(),
                            target: gate.clone(),
                        });
                    }
                }
            }
            NodeKind::Branch { return_to } => {
                let Some(&i) = index.get(return_to) else {
                    return Err(DefinitionError::UnknownReference {
                        node: node.id.clone(),
                        target: return_to.clone(),
                    });
                };
                if !nodes[i].is_hub() {
                    return Err(DefinitionError::ReturnTargetNotHub {
                        branch: node.id.clone(),
                        target: return_to.clone(),
                    });
                }
            }
            NodeKind::Linear | NodeKind::Gate => {}
        }
        if !node.is_hub() && node.content.is_empty() {
            return Err(DefinitionError::EmptyContent(node.id.clone()));
        }
    }
    Ok(())
}

/// Map every owned position to its node, rejecting double claims.
fn index_positions(nodes: &[Node]) -> Result<BTreeMap<Position, usize>, DefinitionError> {
    let mut positions: BTreeMap<Position, usize> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        for position in node.positions() {
            if let Some(&prev) = positions.get(&position) {
                return Err(DefinitionError::OverlappingPosition {
                    position,
                    first: nodes[prev].id.clone(),
                    second: node.id.clone(),
                });
            }
            positions.insert(position, i);
        }
    }
    Ok(positions)
}

/// Depth-first search along child edges; returns the first cycle found.
fn find_cycle(nodes: &[Node], index: &HashMap<NodeId, usize>) -> Option<Vec<NodeId>> {
    fn visit(
        i: usize,
        nodes: &[Node],
        index: &HashMap<NodeId, usize>,
        visited: &mut HashSet<usize>,
        recursion_stack: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<NodeId>> {
        visited.insert(i);
        recursion_stack.insert(i);
        path.push(i);

        for child in &nodes[i].children {
            let c = index[child];
            if !visited.contains(&c) {
                if let Some(cycle) = visit(c, nodes, index, visited, recursion_stack, path) {
                    return Some(cycle);
                }
            } else if recursion_stack.contains(&c) {
                let start = path.iter().position(|&p| p == c).unwrap_or(0);
                return Some(path[start..].iter().map(|&p| nodes[p].id.clone()).collect());
            }
        }

        path.pop();
        recursion_stack.remove(&i);
        None
    }

    let mut visited = HashSet::new();
    let mut recursion_stack = HashSet::new();
    for i in 0..nodes.len() {
        if !visited.contains(&i) {
            if let Some(cycle) = visit(i, nodes, index, &mut visited, &mut recursion_stack, &mut Vec::new()) {
                return Some(cycle);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{branching_lesson, id};

    fn ids(list: &[&str]) -> Vec<NodeId> {
        list.iter().map(|s| id(s)).collect()
    }

    #[test]
    fn test_root_is_always_unlocked() {
        let graph = branching_lesson();
        assert!(graph.is_unlocked(&id("intro")));
        assert!(!graph.is_unlocked(&id("menu")));
        assert!(!graph.is_unlocked(&id("nope")));
    }

    #[test]
    fn test_completing_into_a_hub_fans_out() {
        let mut graph = branching_lesson();
        let outcome = graph.complete_node(&id("intro")).unwrap();

        assert_eq!(outcome.unlocked, ids(&["menu", "a", "b"]));
        match outcome.effect {
            CompletionEffect::Advanced { fanouts } => {
                assert_eq!(fanouts.len(), 1);
                assert_eq!(fanouts[0].hub, id("menu"));
                assert_eq!(fanouts[0].branches, ids(&["a", "b"]));
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
        let unlocked: Vec<_> = graph.state().unlocked().iter().cloned().collect();
        assert_eq!(unlocked, ids(&["a", "b", "intro", "menu"]));
    }

    #[test]
    fn test_complete_is_idempotent() {
        let mut graph = branching_lesson();
        graph.complete_node(&id("intro")).unwrap();
        let once = graph.state().clone();
        let revision = graph.revision();

        let again = graph.complete_node(&id("intro")).unwrap();
        assert_eq!(again.effect, CompletionEffect::AlreadyCompleted);
        assert!(again.unlocked.is_empty());
        assert_eq!(graph.state(), &once);
        assert_eq!(graph.revision(), revision);
    }

    #[test]
    fn test_branch_convergence_in_either_order() {
        for order in [["a", "b"], ["b", "a"]] {
            let mut graph = branching_lesson();
            graph.complete_node(&id("intro")).unwrap();

            let first = graph.complete_node(&id(order[0])).unwrap();
            assert_eq!(
                first.effect,
                CompletionEffect::RemainingBranches {
                    hub: id("menu"),
                    remaining: vec![id(order[1])],
                }
            );
            assert!(!graph.state().is_unlocked(&id("wrap")));

            let second = graph.complete_node(&id(order[1])).unwrap();
            assert_eq!(second.unlocked, ids(&["wrap"]));
            assert_eq!(
                second.effect,
                CompletionEffect::Converged {
                    hub: id("menu"),
                    gate: Some(id("wrap")),
                }
            );
            assert!(graph.is_unlocked(&id("wrap")));
        }
    }

    #[test]
    fn test_gate_needs_every_parent() {
        let nodes = vec![
            Node::linear("start", [0]).with_children(["p1", "p2", "p3"]),
            Node::linear("p1", [1]),
            Node::linear("p2", [2]),
            Node::linear("p3", [3]),
            Node::gate("join", [4]).with_parents(["p1", "p2", "p3"]),
        ];
        let mut graph = ProgressionGraph::new("start", nodes).unwrap();
        graph.complete_node(&id("start")).unwrap();
        graph.complete_node(&id("p1")).unwrap();
        graph.complete_node(&id("p2")).unwrap();
        assert!(!graph.is_unlocked(&id("join")));
        assert!(matches!(
            graph.complete_node(&id("join")),
            Err(ProgressionError::Locked(_))
        ));

        assert!(!graph.state().is_unlocked(&id("join")));

        let last = graph.complete_node(&id("p3")).unwrap();
        assert_eq!(last.unlocked, ids(&["join"]));
        assert!(graph.is_unlocked(&id("join")));
    }

    #[test]
    fn test_hub_gate_waits_for_its_other_parents() {
        let nodes = vec![
            Node::linear("intro", [0]).with_children(["menu", "side"]),
            Node::hub("menu").with_gate_for("wrap").with_children(["a"]),
            Node::branch("a", "menu", [1]),
            Node::linear("side", [2]),
            Node::gate("wrap", [3]).with_parents(["a", "side"]),
        ];
        let mut graph = ProgressionGraph::new("intro", nodes).unwrap();
        graph.complete_node(&id("intro")).unwrap();

        let converged = graph.complete_node(&id("a")).unwrap();
        assert_eq!(
            converged.effect,
            CompletionEffect::Converged { hub: id("menu"), gate: None }
        );
        assert!(!graph.is_unlocked(&id("wrap")));

        let side = graph.complete_node(&id("side")).unwrap();
        assert_eq!(side.unlocked, ids(&["wrap"]));
    }

    #[test]
    fn test_terminal_completion_is_reported() {
        let mut graph =
            ProgressionGraph::new("only", vec![Node::linear("only", [0, 1])]).unwrap();
        let outcome = graph.complete_node(&id("only")).unwrap();
        assert_eq!(outcome.effect, CompletionEffect::Terminal);
    }

    #[test]
    fn test_hubs_and_unknown_ids_are_rejected() {
        let mut graph = branching_lesson();
        graph.complete_node(&id("intro")).unwrap();
        let before = graph.state().clone();

        assert_eq!(
            graph.complete_node(&id("menu")),
            Err(ProgressionError::HubNotCompletable(id("menu")))
        );
        assert_eq!(
            graph.complete_node(&id("ghost")),
            Err(ProgressionError::UnknownNode(id("ghost")))
        );
        assert_eq!(graph.state(), &before);
    }

    #[test]
    fn test_enter_requires_unlock() {
        let mut graph = branching_lesson();
        assert_eq!(
            graph.enter_node(&id("a")),
            Err(ProgressionError::Locked(id("a")))
        );
        assert_eq!(graph.state().current(), &id("intro"));

        graph.complete_node(&id("intro")).unwrap();
        let entry = graph.enter_node(&id("a")).unwrap();
        assert!(entry.changed);
        assert!(!entry.first_visit, "unlocking already marked it accessed");
        assert_eq!(graph.state().current(), &id("a"));
    }

    #[test]
    fn test_entered_branches_are_remembered() {
        let mut graph = branching_lesson();
        graph.complete_node(&id("intro")).unwrap();
        assert!(!graph.was_entered(&id("a")));

        graph.enter_node(&id("a")).unwrap();
        graph.enter_node(&id("menu")).unwrap();
        assert!(graph.was_entered(&id("a")));
        assert!(!graph.was_entered(&id("b")));
        assert!(!graph.was_entered(&id("menu")));

        let state = graph.state().clone();
        graph.adopt(state);
        assert!(!graph.was_entered(&id("a")));

        graph.enter_node(&id("b")).unwrap();
        graph.reset();
        assert!(!graph.was_entered(&id("b")));
    }

    #[test]
    fn test_max_reachable_follows_unlocks() {
        let mut graph = branching_lesson();
        assert_eq!(graph.max_reachable_position(), 4);

        graph.complete_node(&id("intro")).unwrap();
        assert_eq!(graph.max_reachable_position(), 11);

        graph.complete_node(&id("a")).unwrap();
        graph.complete_node(&id("b")).unwrap();
        assert_eq!(graph.max_reachable_position(), 14);
    }

    #[test]
    fn test_max_reachable_never_below_current() {
        let mut graph = branching_lesson();
        let mut state = ProgressionState::initial(id("intro"));
        state.set_current(id("b"));
        graph.adopt(state);

        assert!(!graph.is_unlocked(&id("b")));
        assert_eq!(graph.max_reachable_position(), 11);
    }

    #[test]
    fn test_unlocks_and_completions_never_shrink() {
        let mut graph = branching_lesson();
        let mut seen_unlocked = graph.state().unlocked().clone();
        let mut seen_completed = graph.state().completed().clone();

        for step in ["intro", "b", "b", "menu", "a", "wrap", "ghost"] {
            let _ = graph.complete_node(&id(step));
            let _ = graph.enter_node(&id(step));
            assert!(graph.state().unlocked().is_superset(&seen_unlocked));
            assert!(graph.state().completed().is_superset(&seen_completed));
            seen_unlocked = graph.state().unlocked().clone();
            seen_completed = graph.state().completed().clone();
        }
        assert!(graph.is_completed(&id("wrap")));
    }

    #[test]
    fn test_node_for_position_includes_hub_anchor() {
        let graph = branching_lesson();
        assert_eq!(graph.node_for_position(3).map(|n| n.id.as_str()), Some("intro"));
        assert_eq!(graph.node_for_position(5).map(|n| n.id.as_str()), Some("menu"));
        assert!(graph.node_for_position(0).is_none());
    }

    #[test]
    fn test_edges_are_mirrored() {
        let graph = branching_lesson();
        let wrap = graph.node(&id("wrap")).unwrap();
        assert_eq!(wrap.parents, ids(&["a", "b"]));
        let a = graph.node(&id("a")).unwrap();
        assert_eq!(a.children, ids(&["wrap"]));
    }

    #[test]
    fn test_definition_errors() {
        let dup = ProgressionGraph::new("x", vec![Node::linear("x", [0]), Node::linear("x", [1])]);
        assert_eq!(dup.unwrap_err(), DefinitionError::DuplicateNode(id("x")));

        let missing = ProgressionGraph::new("y", vec![Node::linear("x", [0])]);
        assert_eq!(missing.unwrap_err(), DefinitionError::MissingRoot(id("y")));

        let dangling = ProgressionGraph::new("x", vec![Node::linear("x", [0]).with_children(["z"])]);
        assert!(matches!(dangling, Err(DefinitionError::UnknownReference { .. })));

        let overlap = ProgressionGraph::new(
            "x",
            vec![Node::linear("x", [0, 1]).with_children(["y"]), Node::linear("y", [1, 2])],
        );
        assert!(matches!(
            overlap,
            Err(DefinitionError::OverlappingPosition { position: 1, .. })
        ));

        let empty = ProgressionGraph::new("x", vec![Node::linear("x", [])]);
        assert_eq!(empty.unwrap_err(), DefinitionError::EmptyContent(id("x")));

        let bad_return = ProgressionGraph::new(
            "x",
            vec![Node::linear("x", [0]).with_children(["b"]), Node::branch("b", "x", [1])],
        );
        assert!(matches!(bad_return, Err(DefinitionError::ReturnTargetNotHub { .. })));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let nodes = vec![
            Node::linear("x", [0]).with_children(["y"]),
            Node::linear("y", [1]).with_children(["z"]),
            Node::linear("z", [2]).with_children(["y"]),
        ];
        match ProgressionGraph::new("x", nodes) {
            Err(DefinitionError::Cycle(path)) => {
                assert!(path.contains(&id("y")));
                assert!(path.contains(&id("z")));
                assert!(!path.contains(&id("x")));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_returns_to_root_only() {
        let mut graph = branching_lesson();
        graph.complete_node(&id("intro")).unwrap();
        graph.enter_node(&id("a")).unwrap();
        let revision = graph.revision();

        graph.reset();
        assert_eq!(graph.state(), &ProgressionState::initial(id("intro")));
        assert!(graph.revision() > revision);
    }
}
