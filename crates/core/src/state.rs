//! Progression state - the single mutable record of a lesson session.
//!
//! The serialized shape is the persistence contract:
//! `{completed: string[], unlocked: string[], current: string, accessed: string[]}`.
//! Sets are ordered so that serialization is deterministic.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::id::NodeId;

/// Completed/unlocked/accessed sets and the cursor node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressionState {
    completed: BTreeSet<NodeId>,
    unlocked: BTreeSet<NodeId>,
    current: NodeId,
    accessed: BTreeSet<NodeId>,
}

/// A state adopted from a persisted blob, with the fields that had to be defaulted.
#[derive(Debug, Clone)]
pub struct RecoveredState {
    /// The adopted state
    pub state: ProgressionState,
    /// Fields that were present but malformed
    pub corrupt_fields: Vec<&'static str>,
}

impl ProgressionState {
    /// Initial lifecycle values: only the root is unlocked and current.
    pub fn initial(root: NodeId) -> Self {
        let mut unlocked = BTreeSet::new();
        unlocked.insert(root.clone());
        Self {
            completed: BTreeSet::new(),
            unlocked,
            current: root,
            accessed: BTreeSet::new(),
        }
    }

    /// Adopt a persisted blob verbatim, defaulting missing or malformed fields one by one.
    ///
    /// Never fails: a blob that is not an object yields the initial state.
    pub fn from_value(value: &Value, root: &NodeId) -> RecoveredState {
        let initial = Self::initial(root.clone());
        let mut corrupt_fields = Vec::new();

        let Some(obj) = value.as_object() else {
            return RecoveredState {
                state: initial,
                corrupt_fields: vec!["completed", "unlocked", "current", "accessed"],
            };
        };

        let mut read_set = |field: &'static str, default: BTreeSet<NodeId>| -> BTreeSet<NodeId> {
            match obj.get(field) {
                None => default,
                Some(Value::Array(items)) => {
                    let ids: BTreeSet<NodeId> = items
                        .iter()
                        .filter_map(|item| item.as_str().map(NodeId::from))
                        .collect();
                    if items.iter().any(|item| !item.is_string()) {
                        corrupt_fields.push(field);
                    }
                    ids
                }
                Some(_) => {
                    corrupt_fields.push(field);
                    default
                }
            }
        };

        let completed = read_set("completed", initial.completed.clone());
        let unlocked = read_set("unlocked", initial.unlocked.clone());
        let accessed = read_set("accessed", initial.accessed.clone());

        let current = match obj.get("current") {
            None => initial.current.clone(),
            Some(Value::String(s)) => NodeId::from(s.as_str()),
            Some(_) => {
                corrupt_fields.push("current");
                initial.current.clone()
            }
        };

        RecoveredState {
            state: Self {
                completed,
                unlocked,
                current,
                accessed,
            },
            corrupt_fields,
        }
    }

    /// Parse a persisted JSON string. Unparseable text yields the initial state.
    pub fn from_json(json: &str, root: &NodeId) -> RecoveredState {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Self::from_value(&value, root),
            Err(_) => RecoveredState {
                state: Self::initial(root.clone()),
                corrupt_fields: vec!["completed", "unlocked", "current", "accessed"],
            },
        }
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Completed nodes.
    pub fn completed(&self) -> &BTreeSet<NodeId> {
        &self.completed
    }

    /// Unlocked nodes.
    pub fn unlocked(&self) -> &BTreeSet<NodeId> {
        &self.unlocked
    }

    /// Nodes visited at least once.
    pub fn accessed(&self) -> &BTreeSet<NodeId> {
        &self.accessed
    }

    /// Node the cursor belongs to.
    pub fn current(&self) -> &NodeId {
        &self.current
    }

    /// Is `id` completed?
    pub fn is_completed(&self, id: &NodeId) -> bool {
        self.completed.contains(id)
    }

    /// Is `id` explicitly unlocked?
    pub fn is_unlocked(&self, id: &NodeId) -> bool {
        self.unlocked.contains(id)
    }

    /// Has `id` been visited?
    pub fn is_accessed(&self, id: &NodeId) -> bool {
        self.accessed.contains(id)
    }

    /// Record a completion. Returns true if it was new.
    pub fn mark_completed(&mut self, id: NodeId) -> bool {
        self.completed.insert(id)
    }

    /// Record an unlock, which also counts as access. Returns true if the unlock was new.
    pub fn mark_unlocked(&mut self, id: NodeId) -> bool {
        self.accessed.insert(id.clone());
        self.unlocked.insert(id)
    }

    /// Record a visit. Returns true if it was new.
    pub fn mark_accessed(&mut self, id: NodeId) -> bool {
        self.accessed.insert(id)
    }

    /// Move the cursor.
    pub fn set_current(&mut self, id: NodeId) {
        self.current = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> NodeId {
        NodeId::from("intro")
    }

    #[test]
    fn test_initial_state() {
        let state = ProgressionState::initial(root());
        assert!(state.is_unlocked(&root()));
        assert_eq!(state.current(), &root());
        assert!(state.completed().is_empty());
        assert!(state.accessed().is_empty());
    }

    #[test]
    fn test_serialized_field_order_matches_contract() {
        let state = ProgressionState::initial(root());
        assert_eq!(
            state.to_json().unwrap(),
            r#"{"completed":[],"unlocked":["intro"],"current":"intro","accessed":[]}"#
        );
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let mut state = ProgressionState::initial(root());
        state.mark_completed("intro".into());
        state.mark_unlocked("menu".into());
        state.mark_unlocked("b".into());
        state.mark_unlocked("a".into());
        state.set_current("a".into());

        let first = state.to_json().unwrap();
        let recovered = ProgressionState::from_json(&first, &root());
        assert!(recovered.corrupt_fields.is_empty());
        assert_eq!(recovered.state, state);
        assert_eq!(recovered.state.to_json().unwrap(), first);
    }

    #[test]
    fn test_missing_fields_default_to_initial_values() {
        let recovered = ProgressionState::from_value(&json!({"completed": ["intro"]}), &root());
        assert!(recovered.corrupt_fields.is_empty());
        assert!(recovered.state.is_completed(&root()));
        assert!(recovered.state.is_unlocked(&root()));
        assert_eq!(recovered.state.current(), &root());
    }

    #[test]
    fn test_malformed_fields_are_defaulted_one_by_one() {
        let recovered = ProgressionState::from_value(
            &json!({"completed": "oops", "unlocked": ["intro", "menu"], "current": 7, "accessed": [1, "menu"]}),
            &root(),
        );
        assert_eq!(recovered.corrupt_fields, vec!["completed", "accessed", "current"]);
        assert!(recovered.state.completed().is_empty());
        assert!(recovered.state.is_unlocked(&NodeId::from("menu")));
        assert_eq!(recovered.state.current(), &root());
        assert!(recovered.state.is_accessed(&NodeId::from("menu")));
    }

    #[test]
    fn test_garbage_text_yields_initial_state() {
        let recovered = ProgressionState::from_json("not json", &root());
        assert_eq!(recovered.state, ProgressionState::initial(root()));
        assert_eq!(recovered.corrupt_fields.len(), 4);
    }

    #[test]
    fn test_unlock_marks_accessed() {
        let mut state = ProgressionState::initial(root());
        assert!(state.mark_unlocked("menu".into()));
        assert!(!state.mark_unlocked("menu".into()));
        assert!(state.is_accessed(&NodeId::from("menu")));
    }
}
