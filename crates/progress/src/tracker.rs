//! Progress summaries.

use chrono::Utc;
use lessonpath_core::{NodeId, Position, Time};
use serde::Serialize;

use crate::ProgressionGraph;

/// A snapshot of lesson progress at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    /// When the summary was taken
    pub timestamp: Time,

    /// Completable nodes (hubs excluded)
    pub total: usize,

    /// Completed nodes
    pub completed: usize,

    /// Enterable nodes, hubs included
    pub unlocked: usize,

    /// Completed share of `total`, 0-100
    pub percentage: f32,

    /// Node the cursor belongs to
    pub current: NodeId,

    /// Furthest enterable position
    pub max_reachable: Position,

    /// Every completable node is done
    pub finished: bool,
}

impl ProgressSummary {
    /// Summarize a graph's current state.
    pub fn from_graph(graph: &ProgressionGraph) -> Self {
        let completable: Vec<_> = graph.nodes().iter().filter(|n| !n.is_hub()).collect();
        let total = completable.len();
        let completed = completable
            .iter()
            .filter(|n| graph.is_completed(&n.id))
            .count();
        let unlocked = graph
            .nodes()
            .iter()
            .filter(|n| graph.is_unlocked(&n.id))
            .count();

        let percentage = if total > 0 {
            (completed as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        Self {
            timestamp: Utc::now(),
            total,
            completed,
            unlocked,
            percentage,
            current: graph.state().current().clone(),
            max_reachable: graph.max_reachable_position(),
            finished: total > 0 && completed == total,
        }
    }
}

impl ProgressionGraph {
    /// Summarize progress.
    pub fn progress_summary(&self) -> ProgressSummary {
        ProgressSummary::from_graph(self)
    }
}
