//! Lesson definition files.
//!
//! A definition names slides by key; keys are resolved to positions through a
//! [`PositionMap`] when the graph is built.

use serde::{Deserialize, Serialize};

use lessonpath_core::{DefinitionError, LessonConfig, Node, NodeId, NodeKind, PositionMap, SlideDeck};

use crate::ProgressionGraph;

/// Kind as written in a definition file: hub anchors are slide keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKindSpec {
    /// Plain stretch
    Linear,
    /// Junction
    Hub {
        /// Gate unlocked once every branch completes
        #[serde(default)]
        gate_for: Option<NodeId>,
        /// Slide key of the choice menu
        #[serde(default)]
        anchor: Option<String>,
    },
    /// Hub child
    Branch {
        /// Hub to return to
        return_to: NodeId,
    },
    /// Convergence point
    Gate,
}

/// One node as written in a definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique identifier
    pub id: NodeId,

    /// Human label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Kind and kind-specific fields
    #[serde(flatten)]
    pub kind: NodeKindSpec,

    /// Slide keys owned by this node
    #[serde(default)]
    pub content: Vec<String>,

    /// Parent ids
    #[serde(default)]
    pub parents: Vec<NodeId>,

    /// Child ids
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// A whole lesson: slide order, graph and tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonDefinition {
    /// Slide keys in position order
    pub slides: SlideDeck,

    /// Root node
    pub root: NodeId,

    /// Graph nodes
    pub nodes: Vec<NodeSpec>,

    /// Tunables
    #[serde(default)]
    pub config: LessonConfig,
}

impl LessonDefinition {
    /// Parse a definition from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Resolve slide keys through the definition's own deck and build the graph.
    pub fn build(&self) -> Result<ProgressionGraph, DefinitionError> {
        self.build_with(&self.slides)
    }

    /// Resolve slide keys through an external mapping and build the graph.
    pub fn build_with(&self, map: &dyn PositionMap) -> Result<ProgressionGraph, DefinitionError> {
        let nodes = self
            .nodes
            .iter()
            .map(|spec| spec.resolve(map))
            .collect::<Result<Vec<_>, _>>()?;
        ProgressionGraph::new(self.root.clone(), nodes)
    }
}

impl NodeSpec {
    /// Turn slide keys into positions.
    pub fn resolve(&self, map: &dyn PositionMap) -> Result<Node, DefinitionError> {
        let lookup = |key: &str| {
            map.position_of(key).ok_or_else(|| DefinitionError::UnknownSlide {
                node: self.id.clone(),
                key: key.to_string(),
            })
        };

        let kind = match &self.kind {
            NodeKindSpec::Linear => NodeKind::Linear,
            NodeKindSpec::Hub { gate_for, anchor } => NodeKind::Hub {
                gate_for: gate_for.clone(),
                anchor: anchor.as_deref().map(lookup).transpose()?,
            },
            NodeKindSpec::Branch { return_to } => NodeKind::Branch {
                return_to: return_to.clone(),
            },
            NodeKindSpec::Gate => NodeKind::Gate,
        };

        let mut content = self
            .content
            .iter()
            .map(|key| lookup(key))
            .collect::<Result<Vec<_>, _>>()?;
        content.sort_unstable();
        content.dedup();

        Ok(Node {
            id: self.id.clone(),
            title: self.title.clone(),
            kind,
            content,
            parents: self.parents.clone(),
            children: self.children.clone(),
        })
    }
}
