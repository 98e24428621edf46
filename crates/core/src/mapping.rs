//! Content/position mapping - the read-only oracle between slide keys and positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::Position;

/// Bidirectional lookup between opaque content keys and linear positions.
pub trait PositionMap {
    /// Position of a content key.
    fn position_of(&self, key: &str) -> Option<Position>;

    /// Content key at a position.
    fn key_at(&self, position: Position) -> Option<&str>;

    /// Total number of positions.
    fn len(&self) -> usize;

    /// Whether there are no positions at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered list of slide keys; a slide's position is its index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SlideDeck {
    keys: Vec<String>,
    index: HashMap<String, Position>,
}

impl SlideDeck {
    /// Build a deck. A repeated key keeps its first position.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(keys.len());
        for (position, key) in keys.iter().enumerate() {
            index.entry(key.clone()).or_insert(position);
        }
        Self { keys, index }
    }

    /// Keys in position order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl From<Vec<String>> for SlideDeck {
    fn from(keys: Vec<String>) -> Self {
        Self::new(keys)
    }
}

impl From<SlideDeck> for Vec<String> {
    fn from(deck: SlideDeck) -> Self {
        deck.keys
    }
}

impl PositionMap for SlideDeck {
    fn position_of(&self, key: &str) -> Option<Position> {
        self.index.get(key).copied()
    }

    fn key_at(&self, position: Position) -> Option<&str> {
        self.keys.get(position).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}
