//! lessonpath core data models.
//!
//! This crate defines the node, state, notification and configuration types
//! shared by the progression graph and the navigation guard.

#![warn(missing_docs)]

// Core identities
mod id;

// Graph and state
mod node;
mod state;
mod mapping;

// Signals, failures, tunables
mod event;
mod error;
mod config;

// Re-exports
pub use id::*;

pub use node::{Node, NodeKind};
pub use state::{ProgressionState, RecoveredState};
pub use mapping::{PositionMap, SlideDeck};
pub use event::{BlockReason, Direction, Notification, NotificationKind};
pub use error::{DefinitionError, ProgressionError};
pub use config::{GuardConfig, LessonConfig, ReentryPolicy, SequencerConfig};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
