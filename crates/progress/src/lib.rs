//! Progression Engine
//!
//! The node graph with its unlock/completion rules, lesson definitions,
//! the transition sequencer, and progress summaries.

#![warn(missing_docs)]

pub mod definition;
pub mod graph;
pub mod outcome;
pub mod sequencer;
pub mod tracker;

#[cfg(any(test, feature = "fixtures"))]
pub mod testing;

pub use definition::{LessonDefinition, NodeKindSpec, NodeSpec};
pub use graph::ProgressionGraph;
pub use outcome::{CompletionEffect, CompletionOutcome, EntryOutcome, Fanout};
pub use sequencer::{Cue, SequencerPhase, TransitionSequencer};
pub use tracker::ProgressSummary;
