//! Lesson Sessions
//!
//! Wires the progression graph, the navigation guard, the transition
//! sequencer and persistence into one driver, and broadcasts notifications.

#![warn(missing_docs)]

pub mod error;
pub mod session;

pub use error::{Result, SessionError};
pub use session::{LessonSession, CHANNEL_CAPACITY};
