//! Navigation Enforcement
//!
//! Intercepts every channel that can move the visible position and keeps the
//! surface within what the progression graph allows.

#![warn(missing_docs)]

pub mod controller;
pub mod guard;
pub mod input;
pub mod viewport;

pub use controller::NavigationController;
pub use guard::{NavigationGuard, Verdict};
pub use input::{InputEvent, Key, KeyIntent};
pub use lessonpath_core::{PositionMap, SlideDeck};
pub use viewport::{HeadlessViewport, Viewport};
