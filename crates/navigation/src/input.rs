//! Input channels that can move the visible position.

use std::str::FromStr;

use lessonpath_core::Position;
use serde::{Deserialize, Serialize};

/// Keyboard commands, named after DOM key values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// `ArrowRight`
    ArrowRight,
    /// `ArrowDown`
    ArrowDown,
    /// `PageDown`
    PageDown,
    /// Space bar
    Space,
    /// `End`
    End,
    /// `ArrowLeft`
    ArrowLeft,
    /// `ArrowUp`
    ArrowUp,
    /// `PageUp`
    PageUp,
    /// `Home`
    Home,
    /// Anything else; passes through untouched
    Other(String),
}

/// What a key asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIntent {
    /// One position forward
    Advance,
    /// One position back
    Retreat,
    /// The first position
    First,
    /// The furthest reachable position
    Last,
}

impl Key {
    /// Parse a DOM key value. Unknown names become [`Key::Other`].
    pub fn parse(name: &str) -> Self {
        match name {
            "ArrowRight" => Key::ArrowRight,
            "ArrowDown" => Key::ArrowDown,
            "PageDown" => Key::PageDown,
            " " | "Space" | "Spacebar" => Key::Space,
            "End" => Key::End,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowUp" => Key::ArrowUp,
            "PageUp" => Key::PageUp,
            "Home" => Key::Home,
            other => Key::Other(other.to_string()),
        }
    }

    /// The navigation this key requests, if any.
    pub fn intent(&self) -> Option<KeyIntent> {
        match self {
            Key::ArrowRight | Key::ArrowDown | Key::PageDown | Key::Space => {
                Some(KeyIntent::Advance)
            }
            Key::ArrowLeft | Key::ArrowUp | Key::PageUp => Some(KeyIntent::Retreat),
            Key::Home => Some(KeyIntent::First),
            Key::End => Some(KeyIntent::Last),
            Key::Other(_) => None,
        }
    }
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Key::parse(s))
    }
}

/// One navigation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Touch/pointer drag. Negative displacement (swipe left/up) moves forward.
    Drag {
        /// Displacement in pixels
        delta: f64,
    },
    /// Mouse wheel. Positive delta moves forward.
    Wheel {
        /// Wheel delta
        delta: f64,
    },
    /// Keyboard command
    Key(Key),
    /// Programmatic move; checked like any other input
    SetPosition(Position),
}
