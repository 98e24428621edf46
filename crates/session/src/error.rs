//! Session errors.

use lessonpath_core::ProgressionError;
use lessonpath_storage::StorageError;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by [`crate::LessonSession`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Rejected by the progression rules; nothing changed
    #[error(transparent)]
    Progression(#[from] ProgressionError),

    /// The state changed but could not be persisted
    #[error("failed to persist progress: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether this was a rejection because a transition is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionError::Progression(ProgressionError::Busy))
    }
}
