//! Typed persistence of the progression blob on top of a [`KeyValueStore`].

use lessonpath_core::{NodeId, ProgressionError, ProgressionState};
use tracing::{debug, warn};

use super::{KeyValueStore, Result};

/// Key the blob is stored under unless overridden.
pub const DEFAULT_KEY: &str = "progress";

/// Loads and saves [`ProgressionState`] through caller-supplied get/set primitives.
pub struct ProgressStore<K: KeyValueStore> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> ProgressStore<K> {
    /// Wrap a backend using [`DEFAULT_KEY`].
    pub fn new(backend: K) -> Self {
        Self::with_key(backend, DEFAULT_KEY)
    }

    /// Wrap a backend using a custom key.
    pub fn with_key(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// The key in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying backend, for storing neighbouring keys.
    pub fn backend_mut(&mut self) -> &mut K {
        &mut self.backend
    }

    /// Load the persisted state, adopting it verbatim.
    ///
    /// Never fails: read errors and corrupt blobs degrade to (partly) initial values.
    pub async fn load(&self, root: &NodeId) -> ProgressionState {
        let raw = match self.backend.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted progress under '{}', starting fresh", self.key);
                return ProgressionState::initial(root.clone());
            }
            Err(e) => {
                warn!("Failed to read persisted progress: {}", e);
                return ProgressionState::initial(root.clone());
            }
        };

        let recovered = ProgressionState::from_json(&raw, root);
        if !recovered.corrupt_fields.is_empty() {
            let err = ProgressionError::CorruptPersistedState(recovered.corrupt_fields);
            warn!(error = %err, "Recovered persisted progress with defaults");
        }
        recovered.state
    }

    /// Persist the state.
    pub async fn save(&mut self, state: &ProgressionState) -> Result<()> {
        let json = state.to_json()?;
        self.backend.set(&self.key, &json).await
    }

    /// Drop the persisted state (new-session boundary).
    pub async fn clear(&mut self) -> Result<()> {
        self.backend.remove(&self.key).await
    }
}
