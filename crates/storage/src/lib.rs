//! Storage abstraction and implementations for lessonpath.
//!
//! This crate provides the key-value persistence boundary the progression
//! blob is saved through, a JSON-file and an in-memory backend, and a typed
//! store for the blob itself.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;
pub mod progress_store;

pub use trait_::{KeyValueStore, StorageError, Result};
pub use json_storage::JsonFileStore;
pub use memory::MemoryStore;
pub use progress_store::{ProgressStore, DEFAULT_KEY};
